use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Pipeline stage a computation failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Forecast,
    Scenario,
    Pipeline,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Forecast => "forecast",
            Stage::Scenario => "scenario",
            Stage::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SimulationError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient data for metric `{metric}`: {reason}")]
    InsufficientData { metric: String, reason: String },

    #[error("{stage} computation failed for `{subject}`: {detail}")]
    Computation {
        stage: Stage,
        subject: String,
        detail: String,
    },

    #[error("simulation did not finish within {0:?}")]
    Timeout(Duration),

    #[error("config error: {0}")]
    Config(String),
}

impl SimulationError {
    pub fn validation(message: impl Into<String>) -> Self {
        SimulationError::Validation(message.into())
    }

    pub fn computation(stage: Stage, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        SimulationError::Computation {
            stage,
            subject: subject.into(),
            detail: detail.into(),
        }
    }

    /// Timeouts are the only failure a caller may retry unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SimulationError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
