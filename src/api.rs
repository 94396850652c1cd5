use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use campaign_sim::{RiskThresholds, SimulationContext, SimulationError, SimulationResult};

#[derive(Debug, Deserialize)]
pub struct ApiSimulationRequest {
    #[serde(flatten)]
    pub context: SimulationContext,
    /// Replaces the configured risk thresholds for this request only.
    #[serde(default)]
    pub thresholds: Option<RiskThresholds>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ApiSimulationResponse {
    pub request_id: String,
    #[serde(flatten)]
    pub result: SimulationResult,
    pub warnings: Vec<String>,
}

impl ApiSimulationResponse {
    pub fn from_result(result: SimulationResult) -> Self {
        let warnings = result
            .scenario_failures
            .iter()
            .map(|failure| format!("scenario {} failed: {}", failure.name, failure.error))
            .collect();
        Self {
            request_id: result.simulation_id.clone(),
            result,
            warnings,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub retryable: bool,
}

pub fn error_response(err: &SimulationError) -> (StatusCode, ApiError) {
    let status = match err {
        SimulationError::Validation(_) => StatusCode::BAD_REQUEST,
        SimulationError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SimulationError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        SimulationError::Computation { .. } | SimulationError::Config(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        ApiError {
            error: err.to_string(),
            retryable: err.is_retryable(),
        },
    )
}
