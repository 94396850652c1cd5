pub mod generator;
pub mod market;
pub mod percentile;

use serde::{Deserialize, Serialize};

use crate::model::{Timeframe, TrajectoryPoint};

pub use generator::ScenarioGenerator;
pub use market::MarketBlend;
pub use percentile::{normal_quantile, percentile_multiplier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    Optimistic,
    Realistic,
    Pessimistic,
    Custom,
}

impl ScenarioType {
    pub fn label(self) -> &'static str {
        match self {
            ScenarioType::Optimistic => "optimistic",
            ScenarioType::Realistic => "realistic",
            ScenarioType::Pessimistic => "pessimistic",
            ScenarioType::Custom => "custom",
        }
    }
}

/// Multiplicative perturbation applied to every metric of the points inside `timeframe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub factor: String,
    pub multiplier: f64,
    pub timeframe: Timeframe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(rename = "type")]
    pub scenario_type: ScenarioType,
    /// Only read for custom scenarios; named scenarios use the configured percentiles.
    #[serde(default)]
    pub percentile: Option<f64>,
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
}

impl ScenarioConfig {
    pub fn named(scenario_type: ScenarioType) -> Self {
        Self {
            scenario_type,
            percentile: None,
            adjustments: Vec::new(),
        }
    }

    pub fn custom_percentile(percentile: f64) -> Self {
        Self {
            scenario_type: ScenarioType::Custom,
            percentile: Some(percentile),
            adjustments: Vec::new(),
        }
    }

    pub fn custom_adjustments(adjustments: Vec<Adjustment>) -> Self {
        Self {
            scenario_type: ScenarioType::Custom,
            percentile: None,
            adjustments,
        }
    }

    pub fn name(&self) -> String {
        match (self.scenario_type, self.percentile) {
            (ScenarioType::Custom, Some(percentile)) => format!("custom_p{}", percentile.round() as i64),
            (scenario_type, _) => scenario_type.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOptions {
    pub include_market_factors: bool,
    pub include_seasonality: bool,
    pub include_competition: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    #[serde(rename = "type")]
    pub scenario_type: ScenarioType,
    pub name: String,
    pub probability: f64,
    pub confidence: f64,
    pub trajectory: Vec<TrajectoryPoint>,
    pub key_factors: Vec<String>,
}

impl ScenarioResult {
    pub fn metric_mean(&self, metric: &str) -> Option<f64> {
        let values: Vec<f64> = self
            .trajectory
            .iter()
            .filter_map(|point| point.metric(metric))
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}
