pub mod config;
pub mod dataset;
pub mod error;
pub mod forecast;
pub mod model;
pub mod pipeline;
pub mod recommend;
pub mod risk;
pub mod scenario;
pub mod synthetic;

pub use config::EngineConfig;
pub use dataset::{DataQuality, EnrichedDataset};
pub use error::{Result, SimulationError, Stage};
pub use forecast::{Forecast, TrajectoryForecaster};
pub use model::{Granularity, MetricSpec, SimulationContext, SimulationRequest, Timeframe, TrajectoryPoint};
pub use pipeline::{SimulationEngine, SimulationResult};
pub use recommend::{PivotRecommendation, RecommendationSynthesizer};
pub use risk::{RiskAlert, RiskDetector, RiskThresholds, RiskType, Severity};
pub use scenario::{ScenarioConfig, ScenarioGenerator, ScenarioOptions, ScenarioResult, ScenarioType};

/// Convenience entry point using the configuration found on disk or in the environment.
pub fn simulate(context: &SimulationContext) -> Result<SimulationResult> {
    let (config, _) = EngineConfig::load(None)?;
    SimulationEngine::new(config).run(context)
}

pub(crate) fn stable_hash64(value: &str) -> u64 {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

pub fn format_number(value: f64) -> String {
    let rounded = value.round().max(0.0) as i64;
    let mut chars: Vec<char> = rounded.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}
