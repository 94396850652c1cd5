use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Result, SimulationError};
use crate::risk::{RiskThresholds, Severity};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Share of the industry benchmark blended into trend projections.
    pub benchmark_weight: f64,
    pub confidence_decay_per_day: f64,
    pub min_confidence: f64,
    /// Refuse benchmark-only forecasts for metrics without history.
    pub require_history: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            benchmark_weight: 0.2,
            confidence_decay_per_day: 0.01,
            min_confidence: 0.05,
            require_history: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSettings {
    pub spread: f64,
    pub optimistic_percentile: f64,
    pub realistic_percentile: f64,
    pub pessimistic_percentile: f64,
    pub realistic_weight: f64,
    pub tail_weight: f64,
    pub custom_weight: f64,
    pub seasonal_weight: f64,
    pub competition_weight: f64,
    pub adjustment_confidence_penalty: f64,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            spread: 0.15,
            optimistic_percentile: 75.0,
            realistic_percentile: 50.0,
            pessimistic_percentile: 25.0,
            realistic_weight: 0.6,
            tail_weight: 0.2,
            custom_weight: 0.2,
            seasonal_weight: 0.5,
            competition_weight: 0.1,
            adjustment_confidence_penalty: 0.95,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub min_severity: Severity,
    pub opportunity_threshold: f64,
    pub downside_threshold: f64,
    pub min_scenario_probability: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            min_severity: Severity::Medium,
            opportunity_threshold: 0.1,
            downside_threshold: 0.15,
            min_scenario_probability: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub timeout_ms: u64,
    pub risk_per_scenario: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            risk_per_scenario: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub forecast: ForecastConfig,
    pub scenarios: ScenarioSettings,
    pub risk: RiskThresholds,
    pub synthesis: SynthesisConfig,
    pub runtime: RuntimeConfig,
}

impl EngineConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>)> {
        let config_path = path.or_else(default_config_path);
        let mut config = if let Some(path) = config_path.as_ref() {
            if path.exists() {
                let contents = std::fs::read_to_string(path).map_err(|err| {
                    SimulationError::Config(format!("failed to read config: {}", err))
                })?;
                toml::from_str(&contents).map_err(|err| {
                    SimulationError::Config(format!("failed to parse config: {}", err))
                })?
            } else {
                EngineConfig::default()
            }
        } else {
            EngineConfig::default()
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                SimulationError::Config(format!("failed to create config dir: {}", err))
            })?;
        }
        let payload = toml::to_string_pretty(self).map_err(|err| {
            SimulationError::Config(format!("failed to serialize config: {}", err))
        })?;
        std::fs::write(path, payload)
            .map_err(|err| SimulationError::Config(format!("failed to write config: {}", err)))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env_f64("SIM_PERFORMANCE_DIP_THRESHOLD") {
            self.risk.performance_dip_threshold = value;
        }
        if let Some(value) = env_f64("SIM_CONFIDENCE_THRESHOLD") {
            self.risk.confidence_threshold = value;
        }
        if let Some(value) = env_f64("SIM_SCENARIO_SPREAD") {
            self.scenarios.spread = value;
        }
        if let Some(value) = env_f64("SIM_BENCHMARK_WEIGHT") {
            self.forecast.benchmark_weight = value.clamp(0.0, 1.0);
        }
        if let Ok(timeout) = env::var("SIM_TIMEOUT_MS") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.runtime.timeout_ms = value;
            }
        }
    }
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

fn default_config_path() -> Option<PathBuf> {
    env::var("SIM_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/simulation.toml")))
}
