use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::dataset::DataQuality;
use crate::error::{Result, SimulationError, Stage};
use crate::forecast::{ForecastMethod, TrajectoryForecaster};
use crate::model::{SimulationContext, TrajectoryPoint};
use crate::recommend::{PivotRecommendation, RecommendationSynthesizer};
use crate::risk::{RiskAlert, RiskDetector};
use crate::scenario::{ScenarioGenerator, ScenarioResult, ScenarioType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectories {
    pub baseline: Vec<TrajectoryPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFailure {
    pub index: usize,
    pub scenario_type: ScenarioType,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRisks {
    pub scenario: String,
    pub risks: Vec<RiskAlert>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub processing_time_ms: u64,
    pub forecast_model: String,
    pub forecast_methods: BTreeMap<String, ForecastMethod>,
    pub data_quality: DataQuality,
}

/// Everything one run produces, handed to the persistence and reporting layers as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub simulation_id: String,
    pub campaign_id: String,
    pub trajectories: Trajectories,
    pub scenarios: Vec<ScenarioResult>,
    pub scenario_failures: Vec<ScenarioFailure>,
    pub risks: Vec<RiskAlert>,
    pub scenario_risks: Vec<ScenarioRisks>,
    pub recommendations: Vec<PivotRecommendation>,
    pub model_metadata: ModelMetadata,
}

#[derive(Debug, Clone)]
pub struct SimulationEngine {
    config: EngineConfig,
    forecaster: TrajectoryForecaster,
    generator: ScenarioGenerator,
    detector: RiskDetector,
    synthesizer: RecommendationSynthesizer,
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SimulationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            forecaster: TrajectoryForecaster::new(config.forecast.clone()),
            generator: ScenarioGenerator::new(config.scenarios.clone()),
            detector: RiskDetector::new(config.risk.clone()),
            synthesizer: RecommendationSynthesizer::new(config.synthesis.clone()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn forecaster(&self) -> &TrajectoryForecaster {
        &self.forecaster
    }

    pub fn generator(&self) -> &ScenarioGenerator {
        &self.generator
    }

    pub fn detector(&self) -> &RiskDetector {
        &self.detector
    }

    pub fn synthesizer(&self) -> &RecommendationSynthesizer {
        &self.synthesizer
    }

    /// Runs every stage. Forecast failures abort the run; a failing scenario is
    /// reported in `scenario_failures` unless no scenario succeeded at all.
    pub fn run(&self, context: &SimulationContext) -> Result<SimulationResult> {
        let started = Instant::now();
        context.validate()?;

        let forecast = self.forecaster.forecast(context)?;
        let request = &context.request;

        let mut scenarios = Vec::new();
        let mut failures = Vec::new();
        let mut first_error = None;
        let outcomes =
            self.generator
                .generate_each(&forecast.points, &request.scenarios, context, &request.options);
        for (index, (config, outcome)) in request.scenarios.iter().zip(outcomes).enumerate() {
            match outcome {
                Ok(scenario) => scenarios.push(scenario),
                Err(err) => {
                    warn!(index, scenario = %config.name(), error = %err, "scenario isolated after failure");
                    failures.push(ScenarioFailure {
                        index,
                        scenario_type: config.scenario_type,
                        name: config.name(),
                        error: err.to_string(),
                    });
                    first_error.get_or_insert(err);
                }
            }
        }
        if scenarios.is_empty() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        let risks = self.detector.detect_risks(&forecast.points, context, None);
        let scenario_risks: Vec<ScenarioRisks> = if self.config.runtime.risk_per_scenario {
            scenarios
                .par_iter()
                .map(|scenario| ScenarioRisks {
                    scenario: scenario.name.clone(),
                    risks: self.detector.detect_risks(&scenario.trajectory, context, None),
                })
                .collect()
        } else {
            Vec::new()
        };

        let recommendations =
            self.synthesizer
                .synthesize_against(&risks, &scenarios, Some(forecast.points.as_slice()), context);
        let processing_time_ms = started.elapsed().as_millis() as u64;

        info!(
            simulation_id = %context.simulation_id,
            campaign_id = %request.campaign_id,
            scenarios = scenarios.len(),
            failures = failures.len(),
            risks = risks.len(),
            recommendations = recommendations.len(),
            processing_time_ms,
            "simulation complete"
        );

        Ok(SimulationResult {
            simulation_id: context.simulation_id.clone(),
            campaign_id: request.campaign_id.clone(),
            trajectories: Trajectories {
                baseline: forecast.points,
            },
            scenarios,
            scenario_failures: failures,
            risks,
            scenario_risks,
            recommendations,
            model_metadata: ModelMetadata {
                processing_time_ms,
                forecast_model: forecast.model_id,
                forecast_methods: forecast.methods,
                data_quality: context.dataset.data_quality.clone(),
            },
        })
    }

    /// Runs on the blocking pool and gives up after `timeout`. A timeout is retryable.
    pub async fn run_with_timeout(
        &self,
        context: SimulationContext,
        timeout: Duration,
    ) -> Result<SimulationResult> {
        let engine = self.clone();
        let handle = tokio::task::spawn_blocking(move || engine.run(&context));
        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => Err(SimulationError::computation(
                Stage::Pipeline,
                "simulation",
                format!("worker task failed: {}", err),
            )),
            Err(_) => {
                warn!(?timeout, "simulation timed out");
                Err(SimulationError::Timeout(timeout))
            }
        }
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.config.runtime.timeout_ms)
    }
}
