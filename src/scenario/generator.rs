use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::ScenarioSettings;
use crate::error::{Result, SimulationError, Stage};
use crate::model::{SimulationContext, TrajectoryPoint};
use crate::scenario::market::MarketBlend;
use crate::scenario::percentile::{horizon_factor, normal_quantile, percentile_multiplier};
use crate::scenario::{ScenarioConfig, ScenarioOptions, ScenarioResult, ScenarioType};

const MIN_SCENARIO_CONFIDENCE: f64 = 0.01;

/// Scenario before its probability is normalized against the rest of the set.
struct ScenarioDraft {
    result: ScenarioResult,
    weight: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioGenerator {
    settings: ScenarioSettings,
}

impl ScenarioGenerator {
    pub fn new(settings: ScenarioSettings) -> Self {
        Self { settings }
    }

    /// Fails on the first scenario that cannot be generated.
    pub fn generate_scenarios(
        &self,
        baseline: &[TrajectoryPoint],
        configs: &[ScenarioConfig],
        context: &SimulationContext,
        options: &ScenarioOptions,
    ) -> Result<Vec<ScenarioResult>> {
        self.generate_each(baseline, configs, context, options)
            .into_iter()
            .collect()
    }

    /// One outcome per config, in input order. Probabilities are normalized over the successes.
    pub fn generate_each(
        &self,
        baseline: &[TrajectoryPoint],
        configs: &[ScenarioConfig],
        context: &SimulationContext,
        options: &ScenarioOptions,
    ) -> Vec<Result<ScenarioResult>> {
        let market = MarketBlend::from_context(context, options, &self.settings);

        let drafts: Vec<Result<ScenarioDraft>> = configs
            .par_iter()
            .map(|config| self.build(baseline, config, context, market.as_ref()))
            .collect();

        let total_weight: f64 = drafts
            .iter()
            .filter_map(|draft| draft.as_ref().ok())
            .map(|draft| draft.weight)
            .sum();

        let outcomes: Vec<Result<ScenarioResult>> = drafts
            .into_iter()
            .map(|draft| {
                draft.map(|draft| {
                    let mut result = draft.result;
                    result.probability = if total_weight > 0.0 {
                        draft.weight / total_weight
                    } else {
                        0.0
                    };
                    result
                })
            })
            .collect();

        for (config, outcome) in configs.iter().zip(outcomes.iter()) {
            if let Err(err) = outcome {
                warn!(scenario = %config.name(), error = %err, "scenario generation failed");
            }
        }
        info!(
            simulation_id = %context.simulation_id,
            requested = configs.len(),
            generated = outcomes.iter().filter(|outcome| outcome.is_ok()).count(),
            "scenarios generated"
        );

        outcomes
    }

    fn build(
        &self,
        baseline: &[TrajectoryPoint],
        config: &ScenarioConfig,
        context: &SimulationContext,
        market: Option<&MarketBlend<'_>>,
    ) -> Result<ScenarioDraft> {
        let name = config.name();
        validate_config(config, &name)?;

        let percentile = self.percentile_for(config);
        let z = match percentile {
            Some(percentile) => Some(normal_quantile(percentile).ok_or_else(|| {
                SimulationError::computation(
                    Stage::Scenario,
                    &name,
                    format!("percentile {} has no finite quantile", percentile),
                )
            })?),
            None => None,
        };
        let spread = self.settings.spread * market.map(MarketBlend::spread_scale).unwrap_or(1.0);

        let len = baseline.len();
        let mut trajectory = Vec::with_capacity(len);
        for (index, point) in baseline.iter().enumerate() {
            let progress = if len > 1 {
                index as f64 / (len - 1) as f64
            } else {
                1.0
            };

            let mut factor: f64 = 1.0;
            let mut touched = false;
            if let Some(market) = market {
                factor *= market.factor(point.date, progress);
                touched = true;
            }
            if let Some(z) = z.filter(|z| *z != 0.0) {
                factor *= percentile_multiplier(z, spread, horizon_factor(index, len));
                touched = true;
            }
            let mut adjusted = false;
            for adjustment in &config.adjustments {
                if adjustment.timeframe.contains(point.date) {
                    factor *= adjustment.multiplier;
                    adjusted = true;
                }
            }

            if !touched && !adjusted {
                trajectory.push(point.clone());
                continue;
            }

            let mut metrics = point.metrics.clone();
            for (metric, value) in metrics.iter_mut() {
                let scaled = *value * factor;
                if !scaled.is_finite() {
                    return Err(SimulationError::computation(
                        Stage::Scenario,
                        &name,
                        format!("metric `{}` became non-finite at {}", metric, point.date.to_rfc3339()),
                    ));
                }
                *value = scaled;
            }
            let confidence = if adjusted {
                (point.confidence * self.settings.adjustment_confidence_penalty)
                    .clamp(MIN_SCENARIO_CONFIDENCE, 1.0)
            } else {
                point.confidence
            };
            trajectory.push(TrajectoryPoint {
                date: point.date,
                metrics,
                confidence,
            });
        }

        let key_factors = self.key_factors(config, percentile, market);
        let confidence = self.confidence(config, baseline, context.data_quality());
        let weight = self.raw_weight(config, percentile);

        debug!(
            scenario = %name,
            points = trajectory.len(),
            confidence,
            weight,
            factors = ?key_factors,
            "scenario built"
        );

        Ok(ScenarioDraft {
            result: ScenarioResult {
                scenario_type: config.scenario_type,
                name,
                probability: 0.0,
                confidence,
                trajectory,
                key_factors,
            },
            weight,
        })
    }

    fn percentile_for(&self, config: &ScenarioConfig) -> Option<f64> {
        match config.scenario_type {
            ScenarioType::Optimistic => Some(self.settings.optimistic_percentile),
            ScenarioType::Realistic => Some(self.settings.realistic_percentile),
            ScenarioType::Pessimistic => Some(self.settings.pessimistic_percentile),
            ScenarioType::Custom => match config.percentile {
                Some(percentile) => Some(percentile),
                None if config.adjustments.is_empty() => Some(50.0),
                None => None,
            },
        }
    }

    fn key_factors(
        &self,
        config: &ScenarioConfig,
        percentile: Option<f64>,
        market: Option<&MarketBlend<'_>>,
    ) -> Vec<String> {
        let mut factors: Vec<String> = match config.scenario_type {
            ScenarioType::Optimistic => vec!["upside_percentile".to_string()],
            ScenarioType::Realistic => vec!["baseline_trend".to_string()],
            ScenarioType::Pessimistic => vec!["downside_percentile".to_string()],
            ScenarioType::Custom => percentile
                .filter(|_| config.percentile.is_some())
                .map(|percentile| vec![format!("percentile_{}", percentile.round() as i64)])
                .unwrap_or_default(),
        };
        if let Some(market) = market {
            factors.extend(market.key_factors());
        }
        for adjustment in &config.adjustments {
            let factor = format!("{}_adjustment", adjustment.factor.trim());
            if !factors.contains(&factor) {
                factors.push(factor);
            }
        }
        factors
    }

    fn confidence(&self, config: &ScenarioConfig, baseline: &[TrajectoryPoint], quality: f64) -> f64 {
        let type_factor = match config.scenario_type {
            ScenarioType::Realistic => 0.85,
            ScenarioType::Optimistic | ScenarioType::Pessimistic => 0.7,
            ScenarioType::Custom => (0.75 - 0.05 * config.adjustments.len() as f64).max(0.5),
        };
        let mean_confidence = if baseline.is_empty() {
            1.0
        } else {
            baseline.iter().map(|point| point.confidence).sum::<f64>() / baseline.len() as f64
        };
        (type_factor * quality * mean_confidence).clamp(MIN_SCENARIO_CONFIDENCE, 1.0)
    }

    fn raw_weight(&self, config: &ScenarioConfig, percentile: Option<f64>) -> f64 {
        match config.scenario_type {
            ScenarioType::Realistic => self.settings.realistic_weight,
            ScenarioType::Optimistic | ScenarioType::Pessimistic => self.settings.tail_weight,
            ScenarioType::Custom => match config.percentile.and(percentile) {
                Some(percentile) => {
                    let centrality = 1.0 - ((percentile - 50.0).abs() / 50.0).min(1.0);
                    self.settings.custom_weight * (0.5 + centrality)
                }
                None => self.settings.custom_weight,
            },
        }
        .max(0.0)
    }
}

fn validate_config(config: &ScenarioConfig, name: &str) -> Result<()> {
    if let Some(percentile) = config.percentile {
        if !percentile.is_finite() || !(0.0..=100.0).contains(&percentile) {
            return Err(SimulationError::validation(format!(
                "scenario `{}` percentile {} is outside 0..100",
                name, percentile
            )));
        }
    }
    for adjustment in &config.adjustments {
        if !adjustment.multiplier.is_finite() || adjustment.multiplier < 0.0 {
            return Err(SimulationError::validation(format!(
                "scenario `{}` adjustment `{}` has invalid multiplier {}",
                name, adjustment.factor, adjustment.multiplier
            )));
        }
        if adjustment.timeframe.start > adjustment.timeframe.end {
            return Err(SimulationError::validation(format!(
                "scenario `{}` adjustment `{}` window ends before it starts",
                name, adjustment.factor
            )));
        }
    }
    Ok(())
}
