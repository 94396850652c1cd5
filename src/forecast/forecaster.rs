use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::ForecastConfig;
use crate::error::{Result, SimulationError, Stage};
use crate::forecast::regression::{fit_linear, LinearFit};
use crate::model::{
    days_between, relative_weights, validate_metrics, MetricMap, MetricSpec, SimulationContext,
    TrajectoryPoint,
};

pub const FORECAST_MODEL_ID: &str = "linear-trend-benchmark-blend/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    LinearTrend,
    Level,
    BenchmarkOnly,
}

impl ForecastMethod {
    fn fit_confidence(self, fit: Option<&LinearFit>) -> f64 {
        match self {
            ForecastMethod::LinearTrend => 0.5 + 0.5 * fit.map(|fit| fit.r_squared).unwrap_or(0.0),
            ForecastMethod::Level => 0.6,
            ForecastMethod::BenchmarkOnly => 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub points: Vec<TrajectoryPoint>,
    pub methods: BTreeMap<String, ForecastMethod>,
    pub model_id: String,
}

#[derive(Debug, Clone)]
enum Projection {
    Trend { fit: LinearFit, origin: DateTime<Utc> },
    Level(f64),
    Benchmark(f64),
}

#[derive(Debug, Clone)]
struct MetricModel {
    metric: String,
    method: ForecastMethod,
    projection: Projection,
    benchmark: Option<f64>,
    fit_confidence: f64,
    last_observed: Option<DateTime<Utc>>,
}

impl MetricModel {
    fn project(&self, date: DateTime<Utc>, benchmark_weight: f64) -> f64 {
        let raw = match &self.projection {
            Projection::Trend { fit, origin } => fit.at(days_between(*origin, date)),
            Projection::Level(level) => *level,
            Projection::Benchmark(value) => return *value,
        };
        match self.benchmark {
            Some(benchmark) => (1.0 - benchmark_weight) * raw + benchmark_weight * benchmark,
            None => raw,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrajectoryForecaster {
    config: ForecastConfig,
}

impl TrajectoryForecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn forecast(&self, context: &SimulationContext) -> Result<Forecast> {
        let request = &context.request;
        request.timeframe.validate()?;
        validate_metrics(&request.metrics)?;

        let models = request
            .metrics
            .iter()
            .map(|spec| self.build_model(spec, context))
            .collect::<Result<Vec<_>>>()?;

        let weights = relative_weights(&request.metrics);
        let weight_total: f64 = weights.iter().sum();
        let fit_confidence = models
            .iter()
            .zip(weights.iter())
            .map(|(model, weight)| model.fit_confidence * weight)
            .sum::<f64>()
            / weight_total;

        let quality_factor = 0.5 + 0.5 * context.data_quality();
        let last_observed = models.iter().filter_map(|model| model.last_observed).max();
        let benchmark_weight = self.config.benchmark_weight.clamp(0.0, 1.0);

        let mut points = Vec::new();
        for date in request.granularity.dates(&request.timeframe) {
            let mut metrics = MetricMap::new();
            for model in &models {
                let value = model.project(date, benchmark_weight);
                if !value.is_finite() {
                    return Err(SimulationError::computation(
                        Stage::Forecast,
                        &model.metric,
                        format!("projection for {} is not finite", date.to_rfc3339()),
                    ));
                }
                metrics.insert(model.metric.clone(), value.max(0.0));
            }

            let reference = last_observed.unwrap_or(request.timeframe.start);
            let distance = days_between(reference, date).max(0.0);
            let decay = (-self.config.confidence_decay_per_day.max(0.0) * distance).exp();
            let confidence =
                (fit_confidence * quality_factor * decay).clamp(self.min_confidence(), 1.0);

            points.push(TrajectoryPoint {
                date,
                metrics,
                confidence,
            });
        }

        let methods = models
            .iter()
            .map(|model| (model.metric.clone(), model.method))
            .collect();

        info!(
            simulation_id = %context.simulation_id,
            points = points.len(),
            metrics = models.len(),
            "baseline trajectory forecast"
        );

        Ok(Forecast {
            points,
            methods,
            model_id: FORECAST_MODEL_ID.to_string(),
        })
    }

    fn build_model(&self, spec: &MetricSpec, context: &SimulationContext) -> Result<MetricModel> {
        let history = context.dataset.metric_history(&spec.metric);
        let benchmark = context.dataset.market_data.benchmark(spec.benchmark_key());
        let last_observed = history.last().map(|(date, _)| *date);

        let (method, projection, fit) = match history.as_slice() {
            [] => {
                let benchmark = benchmark.ok_or_else(|| SimulationError::InsufficientData {
                    metric: spec.metric.clone(),
                    reason: "no historical performance and no industry benchmark".to_string(),
                })?;
                if self.config.require_history {
                    return Err(SimulationError::InsufficientData {
                        metric: spec.metric.clone(),
                        reason: "no historical performance and benchmark-only forecasts are disabled"
                            .to_string(),
                    });
                }
                (ForecastMethod::BenchmarkOnly, Projection::Benchmark(benchmark), None)
            }
            [(_, value)] => (ForecastMethod::Level, Projection::Level(*value), None),
            [(origin, _), ..] => {
                let samples: Vec<(f64, f64)> = history
                    .iter()
                    .map(|(date, value)| (days_between(*origin, *date), *value))
                    .collect();
                match fit_linear(&samples) {
                    Some(fit) => (
                        ForecastMethod::LinearTrend,
                        Projection::Trend {
                            fit,
                            origin: *origin,
                        },
                        Some(fit),
                    ),
                    // Every observation shares one timestamp: fall back to their mean.
                    None => {
                        let level = samples.iter().map(|(_, y)| y).sum::<f64>() / samples.len() as f64;
                        (ForecastMethod::Level, Projection::Level(level), None)
                    }
                }
            }
        };

        let fit_confidence = method.fit_confidence(fit.as_ref());
        debug!(
            metric = %spec.metric,
            method = ?method,
            observations = history.len(),
            benchmark = ?benchmark,
            fit_confidence,
            "metric model built"
        );

        Ok(MetricModel {
            metric: spec.metric.clone(),
            method,
            projection,
            benchmark: if matches!(method, ForecastMethod::BenchmarkOnly) {
                None
            } else {
                benchmark
            },
            fit_confidence,
            last_observed,
        })
    }

    fn min_confidence(&self) -> f64 {
        self.config.min_confidence.clamp(0.001, 1.0)
    }
}
