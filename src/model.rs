use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dataset::EnrichedDataset;
use crate::error::{Result, SimulationError};
use crate::scenario::{ScenarioConfig, ScenarioOptions};

pub type MetricMap = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub date: DateTime<Utc>,
    pub metrics: MetricMap,
    pub confidence: f64,
}

impl TrajectoryPoint {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeframe {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Timeframe {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Inclusive on both ends; used for adjustment windows.
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn validate(&self) -> Result<()> {
        if self.start >= self.end {
            return Err(SimulationError::validation(format!(
                "timeframe start {} must be before end {}",
                self.start.to_rfc3339(),
                self.end.to_rfc3339()
            )));
        }
        Ok(())
    }

    pub fn days(&self) -> f64 {
        days_between(self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
}

impl Granularity {
    pub fn step(self) -> Duration {
        match self {
            Granularity::Daily => Duration::days(1),
            Granularity::Weekly => Duration::days(7),
        }
    }

    /// Every `start + k * step` inside `[start, end)`.
    pub fn dates(self, timeframe: &Timeframe) -> Vec<DateTime<Utc>> {
        let step = self.step();
        let mut dates = Vec::new();
        let mut cursor = timeframe.start;
        while cursor < timeframe.end {
            dates.push(cursor);
            cursor += step;
        }
        dates
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    #[serde(rename = "type")]
    pub metric: String,
    #[serde(default = "default_metric_weight")]
    pub weight: f64,
    #[serde(default)]
    pub benchmark_source: Option<String>,
}

fn default_metric_weight() -> f64 {
    1.0
}

impl MetricSpec {
    pub fn new(metric: impl Into<String>, weight: f64) -> Self {
        Self {
            metric: metric.into(),
            weight,
            benchmark_source: None,
        }
    }

    pub fn kind(&self) -> MetricKind {
        MetricKind::classify(&self.metric)
    }

    pub fn benchmark_key(&self) -> &str {
        self.benchmark_source.as_deref().unwrap_or(&self.metric)
    }
}

/// Non-empty, named, with finite non-negative weights.
pub fn validate_metrics(metrics: &[MetricSpec]) -> Result<()> {
    if metrics.is_empty() {
        return Err(SimulationError::validation("at least one metric is required"));
    }
    for spec in metrics {
        if spec.metric.trim().is_empty() {
            return Err(SimulationError::validation("metric type must not be empty"));
        }
        if !spec.weight.is_finite() || spec.weight < 0.0 {
            return Err(SimulationError::validation(format!(
                "metric `{}` has invalid weight {}",
                spec.metric, spec.weight
            )));
        }
    }
    Ok(())
}

/// Each metric's weight relative to the heaviest one; equal shares when every weight is zero.
pub fn relative_weights(metrics: &[MetricSpec]) -> Vec<f64> {
    let max = metrics
        .iter()
        .map(|spec| spec.weight)
        .fold(0.0_f64, f64::max);
    metrics
        .iter()
        .map(|spec| if max > 0.0 { spec.weight / max } else { 1.0 })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Engagement,
    Conversion,
    Reach,
    Cost,
    Other,
}

impl MetricKind {
    pub fn classify(name: &str) -> Self {
        let name = name.to_lowercase();
        match name.as_str() {
            "ctr" | "engagement_rate" | "engagement" | "clicks" | "likes" | "shares"
            | "comments" | "video_views" | "view_rate" => MetricKind::Engagement,
            "conversions" | "conversion_rate" | "roas" | "revenue" | "leads" => {
                MetricKind::Conversion
            }
            "impressions" | "reach" | "frequency" => MetricKind::Reach,
            "cpc" | "cpm" | "cpa" | "cpl" | "cost" | "spend" => MetricKind::Cost,
            _ => MetricKind::Other,
        }
    }

    pub fn lower_is_better(self) -> bool {
        matches!(self, MetricKind::Cost)
    }

    /// Relative deterioration from `from` to `to`; positive means worse.
    pub fn deterioration(self, from: f64, to: f64) -> Option<f64> {
        if from <= 0.0 || !from.is_finite() || !to.is_finite() {
            return None;
        }
        let change = (to - from) / from;
        Some(if self.lower_is_better() { change } else { -change })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub campaign_id: String,
    pub timeframe: Timeframe,
    #[serde(default)]
    pub granularity: Granularity,
    pub metrics: Vec<MetricSpec>,
    pub scenarios: Vec<ScenarioConfig>,
    #[serde(default)]
    pub options: ScenarioOptions,
    #[serde(default)]
    pub external_data_sources: Vec<String>,
}

/// Everything one simulation run reads. Stages only ever borrow it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationContext {
    pub simulation_id: String,
    pub organization_id: String,
    pub user_id: String,
    pub request: SimulationRequest,
    pub dataset: EnrichedDataset,
}

impl SimulationContext {
    pub fn validate(&self) -> Result<()> {
        self.request.timeframe.validate()?;
        validate_metrics(&self.request.metrics)?;
        if self.request.scenarios.is_empty() {
            return Err(SimulationError::validation("at least one scenario is required"));
        }
        Ok(())
    }

    pub fn data_quality(&self) -> f64 {
        self.dataset.data_quality.overall_clamped()
    }
}

pub(crate) fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 86_400.0
}
