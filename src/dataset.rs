//! Input dataset assembled upstream from stored campaign data and platform connectors.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::MetricMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichedDataset {
    pub campaign: CampaignDefinition,
    #[serde(default)]
    pub historical_performance: Vec<PerformanceRecord>,
    #[serde(default)]
    pub audience_insights: AudienceInsights,
    #[serde(default)]
    pub budget_allocation: Vec<BudgetAllocation>,
    #[serde(default)]
    pub market_data: MarketData,
    #[serde(default)]
    pub data_quality: DataQuality,
}

impl EnrichedDataset {
    /// Observations of one metric, oldest first.
    pub fn metric_history(&self, metric: &str) -> Vec<(DateTime<Utc>, f64)> {
        let mut series: Vec<(DateTime<Utc>, f64)> = self
            .historical_performance
            .iter()
            .filter_map(|record| {
                record
                    .metrics
                    .get(metric)
                    .copied()
                    .filter(|value| value.is_finite())
                    .map(|value| (record.date, value))
            })
            .collect();
        series.sort_by_key(|(date, _)| *date);
        series
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_budget: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub date: DateTime<Utc>,
    pub metrics: MetricMap,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudienceInsights {
    #[serde(default)]
    pub segments: Vec<AudienceSegment>,
    /// Average impressions per reached user.
    #[serde(default)]
    pub average_frequency: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudienceSegment {
    pub name: String,
    pub size: u64,
    pub engagement_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub channel: String,
    pub allocated: f64,
    pub spent: f64,
}

impl BudgetAllocation {
    pub fn utilization(&self) -> Option<f64> {
        if self.allocated > 0.0 && self.spent.is_finite() {
            Some(self.spent / self.allocated)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub competitor_activity: Vec<CompetitorObservation>,
    #[serde(default)]
    pub seasonal_trends: Vec<SeasonalTrend>,
    #[serde(default)]
    pub industry_benchmarks: BTreeMap<String, f64>,
    #[serde(default)]
    pub volatility: f64,
}

impl MarketData {
    /// Observations grouped per competitor, each group oldest first.
    pub fn competitors(&self) -> BTreeMap<&str, Vec<&CompetitorObservation>> {
        let mut grouped: BTreeMap<&str, Vec<&CompetitorObservation>> = BTreeMap::new();
        for observation in &self.competitor_activity {
            grouped
                .entry(observation.competitor.as_str())
                .or_default()
                .push(observation);
        }
        for observations in grouped.values_mut() {
            observations.sort_by_key(|observation| observation.date);
        }
        grouped
    }

    /// Seasonal index for the month of `date`; 1.0 when no trend covers it.
    pub fn seasonal_index(&self, date: DateTime<Utc>) -> f64 {
        let month = date.month();
        self.seasonal_trends
            .iter()
            .find(|trend| trend.month == month)
            .map(|trend| trend.index)
            .filter(|index| index.is_finite() && *index >= 0.0)
            .unwrap_or(1.0)
    }

    pub fn benchmark(&self, key: &str) -> Option<f64> {
        self.industry_benchmarks
            .get(key)
            .copied()
            .filter(|value| value.is_finite())
    }

    pub fn volatility_clamped(&self) -> f64 {
        if self.volatility.is_finite() {
            self.volatility.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorObservation {
    pub competitor: String,
    pub date: DateTime<Utc>,
    pub ad_spend: f64,
    #[serde(default)]
    pub impressions: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalTrend {
    pub month: u32,
    pub index: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQuality {
    pub overall: f64,
    #[serde(default)]
    pub completeness: f64,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub freshness: f64,
    #[serde(default)]
    pub consistency: f64,
}

impl Default for DataQuality {
    fn default() -> Self {
        Self {
            overall: 0.5,
            completeness: 0.5,
            accuracy: 0.5,
            freshness: 0.5,
            consistency: 0.5,
        }
    }
}

impl DataQuality {
    pub fn from_components(completeness: f64, accuracy: f64, freshness: f64, consistency: f64) -> Self {
        let overall = (completeness + accuracy + freshness + consistency) / 4.0;
        Self {
            overall,
            completeness,
            accuracy,
            freshness,
            consistency,
        }
    }

    pub fn overall_clamped(&self) -> f64 {
        if self.overall.is_finite() {
            self.overall.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
