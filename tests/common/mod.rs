#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeMap;

use campaign_sim::dataset::{
    BudgetAllocation, CampaignDefinition, CompetitorObservation, DataQuality, EnrichedDataset,
    PerformanceRecord,
};
use campaign_sim::model::{Granularity, MetricSpec, SimulationContext, SimulationRequest, Timeframe};
use campaign_sim::scenario::{ScenarioConfig, ScenarioOptions, ScenarioType};
use campaign_sim::{RiskAlert, TrajectoryPoint};

pub fn day(offset: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap() + Duration::days(offset)
}

pub fn dataset() -> EnrichedDataset {
    EnrichedDataset {
        campaign: CampaignDefinition {
            id: "cmp-1".to_string(),
            name: "Spring launch".to_string(),
            ..CampaignDefinition::default()
        },
        data_quality: DataQuality::from_components(0.8, 0.8, 0.8, 0.8),
        ..EnrichedDataset::default()
    }
}

pub fn context(metrics: Vec<MetricSpec>, dataset: EnrichedDataset, days: i64) -> SimulationContext {
    SimulationContext {
        simulation_id: "sim-test".to_string(),
        organization_id: "org-1".to_string(),
        user_id: "user-1".to_string(),
        request: SimulationRequest {
            campaign_id: dataset.campaign.id.clone(),
            timeframe: Timeframe::new(day(0), day(days)),
            granularity: Granularity::Daily,
            metrics,
            scenarios: vec![
                ScenarioConfig::named(ScenarioType::Optimistic),
                ScenarioConfig::named(ScenarioType::Realistic),
                ScenarioConfig::named(ScenarioType::Pessimistic),
            ],
            options: ScenarioOptions::default(),
            external_data_sources: Vec::new(),
        },
        dataset,
    }
}

pub fn ctr_context(dataset: EnrichedDataset) -> SimulationContext {
    context(vec![MetricSpec::new("ctr", 1.0)], dataset, 30)
}

/// History ending the day before `day(0)`.
pub fn history(metric: &str, values: &[f64]) -> Vec<PerformanceRecord> {
    let len = values.len() as i64;
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let mut metrics = BTreeMap::new();
            metrics.insert(metric.to_string(), *value);
            PerformanceRecord {
                date: day(index as i64 - len),
                metrics,
            }
        })
        .collect()
}

pub fn linear_trajectory(metric: &str, from: f64, to: f64, points: usize) -> Vec<TrajectoryPoint> {
    (0..points)
        .map(|index| {
            let progress = if points > 1 {
                index as f64 / (points - 1) as f64
            } else {
                0.0
            };
            point(index as i64, &[(metric, from + (to - from) * progress)], 0.8)
        })
        .collect()
}

pub fn flat_trajectory(metrics: &[(&str, f64)], points: usize) -> Vec<TrajectoryPoint> {
    (0..points)
        .map(|index| point(index as i64, metrics, 0.8))
        .collect()
}

pub fn point(offset: i64, metrics: &[(&str, f64)], confidence: f64) -> TrajectoryPoint {
    TrajectoryPoint {
        date: day(offset),
        metrics: metrics
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect(),
        confidence,
    }
}

pub fn competitor(name: &str, spends: &[f64]) -> Vec<CompetitorObservation> {
    spends
        .iter()
        .enumerate()
        .map(|(index, spend)| CompetitorObservation {
            competitor: name.to_string(),
            date: day(-21 + 7 * index as i64),
            ad_spend: *spend,
            impressions: None,
        })
        .collect()
}

pub fn allocation(channel: &str, allocated: f64, spent: f64) -> BudgetAllocation {
    BudgetAllocation {
        channel: channel.to_string(),
        allocated,
        spent,
    }
}

pub fn mean_metric(trajectory: &[TrajectoryPoint], metric: &str) -> f64 {
    let values: Vec<f64> = trajectory.iter().filter_map(|p| p.metric(metric)).collect();
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn assert_ranked(alerts: &[RiskAlert]) {
    for pair in alerts.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.severity >= b.severity, "severity out of order: {:?}", alerts);
        if a.severity == b.severity {
            assert!(a.impact >= b.impact, "impact out of order: {:?}", alerts);
            if a.impact == b.impact {
                assert!(a.probability >= b.probability);
            }
        }
    }
}
