//! Seeded synthetic campaigns for demos and reproducible tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;

use crate::dataset::{
    AudienceInsights, AudienceSegment, BudgetAllocation, CampaignDefinition, CompetitorObservation,
    DataQuality, EnrichedDataset, MarketData, PerformanceRecord, SeasonalTrend,
};
use crate::model::{Granularity, MetricMap, MetricSpec, SimulationContext, SimulationRequest, Timeframe};
use crate::scenario::{Adjustment, ScenarioConfig, ScenarioOptions, ScenarioType};

const JITTER: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct SyntheticCampaign {
    pub seed: u64,
    pub history_days: usize,
    pub horizon_days: i64,
    pub as_of: DateTime<Utc>,
    /// Fraction of CTR lost across the history window.
    pub ctr_decay: f64,
}

impl Default for SyntheticCampaign {
    fn default() -> Self {
        Self {
            seed: 42,
            history_days: 28,
            horizon_days: 30,
            as_of: Utc
                .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            ctr_decay: 0.3,
        }
    }
}

pub fn generate_synthetic_context(spec: &SyntheticCampaign) -> SimulationContext {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let history_days = spec.history_days.max(1);
    let campaign_start = spec.as_of - Duration::days(history_days as i64);
    let campaign_end = spec.as_of + Duration::days(spec.horizon_days.max(1));

    let mut historical_performance = Vec::with_capacity(history_days);
    for day in 0..history_days {
        let progress = day as f64 / history_days as f64;
        let mut metrics = MetricMap::new();
        metrics.insert(
            "ctr".to_string(),
            0.035 * (1.0 - spec.ctr_decay * progress) * jitter(&mut rng),
        );
        metrics.insert("cpc".to_string(), 1.2 * (1.0 + 0.3 * progress) * jitter(&mut rng));
        metrics.insert("conversions".to_string(), 40.0 * (1.0 - 0.2 * progress) * jitter(&mut rng));
        metrics.insert("impressions".to_string(), 20_000.0 * jitter(&mut rng));
        historical_performance.push(PerformanceRecord {
            date: campaign_start + Duration::days(day as i64),
            metrics,
        });
    }

    let mut competitor_activity = Vec::new();
    for week in 0..3i64 {
        let date = spec.as_of - Duration::days(7 * (3 - week));
        competitor_activity.push(CompetitorObservation {
            competitor: "northwind".to_string(),
            date,
            ad_spend: 50_000.0 + 25_000.0 * week as f64,
            impressions: Some(400_000.0 * (1.0 + 0.4 * week as f64)),
        });
        competitor_activity.push(CompetitorObservation {
            competitor: "contoso".to_string(),
            date,
            ad_spend: 30_000.0 * jitter(&mut rng),
            impressions: None,
        });
    }

    let seasonal_trends = (1..=12u32)
        .map(|month| SeasonalTrend {
            month,
            index: 1.0 + 0.15 * (month as f64 / 12.0 * std::f64::consts::TAU).sin(),
        })
        .collect();

    let industry_benchmarks: BTreeMap<String, f64> = [
        ("ctr", 0.03),
        ("cpc", 1.1),
        ("conversions", 35.0),
        ("impressions", 18_000.0),
        ("roas", 3.0),
    ]
    .into_iter()
    .map(|(metric, value)| (metric.to_string(), value))
    .collect();

    let dataset = EnrichedDataset {
        campaign: CampaignDefinition {
            id: format!("campaign_{:x}", spec.seed),
            name: "Synthetic spring launch".to_string(),
            objective: "conversions".to_string(),
            channels: vec!["search".to_string(), "social".to_string(), "display".to_string()],
            start_date: Some(campaign_start),
            end_date: Some(campaign_end),
            total_budget: 23_000.0,
        },
        historical_performance,
        audience_insights: AudienceInsights {
            segments: vec![
                AudienceSegment {
                    name: "returning visitors".to_string(),
                    size: 48_000,
                    engagement_rate: 0.041 * jitter(&mut rng),
                },
                AudienceSegment {
                    name: "lookalike".to_string(),
                    size: 210_000,
                    engagement_rate: 0.022 * jitter(&mut rng),
                },
            ],
            average_frequency: Some(3.0 + rng.gen_range(0.0..1.5)),
        },
        budget_allocation: vec![
            BudgetAllocation {
                channel: "search".to_string(),
                allocated: 10_000.0,
                spent: 9_400.0,
            },
            BudgetAllocation {
                channel: "social".to_string(),
                allocated: 8_000.0,
                spent: 5_200.0,
            },
            BudgetAllocation {
                channel: "display".to_string(),
                allocated: 5_000.0,
                spent: 2_100.0,
            },
        ],
        market_data: MarketData {
            competitor_activity,
            seasonal_trends,
            industry_benchmarks,
            volatility: 0.2 + rng.gen_range(0.0..0.2),
        },
        data_quality: DataQuality::from_components(0.9, 0.85, 0.8, 0.88),
    };

    let budget_window = Timeframe::new(
        spec.as_of + Duration::days(7),
        spec.as_of + Duration::days(14),
    );

    SimulationContext {
        simulation_id: format!("sim_{:x}", spec.seed),
        organization_id: "org_demo".to_string(),
        user_id: "user_demo".to_string(),
        request: SimulationRequest {
            campaign_id: dataset.campaign.id.clone(),
            timeframe: Timeframe::new(spec.as_of, campaign_end),
            granularity: Granularity::Daily,
            metrics: vec![
                MetricSpec::new("ctr", 1.0),
                MetricSpec::new("conversions", 0.8),
                MetricSpec::new("cpc", 0.5),
                MetricSpec::new("impressions", 0.4),
            ],
            scenarios: vec![
                ScenarioConfig::named(ScenarioType::Optimistic),
                ScenarioConfig::named(ScenarioType::Realistic),
                ScenarioConfig::named(ScenarioType::Pessimistic),
                ScenarioConfig::custom_percentile(90.0),
                ScenarioConfig::custom_adjustments(vec![Adjustment {
                    factor: "budget".to_string(),
                    multiplier: 1.15,
                    timeframe: budget_window,
                }]),
            ],
            options: ScenarioOptions {
                include_market_factors: true,
                include_seasonality: true,
                include_competition: true,
            },
            external_data_sources: vec!["synthetic".to_string()],
        },
        dataset,
    }
}

fn jitter(rng: &mut StdRng) -> f64 {
    1.0 + rng.gen_range(-JITTER..JITTER)
}
