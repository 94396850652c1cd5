mod common;

use std::path::PathBuf;
use std::time::Duration;

use campaign_sim::scenario::{ScenarioConfig, ScenarioType};
use campaign_sim::synthetic::{generate_synthetic_context, SyntheticCampaign};
use campaign_sim::{
    EngineConfig, RiskType, SimulationContext, SimulationEngine, SimulationError, Timeframe,
};

use common::{ctr_context, dataset, day, history};

fn synthetic() -> SimulationContext {
    generate_synthetic_context(&SyntheticCampaign::default())
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("campaign-sim-{}-{}.toml", name, std::process::id()))
}

#[test]
fn synthetic_campaign_runs_end_to_end() {
    let ctx = synthetic();
    let result = SimulationEngine::default().run(&ctx).unwrap();

    assert_eq!(result.simulation_id, ctx.simulation_id);
    assert_eq!(result.campaign_id, ctx.request.campaign_id);
    assert_eq!(result.trajectories.baseline.len(), 30);
    assert_eq!(result.scenarios.len(), 5);
    assert!(result.scenario_failures.is_empty());
    assert_eq!(result.scenario_risks.len(), result.scenarios.len());

    let total: f64 = result.scenarios.iter().map(|s| s.probability).sum();
    assert!((total - 1.0).abs() < 1e-9);
    let names: Vec<&str> = result.scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["optimistic", "realistic", "pessimistic", "custom_p90", "custom"]
    );

    assert!(result
        .risks
        .iter()
        .any(|r| r.risk_type == RiskType::BudgetOverrun));
    assert!(result
        .risks
        .iter()
        .any(|r| r.risk_type == RiskType::CompetitorThreat));
    assert!(!result.recommendations.is_empty());

    let metadata = &result.model_metadata;
    assert_eq!(metadata.forecast_model, "linear-trend-benchmark-blend/v1");
    assert_eq!(metadata.forecast_methods.len(), 4);
}

#[test]
fn synthetic_contexts_are_reproducible_per_seed() {
    let a = serde_json::to_string(&synthetic()).unwrap();
    let b = serde_json::to_string(&synthetic()).unwrap();
    assert_eq!(a, b);

    let other = generate_synthetic_context(&SyntheticCampaign {
        seed: 7,
        ..SyntheticCampaign::default()
    });
    assert_ne!(a, serde_json::to_string(&other).unwrap());
}

#[test]
fn repeated_runs_agree_apart_from_timing() {
    let ctx = synthetic();
    let engine = SimulationEngine::default();

    let first = engine.run(&ctx).unwrap();
    let second = engine.run(&ctx).unwrap();

    assert_eq!(first.trajectories.baseline, second.trajectories.baseline);
    assert_eq!(first.scenarios, second.scenarios);
    assert_eq!(first.risks, second.risks);
    assert_eq!(first.recommendations, second.recommendations);
}

#[test]
fn invalid_requests_fail_validation() {
    let engine = SimulationEngine::default();

    let mut no_scenarios = synthetic();
    no_scenarios.request.scenarios.clear();
    let err = engine.run(&no_scenarios).unwrap_err();
    assert!(matches!(err, SimulationError::Validation(_)));
    assert!(!err.is_retryable());

    let mut reversed = synthetic();
    reversed.request.timeframe = Timeframe::new(day(5), day(5));
    assert!(matches!(
        engine.run(&reversed),
        Err(SimulationError::Validation(_))
    ));

    let mut negative = synthetic();
    negative.request.metrics[0].weight = -1.0;
    assert!(matches!(
        engine.run(&negative),
        Err(SimulationError::Validation(_))
    ));
}

#[test]
fn missing_metric_data_aborts_the_run() {
    let ctx = ctr_context(dataset());

    let err = SimulationEngine::default().run(&ctx).unwrap_err();

    assert!(matches!(err, SimulationError::InsufficientData { .. }));
}

#[test]
fn failing_scenario_is_reported_without_sinking_the_run() {
    let mut data = dataset();
    data.historical_performance = history("ctr", &[0.03, 0.031, 0.029, 0.03]);
    let mut ctx = ctr_context(data);
    ctx.request.scenarios = vec![
        ScenarioConfig::named(ScenarioType::Realistic),
        ScenarioConfig::custom_percentile(150.0),
    ];

    let result = SimulationEngine::default().run(&ctx).unwrap();

    assert_eq!(result.scenarios.len(), 1);
    assert!((result.scenarios[0].probability - 1.0).abs() < 1e-12);
    assert_eq!(result.scenario_failures.len(), 1);
    assert_eq!(result.scenario_failures[0].index, 1);
    assert_eq!(result.scenario_failures[0].name, "custom_p150");
}

#[test]
fn run_fails_when_every_scenario_fails() {
    let mut data = dataset();
    data.historical_performance = history("ctr", &[0.03, 0.031]);
    let mut ctx = ctr_context(data);
    ctx.request.scenarios = vec![ScenarioConfig::custom_percentile(-5.0)];

    let err = SimulationEngine::default().run(&ctx).unwrap_err();

    assert!(matches!(err, SimulationError::Validation(_)));
}

#[test]
fn scenario_risks_can_be_disabled() {
    let mut config = EngineConfig::default();
    config.runtime.risk_per_scenario = false;

    let result = SimulationEngine::new(config).run(&synthetic()).unwrap();

    assert!(result.scenario_risks.is_empty());
}

#[tokio::test]
async fn run_with_timeout_returns_the_result() {
    let engine = SimulationEngine::default();

    let result = engine
        .run_with_timeout(synthetic(), Duration::from_secs(30))
        .await
        .unwrap();

    assert_eq!(result.scenarios.len(), 5);
}

#[tokio::test]
async fn exceeding_the_timeout_is_retryable() {
    let ctx = generate_synthetic_context(&SyntheticCampaign {
        history_days: 365,
        horizon_days: 3_650,
        ..SyntheticCampaign::default()
    });

    let err = SimulationEngine::default()
        .run_with_timeout(ctx, Duration::ZERO)
        .await
        .unwrap_err();

    assert!(matches!(err, SimulationError::Timeout(_)));
    assert!(err.is_retryable());
}

#[test]
fn context_parses_from_json() {
    let payload = r#"{
        "simulation_id": "sim-json",
        "organization_id": "org",
        "user_id": "user",
        "request": {
            "campaign_id": "cmp-json",
            "timeframe": {"start": "2026-03-01T00:00:00Z", "end": "2026-03-15T00:00:00Z"},
            "metrics": [{"type": "ctr"}, {"type": "cpc", "weight": 0.5}],
            "scenarios": [
                {"type": "realistic"},
                {"type": "custom", "percentile": 80}
            ]
        },
        "dataset": {
            "campaign": {"id": "cmp-json"},
            "market_data": {"industry_benchmarks": {"ctr": 0.03, "cpc": 1.1}}
        }
    }"#;

    let ctx: SimulationContext = serde_json::from_str(payload).unwrap();
    assert_eq!(ctx.request.metrics[0].weight, 1.0);
    assert!((ctx.dataset.data_quality.overall - 0.5).abs() < 1e-12);

    let result = SimulationEngine::default().run(&ctx).unwrap();
    assert_eq!(result.trajectories.baseline.len(), 14);
    assert_eq!(result.scenarios[1].name, "custom_p80");
}

#[test]
fn config_round_trips_and_fills_defaults() {
    let path = temp_path("roundtrip");
    let mut config = EngineConfig::default();
    config.risk.performance_dip_threshold = 0.4;
    config.runtime.timeout_ms = 1_500;
    config.write(&path).unwrap();

    let (loaded, loaded_path) = EngineConfig::load(Some(path.clone())).unwrap();
    assert_eq!(loaded_path.as_deref(), Some(path.as_path()));
    assert!((loaded.risk.performance_dip_threshold - 0.4).abs() < 1e-12);
    assert_eq!(loaded.runtime.timeout_ms, 1_500);

    let partial = temp_path("partial");
    std::fs::write(&partial, "[scenarios]\nspread = 0.3\n").unwrap();
    let (loaded, _) = EngineConfig::load(Some(partial.clone())).unwrap();
    assert!((loaded.scenarios.spread - 0.3).abs() < 1e-12);
    assert!((loaded.scenarios.realistic_weight - 0.6).abs() < 1e-12);
    assert!((loaded.risk.confidence_threshold - 0.3).abs() < 1e-12);

    let broken = temp_path("broken");
    std::fs::write(&broken, "[risk\n").unwrap();
    assert!(matches!(
        EngineConfig::load(Some(broken.clone())),
        Err(SimulationError::Config(_))
    ));

    for file in [path, partial, broken] {
        let _ = std::fs::remove_file(file);
    }
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let (config, path) = EngineConfig::load(Some(temp_path("absent"))).unwrap();

    assert!(path.is_some());
    assert!((config.forecast.benchmark_weight - 0.2).abs() < 1e-12);
    assert_eq!(SimulationEngine::new(config).default_timeout(), Duration::from_millis(30_000));
}
