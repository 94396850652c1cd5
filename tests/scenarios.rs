mod common;

use campaign_sim::config::ScenarioSettings;
use campaign_sim::dataset::SeasonalTrend;
use campaign_sim::model::{SimulationContext, Timeframe, TrajectoryPoint};
use campaign_sim::scenario::{
    Adjustment, ScenarioConfig, ScenarioGenerator, ScenarioOptions, ScenarioResult, ScenarioType,
};
use campaign_sim::SimulationError;

use common::{competitor, ctr_context, dataset, day, flat_trajectory, mean_metric};

fn baseline() -> Vec<TrajectoryPoint> {
    flat_trajectory(&[("ctr", 0.03), ("cpc", 1.2)], 30)
}

fn named(types: &[ScenarioType]) -> Vec<ScenarioConfig> {
    types.iter().map(|t| ScenarioConfig::named(*t)).collect()
}

fn generate(
    baseline: &[TrajectoryPoint],
    configs: &[ScenarioConfig],
    ctx: &SimulationContext,
) -> Vec<ScenarioResult> {
    ScenarioGenerator::default()
        .generate_scenarios(baseline, configs, ctx, &ScenarioOptions::default())
        .unwrap()
}

fn by_type(results: &[ScenarioResult], scenario_type: ScenarioType) -> &ScenarioResult {
    results
        .iter()
        .find(|s| s.scenario_type == scenario_type)
        .unwrap()
}

fn adjustment(factor: &str, multiplier: f64, from: i64, to: i64) -> Adjustment {
    Adjustment {
        factor: factor.to_string(),
        multiplier,
        timeframe: Timeframe::new(day(from), day(to)),
    }
}

const STANDARD: [ScenarioType; 3] = [
    ScenarioType::Optimistic,
    ScenarioType::Realistic,
    ScenarioType::Pessimistic,
];

#[test]
fn probabilities_sum_to_one_with_realistic_most_likely() {
    let ctx = ctr_context(dataset());
    let results = generate(&baseline(), &named(&STANDARD), &ctx);

    let total: f64 = results.iter().map(|s| s.probability).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!((by_type(&results, ScenarioType::Realistic).probability - 0.6).abs() < 1e-9);
    assert!((by_type(&results, ScenarioType::Optimistic).probability - 0.2).abs() < 1e-9);
    assert!((by_type(&results, ScenarioType::Pessimistic).probability - 0.2).abs() < 1e-9);
}

#[test]
fn optimistic_outperforms_pessimistic_on_every_metric() {
    let ctx = ctr_context(dataset());
    let results = generate(&baseline(), &named(&STANDARD), &ctx);
    let optimistic = by_type(&results, ScenarioType::Optimistic);
    let pessimistic = by_type(&results, ScenarioType::Pessimistic);

    for metric in ["ctr", "cpc"] {
        assert!(
            optimistic.metric_mean(metric).unwrap() > pessimistic.metric_mean(metric).unwrap(),
            "metric {}",
            metric
        );
    }
}

#[test]
fn realistic_scenario_follows_the_baseline() {
    let ctx = ctr_context(dataset());
    let base = baseline();
    let results = generate(&base, &named(&[ScenarioType::Realistic]), &ctx);

    let realistic = &results[0];
    assert_eq!(realistic.trajectory, base);
    assert!((realistic.probability - 1.0).abs() < 1e-12);
    assert_eq!(realistic.key_factors, vec!["baseline_trend".to_string()]);
}

#[test]
fn spread_widens_toward_the_end_of_the_horizon() {
    let ctx = ctr_context(dataset());
    let results = generate(&baseline(), &named(&[ScenarioType::Optimistic]), &ctx);
    let trajectory = &results[0].trajectory;

    let first = trajectory[0].metric("ctr").unwrap();
    let last = trajectory[29].metric("ctr").unwrap();
    assert!(first > 0.03);
    assert!(last > first);
}

#[test]
fn higher_custom_percentiles_project_higher_values() {
    let ctx = ctr_context(dataset());
    let configs = vec![
        ScenarioConfig::custom_percentile(90.0),
        ScenarioConfig::custom_percentile(60.0),
    ];
    let results = generate(&baseline(), &configs, &ctx);

    assert_eq!(results[0].name, "custom_p90");
    assert!(results[0].key_factors.contains(&"percentile_90".to_string()));
    let p90 = results[0].metric_mean("ctr").unwrap();
    let p60 = results[1].metric_mean("ctr").unwrap();
    assert!(p90 > p60);
    assert!(p60 > 0.03);
    // Values nearer the median carry more weight.
    assert!(results[1].probability > results[0].probability);
}

#[test]
fn adjustments_only_touch_points_inside_their_window() {
    let ctx = ctr_context(dataset());
    let base = baseline();
    let configs = vec![ScenarioConfig::custom_adjustments(vec![adjustment(
        "budget", 1.5, 5, 9,
    )])];
    let results = generate(&base, &configs, &ctx);
    let trajectory = &results[0].trajectory;

    for (index, (point, original)) in trajectory.iter().zip(base.iter()).enumerate() {
        if (5..=9).contains(&index) {
            assert!((point.metric("ctr").unwrap() - 0.045).abs() < 1e-12);
            assert!((point.metric("cpc").unwrap() - 1.8).abs() < 1e-12);
            assert!(point.confidence < original.confidence);
        } else {
            assert_eq!(point, original, "point {} changed", index);
        }
    }
    assert!(results[0].key_factors.contains(&"budget_adjustment".to_string()));
}

#[test]
fn overlapping_adjustments_compose_multiplicatively() {
    let ctx = ctr_context(dataset());
    let configs = vec![ScenarioConfig::custom_adjustments(vec![
        adjustment("budget", 1.2, 0, 10),
        adjustment("creative", 1.5, 5, 15),
    ])];
    let results = generate(&baseline(), &configs, &ctx);
    let ctr_at = |index: usize| results[0].trajectory[index].metric("ctr").unwrap();

    assert!((ctr_at(2) - 0.03 * 1.2).abs() < 1e-12);
    assert!((ctr_at(7) - 0.03 * 1.2 * 1.5).abs() < 1e-12);
    assert!((ctr_at(12) - 0.03 * 1.5).abs() < 1e-12);
    assert!((ctr_at(20) - 0.03).abs() < 1e-15);
    let factors = &results[0].key_factors;
    assert!(factors.contains(&"budget_adjustment".to_string()));
    assert!(factors.contains(&"creative_adjustment".to_string()));
}

#[test]
fn market_factors_shape_every_scenario() {
    let mut data = dataset();
    data.market_data.seasonal_trends = vec![SeasonalTrend {
        month: 3,
        index: 1.2,
    }];
    data.market_data.competitor_activity = competitor("northwind", &[50_000.0, 75_000.0, 100_000.0]);
    let ctx = ctr_context(data);
    let options = ScenarioOptions {
        include_market_factors: true,
        include_seasonality: true,
        include_competition: true,
    };

    let base = baseline();
    let results = ScenarioGenerator::default()
        .generate_scenarios(&base, &named(&STANDARD), &ctx, &options)
        .unwrap();

    for scenario in &results {
        for factor in ["market", "seasonal", "competitive"] {
            assert!(
                scenario.key_factors.contains(&factor.to_string()),
                "{} missing {}",
                scenario.name,
                factor
            );
        }
    }
    let realistic = by_type(&results, ScenarioType::Realistic);
    // March is a 1.2 month at half weight; competition erodes toward the end.
    assert!((realistic.trajectory[0].metric("ctr").unwrap() - 0.033).abs() < 1e-12);
    assert!(realistic.trajectory[29].metric("ctr").unwrap() < 0.033);
}

#[test]
fn adjustment_scenarios_sit_on_the_market_blend_outside_their_windows() {
    let mut data = dataset();
    data.market_data.seasonal_trends = vec![SeasonalTrend {
        month: 3,
        index: 1.3,
    }];
    let ctx = ctr_context(data);
    let options = ScenarioOptions {
        include_market_factors: true,
        include_seasonality: true,
        include_competition: false,
    };
    let configs = vec![
        ScenarioConfig::custom_adjustments(vec![Adjustment {
            factor: "budget".to_string(),
            multiplier: 1.4,
            timeframe: Timeframe::new(day(5), day(9)),
        }]),
        ScenarioConfig::custom_percentile(50.0),
    ];

    let base = baseline();
    let results = ScenarioGenerator::default()
        .generate_scenarios(&base, &configs, &ctx, &options)
        .unwrap();
    let (adjusted, median) = (&results[0], &results[1]);
    assert_eq!(median.name, "custom_p50");

    for (index, (a, m)) in adjusted.trajectory.iter().zip(median.trajectory.iter()).enumerate() {
        let ctr = a.metric("ctr").unwrap();
        if (5..=9).contains(&index) {
            assert!((ctr - 0.03 * 1.15 * 1.4).abs() < 1e-12, "day {} ctr={}", index, ctr);
        } else {
            assert_eq!(a, m, "day {}", index);
            assert!((ctr - 0.0345).abs() < 1e-12, "day {} ctr={}", index, ctr);
            assert_ne!(a.metrics, base[index].metrics);
        }
    }
}

#[test]
fn market_volatility_widens_the_spread() {
    let options = ScenarioOptions {
        include_market_factors: true,
        ..ScenarioOptions::default()
    };
    let calm = ctr_context(dataset());
    let mut volatile_data = dataset();
    volatile_data.market_data.volatility = 0.5;
    let volatile = ctr_context(volatile_data);

    let generator = ScenarioGenerator::default();
    let configs = named(&[ScenarioType::Optimistic]);
    let calm = generator
        .generate_scenarios(&baseline(), &configs, &calm, &options)
        .unwrap();
    let volatile = generator
        .generate_scenarios(&baseline(), &configs, &volatile, &options)
        .unwrap();

    assert!(volatile[0].metric_mean("ctr").unwrap() > calm[0].metric_mean("ctr").unwrap());
}

#[test]
fn empty_and_single_point_baselines_are_handled() {
    let ctx = ctr_context(dataset());

    let empty = generate(&[], &named(&STANDARD), &ctx);
    assert_eq!(empty.len(), 3);
    assert!(empty.iter().all(|s| s.trajectory.is_empty()));

    let single = generate(&baseline()[..1], &named(&STANDARD), &ctx);
    assert!(single.iter().all(|s| s.trajectory.len() == 1));
    let optimistic = by_type(&single, ScenarioType::Optimistic);
    let pessimistic = by_type(&single, ScenarioType::Pessimistic);
    assert!(optimistic.trajectory[0].metric("ctr") > pessimistic.trajectory[0].metric("ctr"));
}

#[test]
fn confidence_tracks_data_quality() {
    let mut poor = dataset();
    poor.data_quality.overall = 0.3;
    let mut good = dataset();
    good.data_quality.overall = 0.9;

    let configs = named(&STANDARD);
    let poor = generate(&baseline(), &configs, &ctr_context(poor));
    let good = generate(&baseline(), &configs, &ctr_context(good));

    for (p, g) in poor.iter().zip(good.iter()) {
        assert!(g.confidence > p.confidence);
    }
    let realistic = by_type(&good, ScenarioType::Realistic);
    assert!((realistic.confidence - 0.85 * 0.9 * 0.8).abs() < 1e-9);
}

#[test]
fn scenario_output_does_not_depend_on_config_order() {
    let ctx = ctr_context(dataset());
    let forward = generate(
        &baseline(),
        &named(&[ScenarioType::Optimistic, ScenarioType::Pessimistic]),
        &ctx,
    );
    let reverse = generate(
        &baseline(),
        &named(&[ScenarioType::Pessimistic, ScenarioType::Optimistic]),
        &ctx,
    );

    for scenario_type in [ScenarioType::Optimistic, ScenarioType::Pessimistic] {
        assert_eq!(by_type(&forward, scenario_type), by_type(&reverse, scenario_type));
    }
    assert_eq!(forward[0].scenario_type, ScenarioType::Optimistic);
    assert_eq!(reverse[0].scenario_type, ScenarioType::Pessimistic);
}

#[test]
fn invalid_config_fails_alone() {
    let ctx = ctr_context(dataset());
    let configs = vec![
        ScenarioConfig::named(ScenarioType::Realistic),
        ScenarioConfig::custom_percentile(150.0),
        ScenarioConfig::named(ScenarioType::Optimistic),
    ];
    let generator = ScenarioGenerator::default();

    let outcomes = generator.generate_each(&baseline(), &configs, &ctx, &ScenarioOptions::default());
    assert_eq!(outcomes.len(), 3);
    assert!(matches!(outcomes[1], Err(SimulationError::Validation(_))));
    let realistic = outcomes[0].as_ref().unwrap();
    let optimistic = outcomes[2].as_ref().unwrap();
    assert!((realistic.probability - 0.75).abs() < 1e-9);
    assert!((optimistic.probability - 0.25).abs() < 1e-9);

    assert!(generator
        .generate_scenarios(&baseline(), &configs, &ctx, &ScenarioOptions::default())
        .is_err());
}

#[test]
fn negative_adjustment_multiplier_is_rejected() {
    let ctx = ctr_context(dataset());
    let configs = vec![ScenarioConfig::custom_adjustments(vec![adjustment(
        "budget", -0.5, 0, 5,
    )])];

    let result = ScenarioGenerator::default().generate_scenarios(
        &baseline(),
        &configs,
        &ctx,
        &ScenarioOptions::default(),
    );

    assert!(matches!(result, Err(SimulationError::Validation(_))));
}

#[test]
fn wider_configured_spread_moves_tails_further() {
    let ctx = ctr_context(dataset());
    let narrow = ScenarioGenerator::default();
    let wide = ScenarioGenerator::new(ScenarioSettings {
        spread: 0.4,
        ..ScenarioSettings::default()
    });
    let configs = named(&[ScenarioType::Pessimistic]);
    let options = ScenarioOptions::default();

    let narrow = narrow
        .generate_scenarios(&baseline(), &configs, &ctx, &options)
        .unwrap();
    let wide = wide
        .generate_scenarios(&baseline(), &configs, &ctx, &options)
        .unwrap();

    assert!(mean_metric(&wide[0].trajectory, "ctr") < mean_metric(&narrow[0].trajectory, "ctr"));
}
