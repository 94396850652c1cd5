use campaign_sim::forecast::fit_linear;
use campaign_sim::scenario::{normal_quantile, percentile_multiplier};

#[test]
fn linear_fit_recovers_slope_and_intercept() {
    let samples: Vec<(f64, f64)> = (0..10).map(|x| (x as f64, 3.0 + 0.5 * x as f64)).collect();

    let fit = fit_linear(&samples).unwrap();

    assert!((fit.slope - 0.5).abs() < 1e-12);
    assert!((fit.intercept - 3.0).abs() < 1e-12);
    assert!((fit.r_squared - 1.0).abs() < 1e-12);
    assert!((fit.at(20.0) - 13.0).abs() < 1e-9);
}

#[test]
fn linear_fit_needs_distinct_x_values() {
    assert!(fit_linear(&[(1.0, 2.0)]).is_none());
    assert!(fit_linear(&[(1.0, 2.0), (1.0, 4.0)]).is_none());
}

#[test]
fn noisy_samples_lower_r_squared() {
    let samples = [(0.0, 1.0), (1.0, 3.0), (2.0, 1.5), (3.0, 4.0), (4.0, 2.0)];

    let fit = fit_linear(&samples).unwrap();

    assert!(fit.r_squared > 0.0 && fit.r_squared < 1.0);
}

#[test]
fn quantiles_match_the_standard_normal() {
    assert_eq!(normal_quantile(50.0), Some(0.0));
    assert!((normal_quantile(97.5).unwrap() - 1.959964).abs() < 1e-5);
    assert!((normal_quantile(25.0).unwrap() + normal_quantile(75.0).unwrap()).abs() < 1e-9);
    assert!(normal_quantile(f64::NAN).is_none());
}

#[test]
fn extreme_percentiles_stay_finite() {
    let top = normal_quantile(100.0).unwrap();
    let bottom = normal_quantile(0.0).unwrap();

    assert!(top.is_finite() && top > 2.5);
    assert!(bottom.is_finite() && bottom < -2.5);
}

#[test]
fn multipliers_never_go_negative() {
    assert!((percentile_multiplier(0.0, 0.15, 1.0) - 1.0).abs() < 1e-12);
    assert!(percentile_multiplier(1.0, 0.15, 1.0) > 1.0);
    assert_eq!(percentile_multiplier(-3.0, 0.5, 1.0), 0.0);
}
