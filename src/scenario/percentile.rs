use statrs::distribution::{ContinuousCDF, Normal};

pub const MIN_PERCENTILE: f64 = 0.5;
pub const MAX_PERCENTILE: f64 = 99.5;

/// Standard normal quantile for a 0-100 percentile, clamped away from the infinite tails.
pub fn normal_quantile(percentile: f64) -> Option<f64> {
    if !percentile.is_finite() {
        return None;
    }
    let percentile = percentile.clamp(MIN_PERCENTILE, MAX_PERCENTILE);
    if (percentile - 50.0).abs() < f64::EPSILON {
        return Some(0.0);
    }
    let normal = Normal::new(0.0, 1.0).ok()?;
    let z = normal.inverse_cdf(percentile / 100.0);
    if z.is_finite() {
        Some(z)
    } else {
        None
    }
}

/// Uncertainty widens with distance into the forecast: half the spread at the first point, full at the last.
pub fn horizon_factor(index: usize, len: usize) -> f64 {
    if len <= 1 {
        return 1.0;
    }
    0.5 + 0.5 * index as f64 / (len - 1) as f64
}

pub fn percentile_multiplier(z: f64, spread: f64, horizon: f64) -> f64 {
    (1.0 + spread * z * horizon).max(0.0)
}
