use std::cmp::Ordering;

use crate::risk::RiskAlert;

/// Severity, then impact, then probability, all descending. The sort is stable,
/// so equal alerts keep their detection order.
pub fn rank_alerts(alerts: &mut [RiskAlert]) {
    alerts.sort_by(compare_alerts);
}

pub fn compare_alerts(a: &RiskAlert, b: &RiskAlert) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| b.impact.total_cmp(&a.impact))
        .then_with(|| b.probability.total_cmp(&a.probability))
}

pub fn filter_by_confidence(alerts: Vec<RiskAlert>, threshold: f64) -> Vec<RiskAlert> {
    alerts
        .into_iter()
        .filter(|alert| alert.confidence >= threshold)
        .collect()
}
