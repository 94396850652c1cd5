use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::format_percent;
use crate::model::{days_between, relative_weights, MetricKind, MetricSpec, SimulationContext, Timeframe, TrajectoryPoint};
use crate::risk::{RiskAlert, RiskThresholds, RiskType, Severity};

const MIN_PROBABILITY: f64 = 0.05;
const MIN_CONFIDENCE: f64 = 0.01;

struct SeriesPoint {
    date: DateTime<Utc>,
    value: f64,
    confidence: f64,
}

fn metric_series(trajectory: &[TrajectoryPoint], metric: &str) -> Vec<SeriesPoint> {
    trajectory
        .iter()
        .filter_map(|point| {
            point.metric(metric).map(|value| SeriesPoint {
                date: point.date,
                value,
                confidence: point.confidence,
            })
        })
        .collect()
}

fn mean_confidence(points: &[SeriesPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|point| point.confidence).sum::<f64>() / points.len() as f64
}

fn quality_factor(context: &SimulationContext) -> f64 {
    0.5 + 0.5 * context.data_quality()
}

/// Guarantees `end > start` even when input dates repeat.
fn bounded_timeframe(start: DateTime<Utc>, end: DateTime<Utc>) -> Timeframe {
    if end > start {
        Timeframe::new(start, end)
    } else {
        Timeframe::new(start, start + Duration::days(1))
    }
}

fn tracked_metrics(context: &SimulationContext) -> impl Iterator<Item = (&MetricSpec, f64)> {
    let weights = relative_weights(&context.request.metrics);
    context.request.metrics.iter().zip(weights)
}

pub fn detect_performance_dip(
    trajectory: &[TrajectoryPoint],
    context: &SimulationContext,
    thresholds: &RiskThresholds,
) -> Vec<RiskAlert> {
    let mut alerts = Vec::new();
    for (spec, weight) in tracked_metrics(context) {
        let series = metric_series(trajectory, &spec.metric);
        if let Some(alert) = performance_dip_for(spec, weight, &series, context, thresholds) {
            alerts.push(alert);
        }
    }
    alerts
}

fn performance_dip_for(
    spec: &MetricSpec,
    weight: f64,
    series: &[SeriesPoint],
    context: &SimulationContext,
    thresholds: &RiskThresholds,
) -> Option<RiskAlert> {
    if series.len() < 2 {
        return None;
    }
    let kind = spec.kind();
    let start = series[0].value;
    let deterioration: Vec<f64> = series
        .iter()
        .map(|point| kind.deterioration(start, point.value).unwrap_or(0.0))
        .collect();

    let mut worst = 1;
    for index in 2..series.len() {
        if deterioration[index] > deterioration[worst] {
            worst = index;
        }
    }
    let decline = deterioration[worst];
    if decline <= thresholds.performance_dip_threshold {
        return None;
    }
    let crossing = (1..=worst)
        .find(|index| deterioration[*index] > thresholds.performance_dip_threshold)
        .unwrap_or(worst);

    let severity = if decline >= 0.5 {
        Severity::Critical
    } else if decline >= 0.35 {
        Severity::High
    } else {
        Severity::Medium
    };

    let worsening_steps = (1..=worst)
        .filter(|index| {
            kind.deterioration(series[index - 1].value, series[*index].value)
                .map(|change| change > 0.0)
                .unwrap_or(false)
        })
        .count();
    let probability =
        (0.4 + 0.6 * worsening_steps as f64 / worst as f64).clamp(MIN_PROBABILITY, 1.0);
    let confidence =
        (mean_confidence(&series[..=worst]) * quality_factor(context)).clamp(MIN_CONFIDENCE, 1.0);

    let direction = if kind.lower_is_better() { "rise" } else { "decline" };
    let description = format!(
        "{} is projected to {} {} from {:.4} to {:.4} by {}",
        spec.metric,
        direction,
        format_percent(decline),
        start,
        series[worst].value,
        series[worst].date.format("%Y-%m-%d")
    );

    debug!(metric = %spec.metric, decline, ?severity, "performance dip detected");

    Some(RiskAlert {
        risk_type: RiskType::PerformanceDip,
        severity,
        probability,
        impact: decline * weight,
        confidence,
        timeframe: bounded_timeframe(series[crossing - 1].date, series[worst].date),
        description,
        recommendations: dip_recommendations(kind, &spec.metric),
        subject: Some(spec.metric.clone()),
    })
}

fn dip_recommendations(kind: MetricKind, metric: &str) -> Vec<String> {
    match kind {
        MetricKind::Engagement => vec![
            format!("Refresh ad creative for {} with new hooks and visuals.", metric),
            "Retest audience segments to find where engagement is holding up.".to_string(),
        ],
        MetricKind::Conversion => vec![
            "Audit the landing page and checkout flow for friction points.".to_string(),
            "Shift spend toward segments with the strongest recent conversion rates.".to_string(),
        ],
        MetricKind::Reach => vec![
            "Broaden targeting or raise bids to restore delivery volume.".to_string(),
            "Check placements and frequency caps that may be limiting reach.".to_string(),
        ],
        MetricKind::Cost => vec![
            "Review the bid strategy and pause placements with rising costs.".to_string(),
            "Improve relevance with tighter matching between ads and audiences.".to_string(),
        ],
        MetricKind::Other => vec![
            format!("Investigate the drivers behind the projected decline in {}.", metric),
            "Run a controlled test to validate corrective changes before scaling.".to_string(),
        ],
    }
}

pub fn detect_audience_fatigue(
    trajectory: &[TrajectoryPoint],
    context: &SimulationContext,
    thresholds: &RiskThresholds,
) -> Vec<RiskAlert> {
    let frequency = context
        .dataset
        .audience_insights
        .average_frequency
        .filter(|value| value.is_finite());
    let frequency_pressure = frequency
        .map(|value| value > thresholds.fatigue_frequency)
        .unwrap_or(false);

    let mut alerts = Vec::new();
    for (spec, weight) in tracked_metrics(context) {
        if spec.kind() != MetricKind::Engagement {
            continue;
        }
        let series = metric_series(trajectory, &spec.metric);
        if series.len() < 3 || series[0].value <= 0.0 {
            continue;
        }

        let last = series.len() - 1;
        let window_end = ((last as f64 * thresholds.fatigue_window_fraction).round() as usize)
            .clamp(1, last - 1);
        let start = series[0].value;
        let early_drop = (start - series[window_end].value) / start;
        let late_drop = (series[window_end].value - series[last].value) / start;
        let early_rate = early_drop / window_end as f64;
        let late_rate = late_drop / (last - window_end) as f64;
        let front_loaded =
            early_rate > 0.0 && early_rate >= thresholds.fatigue_front_load_ratio * late_rate.max(0.0);

        if early_drop <= thresholds.fatigue_threshold || !(front_loaded || frequency_pressure) {
            continue;
        }

        let mut severity = if early_drop >= 0.4 {
            Severity::High
        } else if early_drop >= 0.25 {
            Severity::Medium
        } else {
            Severity::Low
        };
        if front_loaded && frequency_pressure {
            severity = severity.escalate();
        }

        let mut probability: f64 = 0.5;
        if front_loaded {
            probability += 0.25;
        }
        if frequency_pressure {
            probability += 0.25;
        }
        let confidence = (mean_confidence(&series[..=window_end]) * quality_factor(context))
            .clamp(MIN_CONFIDENCE, 1.0);

        let window_days = days_between(series[0].date, series[window_end].date).round();
        let mut description = format!(
            "Engagement on {} drops {} within the first {} days",
            spec.metric,
            format_percent(early_drop),
            window_days
        );
        if let Some(frequency) = frequency.filter(|_| frequency_pressure) {
            description.push_str(&format!(
                " while average frequency sits at {:.1} exposures per user",
                frequency
            ));
        }

        debug!(metric = %spec.metric, early_drop, front_loaded, frequency_pressure, "audience fatigue detected");

        alerts.push(RiskAlert {
            risk_type: RiskType::AudienceFatigue,
            severity,
            probability: probability.clamp(MIN_PROBABILITY, 1.0),
            impact: early_drop * weight,
            confidence,
            timeframe: bounded_timeframe(series[0].date, series[window_end].date),
            description,
            recommendations: vec![
                "Introduce new creative variations to re-engage the existing audience.".to_string(),
                "Cap ad frequency per user to reduce repeated exposure.".to_string(),
                "Expand targeting to fresh lookalike or interest segments.".to_string(),
            ],
            subject: Some(spec.metric.clone()),
        });
    }
    alerts
}

/// Drops leading zero observations; growth is measured from the first positive one.
fn since_first_positive(values: Vec<f64>) -> Option<Vec<f64>> {
    let start = values.iter().position(|value| *value > 0.0)?;
    let tail = values[start..].to_vec();
    (tail.len() >= 2).then_some(tail)
}

pub fn detect_competitor_threat(
    context: &SimulationContext,
    thresholds: &RiskThresholds,
) -> Vec<RiskAlert> {
    let mut alerts = Vec::new();
    for (competitor, observations) in context.dataset.market_data.competitors() {
        if observations.len() < 2 {
            continue;
        }

        let spend = since_first_positive(observations.iter().map(|obs| obs.ad_spend).collect())
            .filter(|values| values[values.len() - 1] != values[0]);
        let impressions = observations
            .iter()
            .map(|obs| obs.impressions)
            .collect::<Option<Vec<f64>>>()
            .and_then(since_first_positive);
        let (signal, values) = match (spend, impressions) {
            (Some(values), _) => ("ad spend", values),
            (None, Some(values)) => ("impressions", values),
            (None, None) => continue,
        };
        if values.iter().any(|value| !value.is_finite()) {
            continue;
        }

        let first = values[0];
        let last = values[values.len() - 1];
        let growth = last / first - 1.0;
        let last_step_rising = last > values[values.len() - 2];
        if growth <= thresholds.competitor_growth_threshold || !last_step_rising {
            continue;
        }

        let steps = values.len() - 1;
        let rising = values.windows(2).filter(|pair| pair[1] > pair[0]).count();
        let severity = if growth >= 2.0 {
            Severity::Critical
        } else if growth >= 1.0 {
            Severity::High
        } else if growth >= 0.5 {
            Severity::Medium
        } else {
            Severity::Low
        };
        let probability = (0.3 + 0.7 * rising as f64 / steps as f64).clamp(MIN_PROBABILITY, 1.0);
        let coverage = (values.len() as f64 / 5.0).min(1.0);
        let confidence = ((0.5 + 0.5 * coverage) * quality_factor(context)).clamp(MIN_CONFIDENCE, 1.0);

        debug!(competitor, growth, signal, "competitor threat detected");

        alerts.push(RiskAlert {
            risk_type: RiskType::CompetitorThreat,
            severity,
            probability,
            impact: growth,
            confidence,
            timeframe: context.request.timeframe,
            description: format!(
                "Competitor {} increased {} {} across {} observations ({:.0} to {:.0})",
                competitor,
                signal,
                format_percent(growth),
                values.len(),
                first,
                last
            ),
            recommendations: vec![
                format!(
                    "Monitor {} bidding and creative activity daily for the next two weeks.",
                    competitor
                ),
                "Adjust bids on contested placements to protect impression share.".to_string(),
                "Differentiate messaging to emphasize unique value against competing offers."
                    .to_string(),
            ],
            subject: Some(competitor.to_string()),
        });
    }
    alerts
}

pub fn detect_budget_overrun(
    context: &SimulationContext,
    thresholds: &RiskThresholds,
) -> Vec<RiskAlert> {
    let campaign = &context.dataset.campaign;
    let request_window = context.request.timeframe;
    let campaign_start = campaign.start_date.unwrap_or(request_window.start);
    let campaign_end = campaign.end_date.unwrap_or(request_window.end);
    let total_days = days_between(campaign_start, campaign_end);
    if total_days <= 0.0 {
        return Vec::new();
    }

    let as_of = request_window.start;
    let remaining = (days_between(as_of, campaign_end) / total_days).clamp(0.0, 1.0);
    if remaining <= thresholds.min_time_remaining {
        return Vec::new();
    }
    let elapsed = (1.0 - remaining).max(0.05);

    let mut alerts = Vec::new();
    for allocation in &context.dataset.budget_allocation {
        let utilization = match allocation.utilization() {
            Some(value) if value > thresholds.budget_utilization_threshold => value,
            _ => continue,
        };
        let projected = utilization + utilization / elapsed * remaining;
        let severity = if utilization >= 1.0 {
            Severity::Critical
        } else if projected >= 1.5 {
            Severity::High
        } else {
            Severity::Medium
        };
        let overrun = (projected - 1.0).max(0.0);
        let probability = (0.5 + 0.5 * overrun.min(1.0)).clamp(MIN_PROBABILITY, 1.0);
        let confidence = (0.6 + 0.4 * context.data_quality()).clamp(MIN_CONFIDENCE, 1.0);

        debug!(channel = %allocation.channel, utilization, projected, "budget overrun detected");

        alerts.push(RiskAlert {
            risk_type: RiskType::BudgetOverrun,
            severity,
            probability,
            impact: overrun,
            confidence,
            timeframe: bounded_timeframe(as_of, campaign_end),
            description: format!(
                "Channel {} has spent {} of its allocated budget ({:.0} of {:.0}) with {} of the campaign remaining",
                allocation.channel,
                format_percent(utilization),
                allocation.spent,
                allocation.allocated,
                format_percent(remaining)
            ),
            recommendations: vec![
                format!(
                    "Tighten budget controls on {} with daily spend caps.",
                    allocation.channel
                ),
                "Reallocate remaining budget toward channels with lower cost per result."
                    .to_string(),
                "Review bid strategies to slow pacing until the campaign end date.".to_string(),
            ],
            subject: Some(allocation.channel.clone()),
        });
    }
    alerts
}
