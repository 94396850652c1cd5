use tracing::{debug, info};

use crate::config::SynthesisConfig;
use crate::model::{relative_weights, MetricKind, MetricMap, SimulationContext, TrajectoryPoint};
use crate::recommend::{
    ImpactEstimate, Implementation, PivotRecommendation, PivotType, RecommendationSource,
};
use crate::risk::{RiskAlert, RiskType, Severity};
use crate::scenario::{ScenarioResult, ScenarioType};
use crate::stable_hash64;

const MAX_PRIORITY: f64 = 10.0;

#[derive(Debug, Clone, Default)]
pub struct RecommendationSynthesizer {
    config: SynthesisConfig,
}

impl RecommendationSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    /// Highest priority first. Inputs are only read. Scenario deltas are measured against
    /// the realistic scenario, or the probability-weighted outlook when there is none.
    pub fn synthesize(
        &self,
        risks: &[RiskAlert],
        scenarios: &[ScenarioResult],
        context: &SimulationContext,
    ) -> Vec<PivotRecommendation> {
        self.synthesize_against(risks, scenarios, None, context)
    }

    /// Like [`synthesize`](Self::synthesize), with the baseline forecast as the fallback
    /// reference when no realistic scenario was generated.
    pub fn synthesize_against(
        &self,
        risks: &[RiskAlert],
        scenarios: &[ScenarioResult],
        baseline: Option<&[TrajectoryPoint]>,
        context: &SimulationContext,
    ) -> Vec<PivotRecommendation> {
        let mut recommendations: Vec<PivotRecommendation> = risks
            .iter()
            .filter(|risk| risk.severity >= self.config.min_severity)
            .map(|risk| self.from_risk(risk, context))
            .collect();

        if let Some(reference) = Reference::resolve(scenarios, baseline, context) {
            debug!(reference = reference.label, "scenario reference selected");
            for (index, scenario) in scenarios.iter().enumerate() {
                if let Some(recommendation) = self.from_scenario(index, scenario, &reference, context) {
                    recommendations.push(recommendation);
                }
            }
        }

        recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
        info!(
            simulation_id = %context.simulation_id,
            risks = risks.len(),
            scenarios = scenarios.len(),
            recommendations = recommendations.len(),
            "recommendations synthesized"
        );
        recommendations
    }

    fn from_risk(&self, risk: &RiskAlert, context: &SimulationContext) -> PivotRecommendation {
        let metric = match risk.risk_type {
            RiskType::PerformanceDip | RiskType::AudienceFatigue => risk
                .subject
                .clone()
                .unwrap_or_else(|| primary_metric(context)),
            RiskType::CompetitorThreat | RiskType::BudgetOverrun => primary_metric(context),
        };
        let pivot_type = match risk.risk_type {
            RiskType::PerformanceDip => match MetricKind::classify(&metric) {
                MetricKind::Engagement => PivotType::CreativeRefresh,
                MetricKind::Conversion => PivotType::ConversionOptimization,
                MetricKind::Reach | MetricKind::Other => PivotType::AudienceRetargeting,
                MetricKind::Cost => PivotType::BidOptimization,
            },
            RiskType::AudienceFatigue => PivotType::CreativeRefresh,
            RiskType::CompetitorThreat => PivotType::CompetitiveRepositioning,
            RiskType::BudgetOverrun => PivotType::BudgetReallocation,
        };
        let recovery_share = match risk.risk_type {
            RiskType::PerformanceDip => 0.5,
            RiskType::AudienceFatigue => 0.6,
            RiskType::CompetitorThreat => 0.3,
            RiskType::BudgetOverrun => 0.4,
        };

        let base = match risk.severity {
            Severity::Critical => 8.0,
            Severity::High => 6.0,
            Severity::Medium => 4.0,
            Severity::Low => 2.0,
        };
        let priority = clamp_priority(base + (2.0 * risk.probability).round());

        let mut steps = risk.recommendations.clone();
        steps.push(format!(
            "Measure {} for seven days after the change and compare it against the forecast.",
            metric
        ));

        let key = format!(
            "risk:{}:{}:{}",
            risk.risk_type.label(),
            risk.subject.as_deref().unwrap_or("-"),
            risk.timeframe.start.timestamp()
        );
        debug!(%key, priority, "risk recommendation");

        PivotRecommendation {
            id: recommendation_id(&context.simulation_id, &key),
            pivot_type,
            priority,
            source: RecommendationSource::Risk {
                risk_type: risk.risk_type,
                subject: risk.subject.clone(),
            },
            impact_estimate: ImpactEstimate {
                metric,
                improvement: (risk.impact * recovery_share).clamp(0.01, 0.5),
                confidence: (risk.confidence * 0.8).clamp(0.01, 1.0),
            },
            implementation: Implementation {
                description: format!("Apply a {} in response: {}", pivot_type.label(), risk.description),
                steps,
                effort: pivot_type.effort(),
                timeline: timeline_for(risk.severity).to_string(),
            },
        }
    }

    fn from_scenario(
        &self,
        index: usize,
        scenario: &ScenarioResult,
        reference: &Reference,
        context: &SimulationContext,
    ) -> Option<PivotRecommendation> {
        if scenario.probability < self.config.min_scenario_probability {
            return None;
        }
        let (delta, metric, metric_delta) = scenario_delta(scenario, reference, context)?;

        let pivot_type = match scenario.scenario_type {
            ScenarioType::Optimistic | ScenarioType::Custom
                if delta >= self.config.opportunity_threshold =>
            {
                PivotType::ScaleOpportunity
            }
            ScenarioType::Pessimistic if delta <= -self.config.downside_threshold => {
                PivotType::ContingencyPlan
            }
            _ => return None,
        };

        let weight = 0.5 + scenario.probability;
        let (priority, improvement, steps, timeline, description) = match pivot_type {
            PivotType::ScaleOpportunity => {
                let mut steps: Vec<String> = scenario
                    .key_factors
                    .iter()
                    .filter_map(|factor| factor.strip_suffix("_adjustment"))
                    .map(|factor| {
                        format!(
                            "Apply the {} change modeled in this scenario during its planned window.",
                            factor
                        )
                    })
                    .collect();
                steps.push(format!(
                    "Increase budget gradually in 10-20% steps while monitoring {}.",
                    metric
                ));
                steps.push(format!(
                    "Set a checkpoint to compare realized {} against the {} scenario.",
                    metric, scenario.name
                ));
                (
                    clamp_priority((delta * 10.0 * weight).round()).clamp(1, 7),
                    metric_delta.max(delta),
                    steps,
                    "Within 2 weeks",
                    format!(
                        "The {} scenario outperforms the {} by {:.1}% on weighted metrics",
                        scenario.name,
                        reference.label,
                        delta * 100.0
                    ),
                )
            }
            _ => (
                clamp_priority((delta.abs() * 10.0 * weight).round()).clamp(1, 6),
                delta.abs() * 0.5,
                vec![
                    format!(
                        "Define early-warning thresholds for {} based on the pessimistic trajectory.",
                        metric
                    ),
                    "Prepare backup creative and audience sets ready to launch.".to_string(),
                    "Pre-approve budget shifts to protect the best-performing channels.".to_string(),
                ],
                "Within 1 week",
                format!(
                    "The {} scenario trails the {} by {:.1}% on weighted metrics",
                    scenario.name,
                    reference.label,
                    delta.abs() * 100.0
                ),
            ),
        };

        let key = format!("scenario:{}:{}:{}", index, scenario.scenario_type.label(), scenario.name);
        debug!(%key, priority, delta, "scenario recommendation");

        Some(PivotRecommendation {
            id: recommendation_id(&context.simulation_id, &key),
            pivot_type,
            priority,
            source: RecommendationSource::Scenario {
                scenario_type: scenario.scenario_type,
                name: scenario.name.clone(),
            },
            impact_estimate: ImpactEstimate {
                metric,
                improvement,
                confidence: scenario.confidence,
            },
            implementation: Implementation {
                description,
                steps,
                effort: pivot_type.effort(),
                timeline: timeline.to_string(),
            },
        })
    }
}

/// Per-metric means every scenario is compared with.
struct Reference {
    label: &'static str,
    means: MetricMap,
}

impl Reference {
    fn resolve(
        scenarios: &[ScenarioResult],
        baseline: Option<&[TrajectoryPoint]>,
        context: &SimulationContext,
    ) -> Option<Self> {
        let metrics = context.request.metrics.iter().map(|spec| spec.metric.as_str());

        if let Some(realistic) = scenarios
            .iter()
            .find(|scenario| scenario.scenario_type == ScenarioType::Realistic)
        {
            let means = metrics
                .filter_map(|metric| realistic.metric_mean(metric).map(|mean| (metric.to_string(), mean)))
                .collect();
            return Some(Self {
                label: "realistic outlook",
                means,
            });
        }

        if let Some(points) = baseline.filter(|points| !points.is_empty()) {
            let means = metrics
                .filter_map(|metric| trajectory_mean(points, metric).map(|mean| (metric.to_string(), mean)))
                .collect();
            return Some(Self {
                label: "baseline forecast",
                means,
            });
        }

        let total: f64 = scenarios.iter().map(|scenario| scenario.probability).sum();
        if scenarios.len() < 2 || total <= 0.0 {
            return None;
        }
        let mut means = MetricMap::new();
        for metric in metrics {
            let mut weighted: f64 = 0.0;
            let mut covered: f64 = 0.0;
            for scenario in scenarios {
                if let Some(mean) = scenario.metric_mean(metric) {
                    weighted += mean * scenario.probability;
                    covered += scenario.probability;
                }
            }
            if covered > 0.0 {
                means.insert(metric.to_string(), weighted / covered);
            }
        }
        Some(Self {
            label: "expected outlook",
            means,
        })
    }
}

fn trajectory_mean(points: &[TrajectoryPoint], metric: &str) -> Option<f64> {
    let values: Vec<f64> = points.iter().filter_map(|point| point.metric(metric)).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Weighted relative difference of metric means against the reference, plus the
/// metric that moved most in the direction of the overall delta.
fn scenario_delta(
    scenario: &ScenarioResult,
    reference: &Reference,
    context: &SimulationContext,
) -> Option<(f64, String, f64)> {
    let weights = relative_weights(&context.request.metrics);
    let mut weighted: f64 = 0.0;
    let mut weight_total: f64 = 0.0;
    let mut per_metric = Vec::new();
    for (spec, weight) in context.request.metrics.iter().zip(weights) {
        let (Some(value), Some(base)) = (
            scenario.metric_mean(&spec.metric),
            reference.means.get(&spec.metric).copied(),
        ) else {
            continue;
        };
        if base <= 0.0 {
            continue;
        }
        let delta = value / base - 1.0;
        weighted += delta * weight;
        weight_total += weight;
        per_metric.push((spec.metric.clone(), delta));
    }
    if weight_total <= 0.0 {
        return None;
    }
    let delta = weighted / weight_total;
    let (metric, metric_delta) = per_metric
        .into_iter()
        .max_by(|a, b| (a.1 * delta.signum()).total_cmp(&(b.1 * delta.signum())))?;
    Some((delta, metric, metric_delta))
}

fn primary_metric(context: &SimulationContext) -> String {
    let mut best: Option<(&str, f64)> = None;
    for spec in &context.request.metrics {
        if best.map(|(_, weight)| spec.weight > weight).unwrap_or(true) {
            best = Some((spec.metric.as_str(), spec.weight));
        }
    }
    best.map(|(metric, _)| metric.to_string())
        .unwrap_or_else(|| "performance".to_string())
}

fn timeline_for(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "Within 3 days",
        Severity::High => "Within 1 week",
        Severity::Medium => "Within 2 weeks",
        Severity::Low => "Next planning cycle",
    }
}

fn clamp_priority(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, MAX_PRIORITY) as u8
}

fn recommendation_id(simulation_id: &str, key: &str) -> String {
    format!("rec_{:x}", stable_hash64(&format!("{}:{}", simulation_id, key)))
}
