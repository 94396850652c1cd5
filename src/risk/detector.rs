use tracing::info;

use crate::model::{SimulationContext, TrajectoryPoint};
use crate::risk::patterns::{
    detect_audience_fatigue, detect_budget_overrun, detect_competitor_threat, detect_performance_dip,
};
use crate::risk::ranking::{filter_by_confidence, rank_alerts};
use crate::risk::{RiskAlert, RiskThresholds, RiskType};

#[derive(Debug, Clone, Default)]
pub struct RiskDetector {
    thresholds: RiskThresholds,
}

impl RiskDetector {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Ranked alerts for one trajectory. `overrides` replaces the configured thresholds for this call.
    /// An empty list means nothing was found; detection itself cannot fail.
    pub fn detect_risks(
        &self,
        trajectory: &[TrajectoryPoint],
        context: &SimulationContext,
        overrides: Option<&RiskThresholds>,
    ) -> Vec<RiskAlert> {
        let thresholds = overrides.unwrap_or(&self.thresholds);

        let mut alerts = Vec::new();
        for risk_type in RiskType::ALL {
            let detected = match risk_type {
                RiskType::PerformanceDip => detect_performance_dip(trajectory, context, thresholds),
                RiskType::AudienceFatigue => detect_audience_fatigue(trajectory, context, thresholds),
                RiskType::CompetitorThreat => detect_competitor_threat(context, thresholds),
                RiskType::BudgetOverrun => detect_budget_overrun(context, thresholds),
            };
            alerts.extend(detected);
        }

        let detected = alerts.len();
        let mut alerts = filter_by_confidence(alerts, thresholds.confidence_threshold);
        rank_alerts(&mut alerts);

        info!(
            simulation_id = %context.simulation_id,
            points = trajectory.len(),
            detected,
            kept = alerts.len(),
            "risk detection finished"
        );
        alerts
    }
}
