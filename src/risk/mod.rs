pub mod detector;
pub mod patterns;
pub mod ranking;

use serde::{Deserialize, Serialize};

use crate::model::Timeframe;

pub use detector::RiskDetector;
pub use ranking::{filter_by_confidence, rank_alerts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskType {
    PerformanceDip,
    AudienceFatigue,
    CompetitorThreat,
    BudgetOverrun,
}

impl RiskType {
    /// Detection order; ties in ranking keep this order.
    pub const ALL: [RiskType; 4] = [
        RiskType::PerformanceDip,
        RiskType::AudienceFatigue,
        RiskType::CompetitorThreat,
        RiskType::BudgetOverrun,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RiskType::PerformanceDip => "performance_dip",
            RiskType::AudienceFatigue => "audience_fatigue",
            RiskType::CompetitorThreat => "competitor_threat",
            RiskType::BudgetOverrun => "budget_overrun",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn escalate(self) -> Self {
        match self {
            Severity::Low => Severity::Medium,
            Severity::Medium => Severity::High,
            Severity::High | Severity::Critical => Severity::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    #[serde(rename = "type")]
    pub risk_type: RiskType,
    pub severity: Severity,
    pub probability: f64,
    pub impact: f64,
    pub confidence: f64,
    pub timeframe: Timeframe,
    pub description: String,
    pub recommendations: Vec<String>,
    /// Metric, competitor or channel the alert is about.
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub performance_dip_threshold: f64,
    pub fatigue_threshold: f64,
    pub fatigue_window_fraction: f64,
    pub fatigue_front_load_ratio: f64,
    pub fatigue_frequency: f64,
    pub competitor_growth_threshold: f64,
    pub budget_utilization_threshold: f64,
    pub min_time_remaining: f64,
    pub confidence_threshold: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            performance_dip_threshold: 0.25,
            fatigue_threshold: 0.15,
            fatigue_window_fraction: 0.5,
            fatigue_front_load_ratio: 1.2,
            fatigue_frequency: 4.0,
            competitor_growth_threshold: 0.1,
            budget_utilization_threshold: 0.9,
            min_time_remaining: 0.1,
            confidence_threshold: 0.3,
        }
    }
}
