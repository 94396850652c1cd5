pub mod synthesizer;

use serde::{Deserialize, Serialize};

use crate::risk::RiskType;
use crate::scenario::ScenarioType;

pub use synthesizer::RecommendationSynthesizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotType {
    CreativeRefresh,
    AudienceRetargeting,
    ConversionOptimization,
    BidOptimization,
    CompetitiveRepositioning,
    BudgetReallocation,
    ScaleOpportunity,
    ContingencyPlan,
}

impl PivotType {
    pub fn label(self) -> &'static str {
        match self {
            PivotType::CreativeRefresh => "creative refresh",
            PivotType::AudienceRetargeting => "audience retargeting",
            PivotType::ConversionOptimization => "conversion optimization",
            PivotType::BidOptimization => "bid optimization",
            PivotType::CompetitiveRepositioning => "competitive repositioning",
            PivotType::BudgetReallocation => "budget reallocation",
            PivotType::ScaleOpportunity => "scale opportunity",
            PivotType::ContingencyPlan => "contingency plan",
        }
    }

    pub fn effort(self) -> Effort {
        match self {
            PivotType::BidOptimization
            | PivotType::BudgetReallocation
            | PivotType::ContingencyPlan => Effort::Low,
            PivotType::CreativeRefresh
            | PivotType::AudienceRetargeting
            | PivotType::ScaleOpportunity => Effort::Medium,
            PivotType::ConversionOptimization | PivotType::CompetitiveRepositioning => Effort::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendationSource {
    Risk {
        risk_type: RiskType,
        subject: Option<String>,
    },
    Scenario {
        scenario_type: ScenarioType,
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEstimate {
    pub metric: String,
    pub improvement: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Implementation {
    pub description: String,
    pub steps: Vec<String>,
    pub effort: Effort,
    pub timeline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRecommendation {
    pub id: String,
    #[serde(rename = "type")]
    pub pivot_type: PivotType,
    pub priority: u8,
    pub source: RecommendationSource,
    pub impact_estimate: ImpactEstimate,
    pub implementation: Implementation,
}
