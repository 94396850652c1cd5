use chrono::{DateTime, Utc};

use crate::config::ScenarioSettings;
use crate::model::SimulationContext;
use crate::scenario::ScenarioOptions;

/// Market conditions folded into every scenario of one request.
#[derive(Debug, Clone)]
pub struct MarketBlend<'a> {
    context: &'a SimulationContext,
    seasonal_weight: Option<f64>,
    competitive_pressure: Option<f64>,
    competition_weight: f64,
    volatility: f64,
}

impl<'a> MarketBlend<'a> {
    pub fn from_context(
        context: &'a SimulationContext,
        options: &ScenarioOptions,
        settings: &ScenarioSettings,
    ) -> Option<Self> {
        if !options.include_market_factors {
            return None;
        }
        let market = &context.dataset.market_data;

        let seasonal_weight = (options.include_seasonality && !market.seasonal_trends.is_empty())
            .then_some(settings.seasonal_weight);
        let competitive_pressure = if options.include_competition {
            competitor_spend_growth(context).map(|growth| growth.clamp(0.0, 1.0))
        } else {
            None
        };

        Some(Self {
            context,
            seasonal_weight,
            competitive_pressure,
            competition_weight: settings.competition_weight,
            volatility: market.volatility_clamped(),
        })
    }

    /// Scenario spread widens with market volatility.
    pub fn spread_scale(&self) -> f64 {
        1.0 + self.volatility
    }

    pub fn factor(&self, date: DateTime<Utc>, progress: f64) -> f64 {
        let mut factor: f64 = 1.0;
        if let Some(weight) = self.seasonal_weight {
            let index = self.context.dataset.market_data.seasonal_index(date);
            factor *= (1.0 + weight * (index - 1.0)).max(0.0);
        }
        if let Some(pressure) = self.competitive_pressure {
            factor *= (1.0 - self.competition_weight * pressure * progress).max(0.0);
        }
        factor
    }

    pub fn key_factors(&self) -> Vec<String> {
        let mut factors = vec!["market".to_string()];
        if self.seasonal_weight.is_some() {
            factors.push("seasonal".to_string());
        }
        if self.competitive_pressure.is_some() {
            factors.push("competitive".to_string());
        }
        factors
    }
}

/// Aggregate ad-spend growth from each competitor's first to last observation.
fn competitor_spend_growth(context: &SimulationContext) -> Option<f64> {
    let mut first_total: f64 = 0.0;
    let mut last_total: f64 = 0.0;
    for observations in context.dataset.market_data.competitors().values() {
        if let (Some(first), Some(last)) = (observations.first(), observations.last()) {
            if observations.len() >= 2 {
                first_total += first.ad_spend;
                last_total += last.ad_spend;
            }
        }
    }
    if first_total > 0.0 && last_total.is_finite() {
        Some(last_total / first_total - 1.0)
    } else {
        None
    }
}
