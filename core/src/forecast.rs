//! Shortage forecast and restock recommendation, derived from 30-day
//! consumption averages.

use crate::{
    clock::EngineClock,
    config::RiskConfig,
    error::EngineResult,
    store::RationStore,
    types::{Commodity, ShopId},
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Sentinel for "no depletion data": positive average never produces it,
/// and zero stock reports days_left 0 instead (the stock/30 fallback
/// bottoms out at 1, so a division guard can't mask an empty shelf).
pub const NO_DEPLETION_DATA: i64 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastTier {
    Critical,
    Warning,
    Normal,
}

impl ForecastTier {
    fn for_days_left(days_left: i64) -> Self {
        if days_left < 7 {
            ForecastTier::Critical
        } else if days_left < 14 {
            ForecastTier::Warning
        } else {
            ForecastTier::Normal
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommodityForecast {
    pub current_stock: f64,
    /// Average daily distribution over the window, rounded to 2 dp.
    pub avg_daily_distribution: f64,
    pub days_left: i64,
    pub alert: ForecastTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShortageForecast {
    pub shop_id: ShopId,
    pub shop_name: String,
    pub forecasts: BTreeMap<Commodity, CommodityForecast>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommodityRestock {
    pub projected_demand_30d: i64,
    pub current_stock: f64,
    pub recommended_dispatch: i64,
    pub urgency: ForecastTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestockPlan {
    pub shop_id: ShopId,
    pub shop_name: String,
    pub recommendations: BTreeMap<Commodity, CommodityRestock>,
}

/// Per-commodity depletion forecast for one shop; None if the shop is
/// unknown.
pub fn shortage_forecast(
    store: &RationStore,
    clock: &EngineClock,
    config: &RiskConfig,
    shop_id: ShopId,
) -> EngineResult<Option<ShortageForecast>> {
    let Some(shop) = store.get_shop(shop_id)? else {
        return Ok(None);
    };

    let cutoff = clock.cutoff_days_ago(config.forecast_window_days);
    let stats = store.consumption_since(shop_id, &cutoff)?;

    let mut forecasts = BTreeMap::new();
    for commodity in Commodity::ALL {
        let stock = shop.stock(commodity);
        let stat = stats.iter().find(|s| s.item == commodity);
        let avg_daily = match stat {
            Some(s) if s.active_days > 0 => s.total_quantity / s.active_days as f64,
            // No sales in the window: assume the shelf drains over a full
            // window, with a floor of 1 so zero stock still forecasts zero
            // days rather than the no-data sentinel.
            _ => {
                if stock > 0.0 {
                    stock / config.forecast_window_days as f64
                } else {
                    1.0
                }
            }
        };
        let days_left = if avg_daily > 0.0 {
            (stock / avg_daily).round() as i64
        } else {
            NO_DEPLETION_DATA
        };
        forecasts.insert(
            commodity,
            CommodityForecast {
                current_stock: stock,
                avg_daily_distribution: (avg_daily * 100.0).round() / 100.0,
                days_left,
                alert: ForecastTier::for_days_left(days_left),
            },
        );
    }

    Ok(Some(ShortageForecast {
        shop_id,
        shop_name: shop.name,
        forecasts,
    }))
}

/// Dispatch plan covering projected 30-day demand plus the safety buffer.
pub fn restock_recommendation(
    store: &RationStore,
    clock: &EngineClock,
    config: &RiskConfig,
    shop_id: ShopId,
) -> EngineResult<Option<RestockPlan>> {
    let Some(forecast) = shortage_forecast(store, clock, config, shop_id)? else {
        return Ok(None);
    };

    let mut recommendations = BTreeMap::new();
    for (commodity, data) in &forecast.forecasts {
        let projected_demand = data.avg_daily_distribution * 30.0;
        let buffer = projected_demand * config.restock_buffer;
        let dispatch = (projected_demand - data.current_stock + buffer).round() as i64;
        recommendations.insert(
            *commodity,
            CommodityRestock {
                projected_demand_30d: projected_demand.round() as i64,
                current_stock: data.current_stock,
                recommended_dispatch: dispatch.max(0),
                urgency: data.alert,
            },
        );
    }

    Ok(Some(RestockPlan {
        shop_id,
        shop_name: forecast.shop_name,
        recommendations,
    }))
}
