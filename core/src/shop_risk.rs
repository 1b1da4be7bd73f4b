//! Shop risk score — the weighted 0–100 integrity rating.
//!
//! Two distinct code paths touch a shop's stored score and must not be
//! conflated:
//!   - the base recompute here, which rebuilds the score from the violation
//!     counters and OVERWRITES the stored value, and
//!   - the additive extended triggers (`extended` module), which add a
//!     bounded delta through `RationStore::bump_shop_risk`.

use crate::{
    config::RiskConfig,
    error::EngineResult,
    store::RationStore,
    types::ShopId,
    warehouse_risk,
};
use serde::Serialize;

/// Fixed convex weights over the seven sub-scores. Process-wide constant;
/// scoring calls never mutate it.
#[derive(Debug, Clone, Copy)]
pub struct RiskWeights {
    pub stock_mismatch: f64,
    pub artificial_stockout: f64,
    pub price_violations: f64,
    pub after_hours: f64,
    pub damage_anomalies: f64,
    pub complaint_frequency: f64,
    pub partial_allocation: f64,
}

pub const WEIGHTS: RiskWeights = RiskWeights {
    stock_mismatch: 0.20,
    artificial_stockout: 0.20,
    price_violations: 0.15,
    after_hours: 0.10,
    damage_anomalies: 0.10,
    complaint_frequency: 0.10,
    partial_allocation: 0.15,
};

impl RiskWeights {
    pub fn sum(&self) -> f64 {
        self.stock_mismatch
            + self.artificial_stockout
            + self.price_violations
            + self.after_hours
            + self.damage_anomalies
            + self.complaint_frequency
            + self.partial_allocation
    }
}

/// Weighted contribution of each factor, rounded per-factor for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RiskBreakdown {
    pub stock_mismatch: i64,
    pub artificial_stockout: i64,
    pub price_violations: i64,
    pub after_hours: i64,
    pub damage_anomalies: i64,
    pub complaint_frequency: i64,
    pub partial_allocation: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShopRiskReport {
    pub shop_id: ShopId,
    pub risk_score: i64,
    pub breakdown: RiskBreakdown,
}

/// Saturating linear map onto the 0–100 sub-score scale. Clamping before
/// weighting keeps a runaway counter from dominating the total.
fn sub_score(raw: f64) -> f64 {
    raw.min(100.0)
}

/// Recompute and persist a shop's risk score from its stored counters.
///
/// Unknown shops yield a zero score and an all-zero breakdown rather than
/// an error; callers check for the sentinel.
pub fn calculate_shop_risk(store: &RationStore, shop_id: ShopId) -> EngineResult<ShopRiskReport> {
    let Some(shop) = store.get_shop(shop_id)? else {
        return Ok(ShopRiskReport {
            shop_id,
            risk_score: 0,
            breakdown: RiskBreakdown::default(),
        });
    };

    // Floor of 1 guards the price-violation ratio against division by zero.
    let tx_count = store.sale_count(shop_id)?.max(1) as f64;
    let complaint_count = store.complaint_count(shop_id)? as f64;

    let stock_mismatch = sub_score(shop.stock_out_flags as f64 * 20.0);
    let artificial_stockout = sub_score(shop.stock_out_flags as f64 * 25.0);
    let price_violations = sub_score(shop.price_violation_flags as f64 / tx_count * 500.0);
    let after_hours = sub_score(shop.afterhours_flags as f64 * 25.0);
    let damage_anomalies = sub_score(shop.damage_claims as f64 * 20.0);
    let complaint_frequency = sub_score(complaint_count * 15.0);
    let partial_allocation = sub_score(shop.partial_alloc_flags as f64 * 20.0);

    let total = stock_mismatch * WEIGHTS.stock_mismatch
        + artificial_stockout * WEIGHTS.artificial_stockout
        + price_violations * WEIGHTS.price_violations
        + after_hours * WEIGHTS.after_hours
        + damage_anomalies * WEIGHTS.damage_anomalies
        + complaint_frequency * WEIGHTS.complaint_frequency
        + partial_allocation * WEIGHTS.partial_allocation;

    let risk_score = (total.round() as i64).clamp(0, 100);
    store.set_shop_risk(shop_id, risk_score)?;
    log::debug!("shop {shop_id} risk recomputed: {risk_score}");

    let weighted = |raw: f64, weight: f64| (raw * weight).round() as i64;
    Ok(ShopRiskReport {
        shop_id,
        risk_score,
        breakdown: RiskBreakdown {
            stock_mismatch: weighted(stock_mismatch, WEIGHTS.stock_mismatch),
            artificial_stockout: weighted(artificial_stockout, WEIGHTS.artificial_stockout),
            price_violations: weighted(price_violations, WEIGHTS.price_violations),
            after_hours: weighted(after_hours, WEIGHTS.after_hours),
            damage_anomalies: weighted(damage_anomalies, WEIGHTS.damage_anomalies),
            complaint_frequency: weighted(complaint_frequency, WEIGHTS.complaint_frequency),
            partial_allocation: weighted(partial_allocation, WEIGHTS.partial_allocation),
        },
    })
}

/// Recompute every shop and warehouse score. The caller owns persistence
/// of anything beyond the score columns themselves.
pub fn recalculate_all_scores(store: &RationStore, config: &RiskConfig) -> EngineResult<()> {
    for shop_id in store.all_shop_ids()? {
        calculate_shop_risk(store, shop_id)?;
    }
    for warehouse_id in store.all_warehouse_ids()? {
        warehouse_risk::calculate_warehouse_risk(store, config, warehouse_id)?;
    }
    Ok(())
}
