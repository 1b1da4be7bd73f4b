//! Warehouse risk score — damage ratio with a hard compliance kink plus a
//! closing-stock reconciliation signal.

use crate::{
    config::RiskConfig,
    error::EngineResult,
    store::RationStore,
    types::{Commodity, WarehouseId},
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct WarehouseRiskReport {
    pub warehouse_id: WarehouseId,
    pub risk_score: i64,
    /// Percent of received stock reported damaged, rounded to 2 dp.
    pub damage_ratio: f64,
}

/// Recompute and persist a warehouse's risk score.
///
/// The damage sub-score is sub-linear (ratio × 5) below the compliance
/// threshold and steep (ratio × 10, clamped to 100) above it. The mismatch
/// sub-score fires at 50 when aggregate closing stock and the per-commodity
/// reconciliation diverge beyond the tolerance band.
pub fn calculate_warehouse_risk(
    store: &RationStore,
    config: &RiskConfig,
    warehouse_id: WarehouseId,
) -> EngineResult<WarehouseRiskReport> {
    let Some(wh) = store.get_warehouse(warehouse_id)? else {
        return Ok(WarehouseRiskReport {
            warehouse_id,
            risk_score: 0,
            damage_ratio: 0.0,
        });
    };

    let mut total_received = 0.0;
    let mut total_dispatched = 0.0;
    let mut total_damaged = 0.0;
    let mut expected_closing = 0.0;
    for c in Commodity::ALL {
        total_received += wh.received(c);
        total_dispatched += wh.dispatched(c);
        total_damaged += wh.damaged(c);
        expected_closing += wh.received(c) - wh.dispatched(c) - wh.damaged(c);
    }
    let closing_stock = total_received - total_dispatched - total_damaged;

    let damage_ratio = if total_received > 0.0 {
        total_damaged / total_received * 100.0
    } else {
        0.0
    };
    let damage_score = if damage_ratio > config.damage_ratio_threshold {
        (damage_ratio * 10.0).min(100.0)
    } else {
        damage_ratio * 5.0
    };
    let mismatch_score = if (closing_stock - expected_closing).abs() > config.stock_mismatch_tolerance
    {
        50.0
    } else {
        0.0
    };

    let risk_score =
        ((damage_score * 0.6 + mismatch_score * 0.4).round() as i64).clamp(0, 100);
    store.set_warehouse_risk(warehouse_id, risk_score)?;
    log::debug!("warehouse {warehouse_id} risk recomputed: {risk_score}");

    Ok(WarehouseRiskReport {
        warehouse_id,
        risk_score,
        damage_ratio: (damage_ratio * 100.0).round() / 100.0,
    })
}
