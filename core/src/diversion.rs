//! Diversion Probability Index — read-only fraud-likelihood analytic.
//!
//! Unlike the persisted shop risk score this is an UNWEIGHTED arithmetic
//! mean of six raw factors and is never written back to the shop row.

use crate::{error::EngineResult, store::RationStore, types::ShopId};
use serde::Serialize;

/// Complaint category the external classifier assigns to explicit
/// diversion reports.
pub const DIVERSION_CATEGORY: &str = "diversion_alert";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiversionLevel {
    High,
    Medium,
    Low,
}

impl DiversionLevel {
    fn for_index(dpi: i64) -> Self {
        if dpi > 60 {
            DiversionLevel::High
        } else if dpi > 30 {
            DiversionLevel::Medium
        } else {
            DiversionLevel::Low
        }
    }
}

/// Raw (unclamped) factor values entering the mean.
#[derive(Debug, Clone, Serialize)]
pub struct DiversionFactors {
    pub partial_collection_anomaly: f64,
    pub artificial_stockout: f64,
    pub complaint_frequency: f64,
    pub price_violation_ratio: f64,
    pub damage_claim_excess: f64,
    pub diversion_reports: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiversionReport {
    pub shop_id: ShopId,
    pub shop_name: String,
    pub district: String,
    pub diversion_probability: i64,
    pub level: DiversionLevel,
    pub factors: DiversionFactors,
}

pub fn diversion_probability_index(
    store: &RationStore,
    shop_id: ShopId,
) -> EngineResult<Option<DiversionReport>> {
    let Some(shop) = store.get_shop(shop_id)? else {
        return Ok(None);
    };

    let complaint_count = store.complaint_count(shop_id)?;
    let diversion_reports = store.complaint_count_in_category(shop_id, DIVERSION_CATEGORY)?;
    let violating_sales = store.violating_sale_count(shop_id)?;
    let total_sales = store.sale_count(shop_id)?.max(1);

    let factors = DiversionFactors {
        partial_collection_anomaly: shop.partial_alloc_flags as f64 * 12.0,
        artificial_stockout: shop.stock_out_flags as f64 * 15.0,
        complaint_frequency: complaint_count as f64 * 8.0,
        price_violation_ratio: violating_sales as f64 / total_sales as f64 * 100.0,
        damage_claim_excess: shop.damage_claims as f64 * 10.0,
        diversion_reports: diversion_reports as f64 * 20.0,
    };

    let sum = factors.partial_collection_anomaly
        + factors.artificial_stockout
        + factors.complaint_frequency
        + factors.price_violation_ratio
        + factors.damage_claim_excess
        + factors.diversion_reports;
    let dpi = ((sum / 6.0).round() as i64).clamp(0, 100);

    Ok(Some(DiversionReport {
        shop_id,
        shop_name: shop.name,
        district: shop.district,
        diversion_probability: dpi,
        level: DiversionLevel::for_index(dpi),
        factors,
    }))
}
