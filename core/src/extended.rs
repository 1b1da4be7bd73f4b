//! Extended risk triggers — additive, bounded deltas layered on top of the
//! periodic full recompute.
//!
//! These are real-time signals: each check counts the currently UNRESOLVED
//! evidence (resolved alerts and events drop out of the counting queries)
//! and adds a capped delta to the stored score via the clamp-at-100 path.
//! Re-running a check against still-unresolved conditions adds again; the
//! base recompute is the idempotent path, this one deliberately is not.

use crate::{
    clock::EngineClock,
    config::RiskConfig,
    error::EngineResult,
    store::{alert_types, NewAlert, RationStore, Severity},
    types::{FarmerId, ShopId},
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct QrIntegritySummary {
    pub qr_mismatches: i64,
    pub duplicate_scans: i64,
    pub missing_receives: i64,
    pub risk_delta: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AfterHoursSummary {
    pub unresolved_events: i64,
    pub risk_delta: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentDelaySummary {
    pub delayed_transactions: i64,
    pub risk_delta: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonalMisuseSummary {
    pub seasonal_violations: i64,
    pub risk_delta: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtendedRiskSummary {
    pub shop_id: ShopId,
    pub qr_integrity: QrIntegritySummary,
    pub after_hours: AfterHoursSummary,
    pub seasonal_misuse: SeasonalMisuseSummary,
}

/// QR custody signals for a shop: unresolved hash-mismatch and
/// duplicate-scan alerts on its batches, plus batches stuck DISPATCHED
/// past the stale window.
pub fn check_qr_integrity(
    store: &RationStore,
    clock: &EngineClock,
    config: &RiskConfig,
    shop_id: ShopId,
) -> EngineResult<QrIntegritySummary> {
    let qr_mismatches =
        store.unresolved_batch_alert_count_for_shop(shop_id, alert_types::QR_MISMATCH)?;
    let duplicate_scans =
        store.unresolved_batch_alert_count_for_shop(shop_id, alert_types::DUPLICATE_SCAN)?;
    let cutoff = clock.cutoff_hours_ago(config.stale_dispatch_hours);
    let missing_receives = store.stale_dispatched_count_for_shop(shop_id, &cutoff)?;

    let risk_delta =
        (qr_mismatches * 15 + duplicate_scans * 10 + missing_receives * 8).min(config.qr_delta_cap);
    if risk_delta > 0 {
        store.bump_shop_risk(shop_id, risk_delta)?;
    }

    Ok(QrIntegritySummary {
        qr_mismatches,
        duplicate_scans,
        missing_receives,
        risk_delta,
    })
}

/// Unresolved after-hours monitoring events, 5 points each, capped.
pub fn check_after_hours_activity(
    store: &RationStore,
    config: &RiskConfig,
    shop_id: ShopId,
) -> EngineResult<AfterHoursSummary> {
    let unresolved_events = store.unresolved_activity_count(shop_id)?;
    let risk_delta = (unresolved_events * 5).min(config.after_hours_delta_cap);
    if risk_delta > 0 {
        store.bump_shop_risk(shop_id, risk_delta)?;
    }
    Ok(AfterHoursSummary {
        unresolved_events,
        risk_delta,
    })
}

/// Payments to a farmer pending past the delay window. The delta lands on
/// the farmer's linked warehouse, and a deduped alert is raised per farmer.
pub fn check_farmer_payment_delay(
    store: &RationStore,
    clock: &EngineClock,
    config: &RiskConfig,
    farmer_id: FarmerId,
) -> EngineResult<PaymentDelaySummary> {
    let cutoff = clock.cutoff_days_ago(config.payment_delay_days);
    let delayed = store.overdue_payment_count(farmer_id, &cutoff)?;
    let farmer = store.get_farmer(farmer_id)?;

    let mut risk_delta = 0;
    if delayed > 0 {
        if let Some(farmer) = farmer {
            risk_delta = (delayed * 5).min(config.payment_delay_delta_cap);
            store.bump_warehouse_risk(farmer.warehouse_id, risk_delta)?;
            store.raise_alert(
                &NewAlert::new(
                    alert_types::FARMER_PAYMENT_DELAY,
                    Severity::Medium,
                    "farmer",
                    farmer_id,
                    format!(
                        "Payment delay >{} days for farmer {}",
                        config.payment_delay_days, farmer.name
                    ),
                ),
                &clock.timestamp(),
            )?;
        }
    }

    Ok(PaymentDelaySummary {
        delayed_transactions: delayed,
        risk_delta,
    })
}

/// Seasonal commodities sold outside their active window. One deduped
/// alert per shop; the delta grows with the number of misused commodities
/// and is bounded only by the overall clamp at 100.
pub fn check_seasonal_misuse(
    store: &RationStore,
    clock: &EngineClock,
    shop_id: ShopId,
) -> EngineResult<SeasonalMisuseSummary> {
    let today = clock.today();
    let mut seasonal_violations = 0i64;

    for cm in store.seasonal_commodities()? {
        let out_of_window = match (&cm.active_from, &cm.active_to) {
            (Some(from), Some(to)) => today.as_str() < from.as_str() || today.as_str() > to.as_str(),
            (Some(from), None) => today.as_str() < from.as_str(),
            _ => false,
        };
        if !out_of_window {
            continue;
        }
        if store.sale_count_of_item(shop_id, &cm.code)? > 0 {
            seasonal_violations += 1;
            store.raise_alert(
                &NewAlert::new(
                    alert_types::SEASONAL_MISUSE,
                    Severity::High,
                    "shop",
                    shop_id,
                    format!("{} distributed outside active period at shop #{shop_id}", cm.name),
                ),
                &clock.timestamp(),
            )?;
        }
    }

    let risk_delta = seasonal_violations * 10;
    if risk_delta > 0 {
        store.bump_shop_risk(shop_id, risk_delta)?;
    }

    Ok(SeasonalMisuseSummary {
        seasonal_violations,
        risk_delta,
    })
}

/// Run all shop-level extended checks and aggregate their summaries.
pub fn extended_risk_summary(
    store: &RationStore,
    clock: &EngineClock,
    config: &RiskConfig,
    shop_id: ShopId,
) -> EngineResult<ExtendedRiskSummary> {
    let qr_integrity = check_qr_integrity(store, clock, config, shop_id)?;
    let after_hours = check_after_hours_activity(store, config, shop_id)?;
    let seasonal_misuse = check_seasonal_misuse(store, clock, shop_id)?;
    Ok(ExtendedRiskSummary {
        shop_id,
        qr_integrity,
        after_hours,
        seasonal_misuse,
    })
}
