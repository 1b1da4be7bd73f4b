//! Anomaly sweep — an on-demand batch pass cross-referencing tables for
//! stale or inconsistent state.
//!
//! All four checks dedup through `RationStore::raise_alert` on
//! (alert_type, entity_type, entity_id) while unresolved, so running the
//! sweep twice against unchanged state generates nothing new. Resolving an
//! alert re-arms its key.

use crate::{
    clock::EngineClock,
    config::RiskConfig,
    error::EngineResult,
    store::{alert_types, NewAlert, RationStore, Severity},
};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub alerts_generated: i64,
    pub idle_shops: i64,
    pub negative_stock: i64,
    pub missing_receives: i64,
    pub payment_delays: i64,
}

/// Run all checks once. Checks are independent and order-insensitive;
/// the report counts alerts actually inserted in this pass.
pub fn run_anomaly_sweep(
    store: &RationStore,
    clock: &EngineClock,
    config: &RiskConfig,
) -> EngineResult<SweepReport> {
    let now = clock.timestamp();
    let mut report = SweepReport::default();

    // Shops marked open with no sales inside the idle window.
    let idle_cutoff = clock.cutoff_hours_ago(config.idle_shop_hours);
    for (shop_id, name) in store.idle_open_shops(&idle_cutoff)? {
        let inserted = store.raise_alert(
            &NewAlert::new(
                alert_types::IDLE_OPEN_SHOP,
                Severity::Low,
                "shop",
                shop_id,
                format!(
                    "{name} marked OPEN but no transactions in {}h",
                    config.idle_shop_hours
                ),
            ),
            &now,
        )?;
        if inserted {
            report.idle_shops += 1;
        }
    }

    // Negative stock on any commodity.
    for (shop_id, name) in store.shops_with_negative_stock()? {
        let inserted = store.raise_alert(
            &NewAlert::new(
                alert_types::NEGATIVE_STOCK,
                Severity::High,
                "shop",
                shop_id,
                format!("{name} has negative stock - possible data anomaly"),
            ),
            &now,
        )?;
        if inserted {
            report.negative_stock += 1;
        }
    }

    // Batches stuck DISPATCHED with no RECEIVE scan.
    let stale_cutoff = clock.cutoff_hours_ago(config.stale_dispatch_hours);
    for batch in store.stale_dispatched_batches(&stale_cutoff)? {
        let inserted = store.raise_alert(
            &NewAlert::new(
                alert_types::QR_MISSING_RECEIVE,
                Severity::Medium,
                "batch",
                batch.id,
                format!(
                    "Batch {} dispatched but no RECEIVE scan after {}h",
                    batch.batch_code, config.stale_dispatch_hours
                ),
            ),
            &now,
        )?;
        if inserted {
            report.missing_receives += 1;
        }
    }

    // Farmer payments pending past the delay window, one alert per farmer.
    let payment_cutoff = clock.cutoff_days_ago(config.payment_delay_days);
    for (farmer_id, name) in store.farmers_with_overdue_payments(&payment_cutoff)? {
        let inserted = store.raise_alert(
            &NewAlert::new(
                alert_types::PAYMENT_DELAY_30D,
                Severity::High,
                "farmer",
                farmer_id,
                format!("{name}: payment pending >{} days", config.payment_delay_days),
            ),
            &now,
        )?;
        if inserted {
            report.payment_delays += 1;
        }
    }

    report.alerts_generated =
        report.idle_shops + report.negative_stock + report.missing_receives + report.payment_delays;
    log::info!(
        "anomaly sweep: {} alerts ({} idle, {} negative stock, {} missing receives, {} payment delays)",
        report.alerts_generated,
        report.idle_shops,
        report.negative_stock,
        report.missing_receives,
        report.payment_delays
    );
    Ok(report)
}
