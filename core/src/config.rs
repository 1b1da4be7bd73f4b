//! Engine tuning thresholds.
//!
//! Everything here is a compliance threshold or window width; the seven
//! shop-risk weights are deliberately NOT config — they are a process-wide
//! constant (`shop_risk::WEIGHTS`) that scoring calls never mutate.

use crate::error::EngineResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Warehouse damage ratio (percent) above which the damage sub-score
    /// switches from the sub-linear to the steep slope.
    pub damage_ratio_threshold: f64,
    /// Tolerance band (units) for the warehouse closing-stock reconciliation.
    pub stock_mismatch_tolerance: f64,
    /// Hours a DISPATCHED batch may sit without a RECEIVE scan.
    pub stale_dispatch_hours: i64,
    /// Hours an open shop may go without a sale before it is flagged idle.
    pub idle_shop_hours: i64,
    /// Days a farmer payment may stay PENDING.
    pub payment_delay_days: i64,
    /// Consumption window feeding the shortage forecast.
    pub forecast_window_days: i64,
    /// Safety buffer applied on top of projected 30-day demand.
    pub restock_buffer: f64,
    /// Cap on the additive QR-integrity risk delta.
    pub qr_delta_cap: i64,
    /// Cap on the additive after-hours risk delta.
    pub after_hours_delta_cap: i64,
    /// Cap on the additive farmer-payment-delay risk delta.
    pub payment_delay_delta_cap: i64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            damage_ratio_threshold: 3.0,
            stock_mismatch_tolerance: 100.0,
            stale_dispatch_hours: 48,
            idle_shop_hours: 48,
            payment_delay_days: 30,
            forecast_window_days: 30,
            restock_buffer: 0.15,
            qr_delta_cap: 30,
            after_hours_delta_cap: 20,
            payment_delay_delta_cap: 15,
        }
    }
}

impl RiskConfig {
    /// Load overrides from a JSON file; absent keys keep their defaults.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        Ok(serde_json::from_str(&raw)?)
    }
}
