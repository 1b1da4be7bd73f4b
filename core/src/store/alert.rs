use super::RationStore;
use crate::{
    error::EngineResult,
    types::{AlertId, ShopId},
};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Canonical alert type strings. Alerts of the same type against the same
/// entity are deduplicated while unresolved.
pub mod alert_types {
    pub const IDLE_OPEN_SHOP: &str = "IDLE_OPEN_SHOP";
    pub const NEGATIVE_STOCK: &str = "NEGATIVE_STOCK";
    pub const QR_MISSING_RECEIVE: &str = "QR_MISSING_RECEIVE";
    pub const PAYMENT_DELAY_30D: &str = "PAYMENT_DELAY_30D";
    pub const QR_MISMATCH: &str = "QR_MISMATCH";
    pub const DUPLICATE_SCAN: &str = "DUPLICATE_SCAN";
    pub const SEASONAL_MISUSE: &str = "SEASONAL_MISUSE";
    pub const FARMER_PAYMENT_DELAY: &str = "FARMER_PAYMENT_DELAY";
    pub const MOISTURE_ANOMALY: &str = "MOISTURE_ANOMALY";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAlert {
    pub alert_type: String,
    pub severity: Severity,
    pub entity_type: String,
    pub entity_id: i64,
    pub message: String,
}

impl NewAlert {
    pub fn new(
        alert_type: &str,
        severity: Severity,
        entity_type: &str,
        entity_id: i64,
        message: String,
    ) -> Self {
        Self {
            alert_type: alert_type.to_string(),
            severity,
            entity_type: entity_type.to_string(),
            entity_id,
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: AlertId,
    pub alert_type: String,
    pub severity: String,
    pub entity_type: String,
    pub entity_id: i64,
    pub message: String,
    pub resolved: bool,
    pub created_at: String,
}

fn alert_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<AlertRecord> {
    Ok(AlertRecord {
        id: row.get(0)?,
        alert_type: row.get(1)?,
        severity: row.get(2)?,
        entity_type: row.get(3)?,
        entity_id: row.get(4)?,
        message: row.get(5)?,
        resolved: row.get::<_, i64>(6)? != 0,
        created_at: row.get(7)?,
    })
}

impl RationStore {
    // ── Admin alerts ───────────────────────────────────────────

    /// Insert an alert unless an unresolved alert with the same
    /// (alert_type, entity_type, entity_id) key already exists.
    /// Returns true when a row was actually inserted.
    ///
    /// This is the single dedup point: every alert in the system goes
    /// through here, so no check can forget the existence guard.
    pub fn raise_alert(&self, alert: &NewAlert, created_at: &str) -> EngineResult<bool> {
        if self.unresolved_alert_exists(&alert.alert_type, &alert.entity_type, alert.entity_id)? {
            return Ok(false);
        }
        self.conn.execute(
            "INSERT INTO admin_alerts (alert_type, severity, entity_type, entity_id, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &alert.alert_type,
                alert.severity.as_str(),
                &alert.entity_type,
                alert.entity_id,
                &alert.message,
                created_at,
            ],
        )?;
        Ok(true)
    }

    pub fn unresolved_alert_exists(
        &self,
        alert_type: &str,
        entity_type: &str,
        entity_id: i64,
    ) -> EngineResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM admin_alerts
             WHERE alert_type = ?1 AND entity_type = ?2 AND entity_id = ?3 AND resolved = 0",
            params![alert_type, entity_type, entity_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Once resolved, a new alert of the same key may be raised again.
    pub fn resolve_alert(&self, alert_id: AlertId) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE admin_alerts SET resolved = 1 WHERE id = ?1",
            params![alert_id],
        )?;
        Ok(())
    }

    pub fn unresolved_alert_count(&self, alert_type: &str) -> EngineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM admin_alerts WHERE alert_type = ?1 AND resolved = 0",
            params![alert_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Unresolved batch-entity alerts of `alert_type` belonging to one shop,
    /// for the QR-integrity trigger. Resolved alerts stop counting.
    pub fn unresolved_batch_alert_count_for_shop(
        &self,
        shop_id: ShopId,
        alert_type: &str,
    ) -> EngineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM admin_alerts
             WHERE alert_type = ?1 AND entity_type = 'batch' AND resolved = 0
               AND entity_id IN (SELECT id FROM batches WHERE shop_id = ?2)",
            params![alert_type, shop_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn recent_alerts(&self, limit: i64) -> EngineResult<Vec<AlertRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, alert_type, severity, entity_type, entity_id, message, resolved, created_at
             FROM admin_alerts ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], alert_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn alerts_for_entity(
        &self,
        entity_type: &str,
        entity_id: i64,
    ) -> EngineResult<Vec<AlertRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, alert_type, severity, entity_type, entity_id, message, resolved, created_at
             FROM admin_alerts WHERE entity_type = ?1 AND entity_id = ?2 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![entity_type, entity_id], alert_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
