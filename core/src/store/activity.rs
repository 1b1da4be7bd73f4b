use super::RationStore;
use crate::{error::EngineResult, types::ShopId};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// After-hours monitoring event (motion sensor, late transaction, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: i64,
    pub shop_id: ShopId,
    pub event_type: String,
    pub risk_impact: i64,
    pub resolved: bool,
    pub created_at: String,
}

impl RationStore {
    // ── Shop activity logs ─────────────────────────────────────

    pub fn insert_activity_event(
        &self,
        shop_id: ShopId,
        event_type: &str,
        risk_impact: i64,
        created_at: &str,
    ) -> EngineResult<i64> {
        self.conn.execute(
            "INSERT INTO shop_activity_logs (shop_id, event_type, risk_impact, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![shop_id, event_type, risk_impact, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Unresolved events feed the after-hours additive trigger.
    pub fn unresolved_activity_count(&self, shop_id: ShopId) -> EngineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM shop_activity_logs WHERE shop_id = ?1 AND resolved = 0",
            params![shop_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn resolve_activity_events(&self, shop_id: ShopId) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE shop_activity_logs SET resolved = 1 WHERE shop_id = ?1",
            params![shop_id],
        )?;
        Ok(())
    }
}
