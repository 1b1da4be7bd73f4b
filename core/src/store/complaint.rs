use super::RationStore;
use crate::{error::EngineResult, types::ShopId};
use rusqlite::params;

/// Citizen complaint. Category is assigned by the (external) keyword
/// classifier; the engine only consumes counts.
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub shop_id: ShopId,
    pub text: String,
    pub category: Option<String>,
    pub urgency: String,
}

impl RationStore {
    // ── Complaints ─────────────────────────────────────────────

    pub fn insert_complaint(&self, c: &NewComplaint, created_at: &str) -> EngineResult<i64> {
        self.conn.execute(
            "INSERT INTO complaints (shop_id, text, category, urgency, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                c.shop_id,
                &c.text,
                c.category.as_deref(),
                &c.urgency,
                created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn complaint_count(&self, shop_id: ShopId) -> EngineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM complaints WHERE shop_id = ?1",
            params![shop_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn complaint_count_in_category(
        &self,
        shop_id: ShopId,
        category: &str,
    ) -> EngineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM complaints WHERE shop_id = ?1 AND category = ?2",
            params![shop_id, category],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
