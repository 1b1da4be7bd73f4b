use super::RationStore;
use crate::error::EngineResult;
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Master pricing/season row per commodity code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommodityInfo {
    pub code: String,
    pub name: String,
    pub government_price: f64,
    pub monthly_limit: f64,
    pub seasonal_flag: bool,
    /// Active window as `YYYY-MM-DD` dates; only set for seasonal commodities.
    pub active_from: Option<String>,
    pub active_to: Option<String>,
}

impl RationStore {
    // ── Commodity master ───────────────────────────────────────

    pub fn upsert_commodity(&self, c: &CommodityInfo) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO commodity_master (code, name, government_price, monthly_limit,
                                           seasonal_flag, active_from, active_to)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                government_price = excluded.government_price,
                monthly_limit = excluded.monthly_limit,
                seasonal_flag = excluded.seasonal_flag,
                active_from = excluded.active_from,
                active_to = excluded.active_to",
            params![
                &c.code,
                &c.name,
                c.government_price,
                c.monthly_limit,
                c.seasonal_flag as i64,
                c.active_from.as_deref(),
                c.active_to.as_deref(),
            ],
        )?;
        Ok(())
    }

    pub fn official_price(&self, code: &str) -> EngineResult<Option<f64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT government_price FROM commodity_master WHERE code = ?1")?;
        let mut rows = stmt.query_map(params![code], |row| row.get(0))?;
        Ok(rows.next().transpose()?)
    }

    /// Seasonal commodities that carry an active window.
    pub fn seasonal_commodities(&self) -> EngineResult<Vec<CommodityInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT code, name, government_price, monthly_limit, seasonal_flag, active_from, active_to
             FROM commodity_master
             WHERE seasonal_flag = 1 AND active_from IS NOT NULL
             ORDER BY code",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CommodityInfo {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    government_price: row.get(2)?,
                    monthly_limit: row.get(3)?,
                    seasonal_flag: row.get::<_, i64>(4)? != 0,
                    active_from: row.get(5)?,
                    active_to: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
