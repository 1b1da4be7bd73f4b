use super::RationStore;
use crate::{
    error::EngineResult,
    types::{Commodity, ShopId, ViolationFlag, WarehouseId},
};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// One shops row, scoring-relevant fields only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopRecord {
    pub id: ShopId,
    pub name: String,
    pub district: String,
    pub warehouse_id: WarehouseId,
    pub rice_stock: f64,
    pub wheat_stock: f64,
    pub sugar_stock: f64,
    pub open_time: String,
    pub close_time: String,
    pub is_open: bool,
    pub risk_score: i64,
    pub violation_count: i64,
    pub stock_out_flags: i64,
    pub price_violation_flags: i64,
    pub afterhours_flags: i64,
    pub damage_claims: i64,
    pub partial_alloc_flags: i64,
}

impl ShopRecord {
    pub fn stock(&self, commodity: Commodity) -> f64 {
        match commodity {
            Commodity::Rice => self.rice_stock,
            Commodity::Wheat => self.wheat_stock,
            Commodity::Sugar => self.sugar_stock,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewShop {
    pub name: String,
    pub district: String,
    pub warehouse_id: WarehouseId,
    pub rice_stock: f64,
    pub wheat_stock: f64,
    pub sugar_stock: f64,
}

fn shop_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<ShopRecord> {
    Ok(ShopRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        district: row.get(2)?,
        warehouse_id: row.get(3)?,
        rice_stock: row.get(4)?,
        wheat_stock: row.get(5)?,
        sugar_stock: row.get(6)?,
        open_time: row.get(7)?,
        close_time: row.get(8)?,
        is_open: row.get::<_, i64>(9)? != 0,
        risk_score: row.get(10)?,
        violation_count: row.get(11)?,
        stock_out_flags: row.get(12)?,
        price_violation_flags: row.get(13)?,
        afterhours_flags: row.get(14)?,
        damage_claims: row.get(15)?,
        partial_alloc_flags: row.get(16)?,
    })
}

const SHOP_COLUMNS: &str = "id, name, district, warehouse_id, rice_stock, wheat_stock, sugar_stock,
     open_time, close_time, is_open, risk_score, violation_count, stock_out_flags,
     price_violation_flags, afterhours_flags, damage_claims, partial_alloc_flags";

impl RationStore {
    // ── Shop ───────────────────────────────────────────────────

    pub fn insert_shop(&self, s: &NewShop, created_at: &str) -> EngineResult<ShopId> {
        self.conn.execute(
            "INSERT INTO shops (name, district, warehouse_id, rice_stock, wheat_stock, sugar_stock, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &s.name,
                &s.district,
                s.warehouse_id,
                s.rice_stock,
                s.wheat_stock,
                s.sugar_stock,
                created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_shop(&self, shop_id: ShopId) -> EngineResult<Option<ShopRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {SHOP_COLUMNS} FROM shops WHERE id = ?1"))?;
        let mut rows = stmt.query_map(params![shop_id], shop_row_mapper)?;
        Ok(rows.next().transpose()?)
    }

    pub fn all_shop_ids(&self) -> EngineResult<Vec<ShopId>> {
        let mut stmt = self.conn.prepare("SELECT id FROM shops ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Overwrite the derived risk score (base recompute path).
    pub fn set_shop_risk(&self, shop_id: ShopId, score: i64) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE shops SET risk_score = ?1 WHERE id = ?2",
            params![score, shop_id],
        )?;
        Ok(())
    }

    /// Add a bounded delta to the stored score, clamping at 100
    /// (extended-trigger path — never used by the base recompute).
    pub fn bump_shop_risk(&self, shop_id: ShopId, delta: i64) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE shops SET risk_score = MIN(100, risk_score + ?1) WHERE id = ?2",
            params![delta, shop_id],
        )?;
        Ok(())
    }

    /// Bump one violation counter (and the aggregate violation_count).
    /// The column name comes from a closed enum, never from input.
    pub fn increment_violation(&self, shop_id: ShopId, flag: ViolationFlag) -> EngineResult<()> {
        let sql = format!(
            "UPDATE shops SET {col} = {col} + 1, violation_count = violation_count + 1 WHERE id = ?1",
            col = flag.column()
        );
        self.conn.execute(&sql, params![shop_id])?;
        Ok(())
    }

    pub fn adjust_shop_stock(
        &self,
        shop_id: ShopId,
        commodity: Commodity,
        delta: f64,
    ) -> EngineResult<()> {
        let sql = format!(
            "UPDATE shops SET {code}_stock = {code}_stock + ?1 WHERE id = ?2",
            code = commodity.code()
        );
        self.conn.execute(&sql, params![delta, shop_id])?;
        Ok(())
    }

    pub fn set_shop_open(&self, shop_id: ShopId, open: bool) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE shops SET is_open = ?1 WHERE id = ?2",
            params![open as i64, shop_id],
        )?;
        Ok(())
    }

    /// Shops marked open with no sale since `cutoff`.
    pub fn idle_open_shops(&self, cutoff: &str) -> EngineResult<Vec<(ShopId, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.name FROM shops s
             WHERE s.is_open = 1 AND NOT EXISTS (
                 SELECT 1 FROM sales t WHERE t.shop_id = s.id AND t.created_at >= ?1
             )
             ORDER BY s.id",
        )?;
        let rows = stmt
            .query_map(params![cutoff], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Shops where any commodity stock has gone below zero.
    pub fn shops_with_negative_stock(&self) -> EngineResult<Vec<(ShopId, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name FROM shops
             WHERE rice_stock < 0 OR wheat_stock < 0 OR sugar_stock < 0
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
