use super::RationStore;
use crate::{
    error::EngineResult,
    types::{Commodity, WarehouseId},
};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// One warehouses row. Received/dispatched/damaged totals are cumulative
/// over the warehouse's life and never decrease.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseRecord {
    pub id: WarehouseId,
    pub name: String,
    pub district: String,
    pub rice_received: f64,
    pub wheat_received: f64,
    pub sugar_received: f64,
    pub rice_dispatched: f64,
    pub wheat_dispatched: f64,
    pub sugar_dispatched: f64,
    pub rice_damaged: f64,
    pub wheat_damaged: f64,
    pub sugar_damaged: f64,
    pub risk_score: i64,
}

impl WarehouseRecord {
    pub fn received(&self, c: Commodity) -> f64 {
        match c {
            Commodity::Rice => self.rice_received,
            Commodity::Wheat => self.wheat_received,
            Commodity::Sugar => self.sugar_received,
        }
    }

    pub fn dispatched(&self, c: Commodity) -> f64 {
        match c {
            Commodity::Rice => self.rice_dispatched,
            Commodity::Wheat => self.wheat_dispatched,
            Commodity::Sugar => self.sugar_dispatched,
        }
    }

    pub fn damaged(&self, c: Commodity) -> f64 {
        match c {
            Commodity::Rice => self.rice_damaged,
            Commodity::Wheat => self.wheat_damaged,
            Commodity::Sugar => self.sugar_damaged,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewWarehouse {
    pub name: String,
    pub district: String,
}

fn warehouse_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<WarehouseRecord> {
    Ok(WarehouseRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        district: row.get(2)?,
        rice_received: row.get(3)?,
        wheat_received: row.get(4)?,
        sugar_received: row.get(5)?,
        rice_dispatched: row.get(6)?,
        wheat_dispatched: row.get(7)?,
        sugar_dispatched: row.get(8)?,
        rice_damaged: row.get(9)?,
        wheat_damaged: row.get(10)?,
        sugar_damaged: row.get(11)?,
        risk_score: row.get(12)?,
    })
}

const WAREHOUSE_COLUMNS: &str = "id, name, district, rice_received, wheat_received, sugar_received,
     rice_dispatched, wheat_dispatched, sugar_dispatched,
     rice_damaged, wheat_damaged, sugar_damaged, risk_score";

impl RationStore {
    // ── Warehouse ──────────────────────────────────────────────

    pub fn insert_warehouse(&self, w: &NewWarehouse, created_at: &str) -> EngineResult<WarehouseId> {
        self.conn.execute(
            "INSERT INTO warehouses (name, district, created_at) VALUES (?1, ?2, ?3)",
            params![&w.name, &w.district, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_warehouse(&self, warehouse_id: WarehouseId) -> EngineResult<Option<WarehouseRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = ?1"))?;
        let mut rows = stmt.query_map(params![warehouse_id], warehouse_row_mapper)?;
        Ok(rows.next().transpose()?)
    }

    pub fn all_warehouse_ids(&self) -> EngineResult<Vec<WarehouseId>> {
        let mut stmt = self.conn.prepare("SELECT id FROM warehouses ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    pub fn set_warehouse_risk(&self, warehouse_id: WarehouseId, score: i64) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE warehouses SET risk_score = ?1 WHERE id = ?2",
            params![score, warehouse_id],
        )?;
        Ok(())
    }

    /// Additive clamp-at-100 path, mirrors `bump_shop_risk`.
    pub fn bump_warehouse_risk(&self, warehouse_id: WarehouseId, delta: i64) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE warehouses SET risk_score = MIN(100, risk_score + ?1) WHERE id = ?2",
            params![delta, warehouse_id],
        )?;
        Ok(())
    }

    pub fn add_warehouse_received(
        &self,
        warehouse_id: WarehouseId,
        commodity: Commodity,
        quantity: f64,
    ) -> EngineResult<()> {
        self.add_warehouse_total(warehouse_id, commodity, "received", quantity)
    }

    pub fn add_warehouse_dispatched(
        &self,
        warehouse_id: WarehouseId,
        commodity: Commodity,
        quantity: f64,
    ) -> EngineResult<()> {
        self.add_warehouse_total(warehouse_id, commodity, "dispatched", quantity)
    }

    pub fn add_warehouse_damaged(
        &self,
        warehouse_id: WarehouseId,
        commodity: Commodity,
        quantity: f64,
    ) -> EngineResult<()> {
        self.add_warehouse_total(warehouse_id, commodity, "damaged", quantity)
    }

    fn add_warehouse_total(
        &self,
        warehouse_id: WarehouseId,
        commodity: Commodity,
        kind: &'static str,
        quantity: f64,
    ) -> EngineResult<()> {
        let sql = format!(
            "UPDATE warehouses SET {code}_{kind} = {code}_{kind} + ?1 WHERE id = ?2",
            code = commodity.code()
        );
        self.conn.execute(&sql, params![quantity, warehouse_id])?;
        Ok(())
    }
}
