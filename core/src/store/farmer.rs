use super::RationStore;
use crate::{
    error::EngineResult,
    types::{FarmerId, WarehouseId},
};
use rusqlite::params;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmerRecord {
    pub id: FarmerId,
    pub name: String,
    pub commodity: String,
    /// Warehouse this farmer supplies; payment delays bleed into its score.
    pub warehouse_id: WarehouseId,
    pub total_supplied: f64,
    pub total_paid: f64,
    pub pending_amount: f64,
}

#[derive(Debug, Clone)]
pub struct NewFarmer {
    pub name: String,
    pub commodity: String,
    pub warehouse_id: WarehouseId,
}

/// One intake of produce from a farmer. Payment starts PENDING.
#[derive(Debug, Clone)]
pub struct NewFarmerSupply {
    pub farmer_id: FarmerId,
    pub batch_code: Option<String>,
    pub quantity: f64,
    pub accepted_quantity: f64,
    pub rejected_quantity: f64,
    pub moisture_level: f64,
    pub rate_per_kg: f64,
}

impl RationStore {
    // ── Farmers ────────────────────────────────────────────────

    pub fn insert_farmer(&self, f: &NewFarmer, created_at: &str) -> EngineResult<FarmerId> {
        self.conn.execute(
            "INSERT INTO farmers (name, commodity, warehouse_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![&f.name, &f.commodity, f.warehouse_id, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_farmer(&self, farmer_id: FarmerId) -> EngineResult<Option<FarmerRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, commodity, warehouse_id, total_supplied, total_paid, pending_amount
             FROM farmers WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![farmer_id], |row| {
            Ok(FarmerRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                commodity: row.get(2)?,
                warehouse_id: row.get(3)?,
                total_supplied: row.get(4)?,
                total_paid: row.get(5)?,
                pending_amount: row.get(6)?,
            })
        })?;
        Ok(rows.next().transpose()?)
    }

    pub fn insert_farmer_supply(
        &self,
        s: &NewFarmerSupply,
        created_at: &str,
    ) -> EngineResult<i64> {
        self.conn.execute(
            "INSERT INTO farmer_transactions (farmer_id, batch_code, quantity, accepted_quantity,
                                              rejected_quantity, moisture_level, rate_per_kg,
                                              payment_status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'PENDING', ?8)",
            params![
                s.farmer_id,
                s.batch_code.as_deref(),
                s.quantity,
                s.accepted_quantity,
                s.rejected_quantity,
                s.moisture_level,
                s.rate_per_kg,
                created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn add_farmer_totals(
        &self,
        farmer_id: FarmerId,
        supplied_delta: f64,
        pending_delta: f64,
    ) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE farmers SET total_supplied = total_supplied + ?1,
                                pending_amount = pending_amount + ?2
             WHERE id = ?3",
            params![supplied_delta, pending_delta, farmer_id],
        )?;
        Ok(())
    }

    pub fn mark_farmer_payment_paid(&self, payment_id: i64, paid_at: &str) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE farmer_transactions SET payment_status = 'PAID', payment_date = ?1 WHERE id = ?2",
            params![paid_at, payment_id],
        )?;
        Ok(())
    }

    /// Payments still PENDING since before `cutoff`, for one farmer.
    pub fn overdue_payment_count(&self, farmer_id: FarmerId, cutoff: &str) -> EngineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM farmer_transactions
             WHERE farmer_id = ?1 AND payment_status = 'PENDING' AND created_at <= ?2",
            params![farmer_id, cutoff],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Farmers with at least one payment PENDING since before `cutoff`.
    pub fn farmers_with_overdue_payments(
        &self,
        cutoff: &str,
    ) -> EngineResult<Vec<(FarmerId, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT f.id, f.name FROM farmer_transactions ft
             JOIN farmers f ON ft.farmer_id = f.id
             WHERE ft.payment_status = 'PENDING' AND ft.created_at <= ?1
             ORDER BY f.id",
        )?;
        let rows = stmt
            .query_map(params![cutoff], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
