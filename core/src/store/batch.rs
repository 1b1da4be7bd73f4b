use super::RationStore;
use crate::{
    batch_chain::{BatchStatus, ScanType},
    error::EngineResult,
    types::{Commodity, FarmerId, ShopId, WarehouseId},
};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// A traceable commodity lot moving CREATED → DISPATCHED → RECEIVED →
/// DISTRIBUTED, carrying a tamper-evident hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: i64,
    pub batch_code: String,
    pub commodity: Commodity,
    pub weight: f64,
    pub warehouse_id: WarehouseId,
    pub shop_id: ShopId,
    pub farmer_id: Option<FarmerId>,
    pub status: BatchStatus,
    pub hash: String,
    pub created_at: String,
    pub received_at: Option<String>,
}

fn batch_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<BatchRecord> {
    let commodity_code: String = row.get(2)?;
    let status_raw: String = row.get(7)?;
    Ok(BatchRecord {
        id: row.get(0)?,
        batch_code: row.get(1)?,
        commodity: Commodity::from_code(&commodity_code).unwrap_or(Commodity::Rice),
        weight: row.get(3)?,
        warehouse_id: row.get(4)?,
        shop_id: row.get(5)?,
        farmer_id: row.get(6)?,
        status: BatchStatus::from_str(&status_raw).unwrap_or(BatchStatus::Created),
        hash: row.get(8)?,
        created_at: row.get(9)?,
        received_at: row.get(10)?,
    })
}

const BATCH_COLUMNS: &str = "id, batch_code, commodity, weight, warehouse_id, shop_id, farmer_id,
     status, hash, created_at, received_at";

impl RationStore {
    // ── Batches & scans ────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub fn insert_batch(
        &self,
        batch_code: &str,
        commodity: Commodity,
        weight: f64,
        warehouse_id: WarehouseId,
        shop_id: ShopId,
        farmer_id: Option<FarmerId>,
        status: BatchStatus,
        hash: &str,
        created_at: &str,
    ) -> EngineResult<i64> {
        self.conn.execute(
            "INSERT INTO batches (batch_code, commodity, weight, warehouse_id, shop_id, farmer_id,
                                  status, hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                batch_code,
                commodity.code(),
                weight,
                warehouse_id,
                shop_id,
                farmer_id,
                status.as_str(),
                hash,
                created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_batch(&self, batch_code: &str) -> EngineResult<Option<BatchRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {BATCH_COLUMNS} FROM batches WHERE batch_code = ?1"))?;
        let mut rows = stmt.query_map(params![batch_code], batch_row_mapper)?;
        Ok(rows.next().transpose()?)
    }

    pub fn set_batch_status(
        &self,
        batch_code: &str,
        status: BatchStatus,
        received_at: Option<&str>,
    ) -> EngineResult<()> {
        match received_at {
            Some(ts) => self.conn.execute(
                "UPDATE batches SET status = ?1, received_at = ?2 WHERE batch_code = ?3",
                params![status.as_str(), ts, batch_code],
            )?,
            None => self.conn.execute(
                "UPDATE batches SET status = ?1 WHERE batch_code = ?2",
                params![status.as_str(), batch_code],
            )?,
        };
        Ok(())
    }

    pub fn insert_scan(
        &self,
        batch_code: &str,
        scan_type: ScanType,
        location: Option<&str>,
        created_at: &str,
    ) -> EngineResult<i64> {
        self.conn.execute(
            "INSERT INTO scans (batch_code, scan_type, location, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![batch_code, scan_type.as_str(), location, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn has_scan(&self, batch_code: &str, scan_type: ScanType) -> EngineResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM scans WHERE batch_code = ?1 AND scan_type = ?2",
            params![batch_code, scan_type.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Batches stuck in DISPATCHED since before `cutoff` with no RECEIVE scan.
    pub fn stale_dispatched_batches(&self, cutoff: &str) -> EngineResult<Vec<BatchRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches
             WHERE status = 'DISPATCHED' AND created_at <= ?1
               AND batch_code NOT IN (SELECT batch_code FROM scans WHERE scan_type = 'RECEIVE')
             ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![cutoff], batch_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Same condition as `stale_dispatched_batches`, restricted to one shop.
    pub fn stale_dispatched_count_for_shop(
        &self,
        shop_id: ShopId,
        cutoff: &str,
    ) -> EngineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM batches
             WHERE shop_id = ?1 AND status = 'DISPATCHED' AND created_at <= ?2
               AND batch_code NOT IN (SELECT batch_code FROM scans WHERE scan_type = 'RECEIVE')",
            params![shop_id, cutoff],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
