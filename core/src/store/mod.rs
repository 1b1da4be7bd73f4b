//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Engine modules call store methods — they never execute SQL directly.
//!
//! One submodule per table family; each adds an `impl RationStore` block.

use crate::error::EngineResult;
use rusqlite::Connection;

mod activity;
mod alert;
mod batch;
mod commodity;
mod complaint;
mod farmer;
mod sale;
mod shop;
mod warehouse;

pub use activity::ActivityEvent;
pub use alert::{alert_types, AlertRecord, NewAlert, Severity};
pub use batch::BatchRecord;
pub use commodity::CommodityInfo;
pub use complaint::NewComplaint;
pub use farmer::{FarmerRecord, NewFarmer, NewFarmerSupply};
pub use sale::{ConsumptionStat, NewSale};
pub use shop::{NewShop, ShopRecord};
pub use warehouse::{NewWarehouse, WarehouseRecord};

pub struct RationStore {
    conn: Connection,
}

impl RationStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }
}
