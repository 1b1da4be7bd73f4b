use super::RationStore;
use crate::{
    error::EngineResult,
    types::{Commodity, ShopId},
};
use rusqlite::params;

/// Immutable sale row. The engine only ever reads these in aggregate.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub shop_id: ShopId,
    pub beneficiary_id: Option<i64>,
    pub item: Commodity,
    pub quantity: f64,
    pub price: f64,
    pub official_price: f64,
    /// Comma-joined violation tags, None for a clean sale.
    pub violation_type: Option<String>,
}

/// 30-day consumption aggregate for one commodity at one shop.
#[derive(Debug, Clone)]
pub struct ConsumptionStat {
    pub item: Commodity,
    pub total_quantity: f64,
    /// Distinct calendar days with at least one sale.
    pub active_days: i64,
}

impl RationStore {
    // ── Sales ──────────────────────────────────────────────────

    pub fn insert_sale(&self, sale: &NewSale, created_at: &str) -> EngineResult<i64> {
        self.conn.execute(
            "INSERT INTO sales (shop_id, beneficiary_id, item, quantity, price, official_price,
                                violation_flag, violation_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                sale.shop_id,
                sale.beneficiary_id,
                sale.item.code(),
                sale.quantity,
                sale.price,
                sale.official_price,
                sale.violation_type.is_some() as i64,
                sale.violation_type.as_deref(),
                created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn sale_count(&self, shop_id: ShopId) -> EngineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM sales WHERE shop_id = ?1",
            params![shop_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn violating_sale_count(&self, shop_id: ShopId) -> EngineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM sales WHERE shop_id = ?1 AND violation_flag = 1",
            params![shop_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn sale_count_of_item(&self, shop_id: ShopId, item_code: &str) -> EngineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM sales WHERE shop_id = ?1 AND item = ?2",
            params![shop_id, item_code],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Per-commodity quantity sum and distinct sale-day count since `cutoff`.
    /// Commodities with no sales in the window are simply absent.
    pub fn consumption_since(
        &self,
        shop_id: ShopId,
        cutoff: &str,
    ) -> EngineResult<Vec<ConsumptionStat>> {
        let mut stmt = self.conn.prepare(
            "SELECT item, SUM(quantity), COUNT(DISTINCT DATE(created_at))
             FROM sales WHERE shop_id = ?1 AND created_at >= ?2
             GROUP BY item",
        )?;
        let rows = stmt
            .query_map(params![shop_id, cutoff], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows
            .into_iter()
            .filter_map(|(code, total_quantity, active_days)| {
                Commodity::from_code(&code).map(|item| ConsumptionStat {
                    item,
                    total_quantity,
                    active_days,
                })
            })
            .collect())
    }
}
