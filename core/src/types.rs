//! Shared primitive types used across the entire engine.

use serde::{Deserialize, Serialize};

/// Row id of a fair-price shop.
pub type ShopId = i64;

/// Row id of a district warehouse.
pub type WarehouseId = i64;

/// Row id of a supplying farmer.
pub type FarmerId = i64;

/// Row id of an admin alert.
pub type AlertId = i64;

/// The fixed commodity set handled by the ration network.
///
/// Per-commodity state lives in explicit columns (`rice_stock`,
/// `wheat_received`, ...); every per-commodity loop iterates
/// `Commodity::ALL` so the compiler catches a missing arm when the
/// set ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commodity {
    Rice,
    Wheat,
    Sugar,
}

impl Commodity {
    pub const ALL: [Commodity; 3] = [Commodity::Rice, Commodity::Wheat, Commodity::Sugar];

    pub fn code(self) -> &'static str {
        match self {
            Commodity::Rice => "rice",
            Commodity::Wheat => "wheat",
            Commodity::Sugar => "sugar",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "rice" => Some(Commodity::Rice),
            "wheat" => Some(Commodity::Wheat),
            "sugar" => Some(Commodity::Sugar),
            _ => None,
        }
    }
}

impl std::fmt::Display for Commodity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// The monotonically-incrementing violation counters on a shop row.
///
/// Counters are bumped by the transaction/dispatch/damage handlers and only
/// ever read by the scoring engine; the derived risk score is recomputed
/// from them, never incremented alongside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationFlag {
    StockOut,
    PriceViolation,
    AfterHours,
    DamageClaim,
    PartialAllocation,
}

impl ViolationFlag {
    /// Column holding this counter on the shops table.
    pub fn column(self) -> &'static str {
        match self {
            ViolationFlag::StockOut => "stock_out_flags",
            ViolationFlag::PriceViolation => "price_violation_flags",
            ViolationFlag::AfterHours => "afterhours_flags",
            ViolationFlag::DamageClaim => "damage_claims",
            ViolationFlag::PartialAllocation => "partial_alloc_flags",
        }
    }
}
