//! Custody chain for traceable commodity batches, plus the event recorders
//! that feed the extended risk triggers.
//!
//! A batch carries a tamper-evident hash over its canonical fields; scans
//! move it through DISPATCHED → RECEIVED → DISTRIBUTED. A scan presenting
//! a wrong hash or repeating an already-seen scan type is rejected and
//! leaves an alert behind, which `extended::check_qr_integrity` later
//! counts.

use crate::{
    clock::EngineClock,
    error::EngineResult,
    store::{alert_types, NewAlert, NewFarmerSupply, RationStore, Severity},
    types::{Commodity, FarmerId, ShopId, WarehouseId},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Immediate score delta applied to a shop when one of its batches fails
/// hash verification.
const QR_MISMATCH_DELTA: i64 = 15;

/// Moisture percentage above which a farmer intake is flagged.
const MOISTURE_THRESHOLD: f64 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Created,
    Dispatched,
    Received,
    Distributed,
}

impl BatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchStatus::Created => "CREATED",
            BatchStatus::Dispatched => "DISPATCHED",
            BatchStatus::Received => "RECEIVED",
            BatchStatus::Distributed => "DISTRIBUTED",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "CREATED" => Some(BatchStatus::Created),
            "DISPATCHED" => Some(BatchStatus::Dispatched),
            "RECEIVED" => Some(BatchStatus::Received),
            "DISTRIBUTED" => Some(BatchStatus::Distributed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanType {
    Dispatch,
    Receive,
    Distribute,
}

impl ScanType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanType::Dispatch => "DISPATCH",
            ScanType::Receive => "RECEIVE",
            ScanType::Distribute => "DISTRIBUTE",
        }
    }

    /// Batch status this scan advances to.
    pub fn resulting_status(self) -> BatchStatus {
        match self {
            ScanType::Dispatch => BatchStatus::Dispatched,
            ScanType::Receive => BatchStatus::Received,
            ScanType::Distribute => BatchStatus::Distributed,
        }
    }
}

/// Hex SHA-256 over the canonical `|`-joined batch payload. Weight is
/// rendered with one decimal so re-verification is byte-stable.
pub fn batch_hash(
    batch_code: &str,
    commodity: Commodity,
    weight: f64,
    shop_id: ShopId,
    warehouse_id: WarehouseId,
) -> String {
    let payload = format!(
        "{batch_code}|{}|{weight:.1}|{shop_id}|{warehouse_id}",
        commodity.code()
    );
    let digest = Sha256::digest(payload.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[derive(Debug, Clone)]
pub struct NewBatch {
    /// Generated when None.
    pub batch_code: Option<String>,
    pub commodity: Commodity,
    pub weight: f64,
    pub warehouse_id: WarehouseId,
    pub shop_id: ShopId,
    pub farmer_id: Option<FarmerId>,
}

/// Create a batch in DISPATCHED state with its DISPATCH scan recorded,
/// mirroring the warehouse dispatch flow. Returns the row id and code.
pub fn create_batch(
    store: &RationStore,
    clock: &EngineClock,
    batch: &NewBatch,
) -> EngineResult<(i64, String)> {
    let code = batch
        .batch_code
        .clone()
        .unwrap_or_else(|| format!("BATCH-{}", Uuid::new_v4().simple()));
    let hash = batch_hash(
        &code,
        batch.commodity,
        batch.weight,
        batch.shop_id,
        batch.warehouse_id,
    );
    let now = clock.timestamp();
    let row_id = store.insert_batch(
        &code,
        batch.commodity,
        batch.weight,
        batch.warehouse_id,
        batch.shop_id,
        batch.farmer_id,
        BatchStatus::Dispatched,
        &hash,
        &now,
    )?;
    store.insert_scan(&code, ScanType::Dispatch, Some("warehouse"), &now)?;
    Ok((row_id, code))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ScanOutcome {
    Accepted { new_status: BatchStatus },
    HashMismatch,
    DuplicateScan,
}

/// Apply a scan event to a batch. None if the batch is unknown.
///
/// A presented hash that does not match the stored one raises a critical
/// QR_MISMATCH alert and bumps the shop score immediately; a repeated scan
/// type raises DUPLICATE_SCAN. Neither records the scan.
pub fn apply_scan(
    store: &RationStore,
    clock: &EngineClock,
    batch_code: &str,
    scan_type: ScanType,
    location: Option<&str>,
    presented_hash: Option<&str>,
) -> EngineResult<Option<ScanOutcome>> {
    let Some(batch) = store.get_batch(batch_code)? else {
        return Ok(None);
    };
    let now = clock.timestamp();

    if let Some(presented) = presented_hash {
        if presented != batch.hash {
            store.raise_alert(
                &NewAlert::new(
                    alert_types::QR_MISMATCH,
                    Severity::Critical,
                    "batch",
                    batch.id,
                    format!(
                        "QR hash mismatch for batch {batch_code} at {}",
                        location.unwrap_or("unknown")
                    ),
                ),
                &now,
            )?;
            store.bump_shop_risk(batch.shop_id, QR_MISMATCH_DELTA)?;
            return Ok(Some(ScanOutcome::HashMismatch));
        }
    }

    if store.has_scan(batch_code, scan_type)? {
        store.raise_alert(
            &NewAlert::new(
                alert_types::DUPLICATE_SCAN,
                Severity::High,
                "batch",
                batch.id,
                format!("Duplicate {} scan for batch {batch_code}", scan_type.as_str()),
            ),
            &now,
        )?;
        return Ok(Some(ScanOutcome::DuplicateScan));
    }

    store.insert_scan(batch_code, scan_type, location, &now)?;
    let new_status = scan_type.resulting_status();
    let received_at = matches!(scan_type, ScanType::Receive).then_some(now.as_str());
    store.set_batch_status(batch_code, new_status, received_at)?;
    Ok(Some(ScanOutcome::Accepted { new_status }))
}

/// Log an after-hours monitoring event, alert on it, and apply its impact
/// as an immediate additive delta.
pub fn record_activity_event(
    store: &RationStore,
    clock: &EngineClock,
    shop_id: ShopId,
    event_type: &str,
    risk_impact: i64,
) -> EngineResult<()> {
    let now = clock.timestamp();
    store.insert_activity_event(shop_id, event_type, risk_impact, &now)?;
    let severity = if risk_impact > 8 {
        Severity::High
    } else {
        Severity::Medium
    };
    store.raise_alert(
        &NewAlert::new(
            event_type,
            severity,
            "shop",
            shop_id,
            format!("{event_type} detected at shop #{shop_id}"),
        ),
        &now,
    )?;
    store.bump_shop_risk(shop_id, risk_impact)?;
    Ok(())
}

/// Record a produce intake from a farmer. Payment starts PENDING; a
/// moisture reading past the threshold leaves a MOISTURE_ANOMALY alert.
pub fn record_farmer_supply(
    store: &RationStore,
    clock: &EngineClock,
    supply: &NewFarmerSupply,
) -> EngineResult<i64> {
    let now = clock.timestamp();
    let payment_id = store.insert_farmer_supply(supply, &now)?;
    store.add_farmer_totals(
        supply.farmer_id,
        supply.quantity,
        supply.accepted_quantity * supply.rate_per_kg,
    )?;
    if supply.moisture_level > MOISTURE_THRESHOLD {
        if let Some(farmer) = store.get_farmer(supply.farmer_id)? {
            store.raise_alert(
                &NewAlert::new(
                    alert_types::MOISTURE_ANOMALY,
                    Severity::Medium,
                    "farmer",
                    supply.farmer_id,
                    format!(
                        "Moisture {}% exceeds {MOISTURE_THRESHOLD}% threshold for {}",
                        supply.moisture_level, farmer.name
                    ),
                ),
                &now,
            )?;
        }
    }
    Ok(payment_id)
}
