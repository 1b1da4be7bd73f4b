//! Batch custody chain: tamper-evident hashes, scan state machine,
//! farmer intakes, and after-hours event recording.

use chrono::{TimeZone, Utc};
use rationtrace_core::{
    batch_chain::{
        apply_scan, batch_hash, create_batch, record_activity_event, record_farmer_supply,
        BatchStatus, NewBatch, ScanOutcome, ScanType,
    },
    clock::EngineClock,
    store::{alert_types, NewFarmer, NewFarmerSupply, NewShop, NewWarehouse, RationStore},
    types::{Commodity, FarmerId, ShopId, WarehouseId},
};

fn clock() -> EngineClock {
    EngineClock::fixed(Utc.with_ymd_and_hms(2026, 8, 30, 9, 30, 0).unwrap())
}

fn test_store() -> RationStore {
    let store = RationStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

fn seed_shop(store: &RationStore) -> (WarehouseId, ShopId) {
    let ts = "2026-01-01 00:00:00";
    let warehouse_id = store
        .insert_warehouse(
            &NewWarehouse {
                name: "North Central Warehouse".into(),
                district: "North".into(),
            },
            ts,
        )
        .unwrap();
    let shop_id = store
        .insert_shop(
            &NewShop {
                name: "Fair Price Shop #12".into(),
                district: "North".into(),
                warehouse_id,
                rice_stock: 100.0,
                wheat_stock: 100.0,
                sugar_stock: 100.0,
            },
            ts,
        )
        .unwrap();
    (warehouse_id, shop_id)
}

fn seed_farmer(store: &RationStore, warehouse_id: WarehouseId) -> FarmerId {
    store
        .insert_farmer(
            &NewFarmer {
                name: "R. Murmu".into(),
                commodity: "rice".into(),
                warehouse_id,
            },
            "2026-01-01 00:00:00",
        )
        .unwrap()
}

fn dispatch(store: &RationStore, warehouse_id: WarehouseId, shop_id: ShopId) -> String {
    let (_, code) = create_batch(
        store,
        &clock(),
        &NewBatch {
            batch_code: None,
            commodity: Commodity::Rice,
            weight: 250.0,
            warehouse_id,
            shop_id,
            farmer_id: None,
        },
    )
    .unwrap();
    code
}

/// Same inputs give the same hex digest; any field change gives another.
#[test]
fn hash_is_stable_and_field_sensitive() {
    let base = batch_hash("BATCH-1", Commodity::Rice, 250.0, 3, 7);
    assert_eq!(base, batch_hash("BATCH-1", Commodity::Rice, 250.0, 3, 7));
    assert_eq!(base.len(), 64);
    assert!(base.chars().all(|c| c.is_ascii_hexdigit()));

    assert_ne!(base, batch_hash("BATCH-2", Commodity::Rice, 250.0, 3, 7));
    assert_ne!(base, batch_hash("BATCH-1", Commodity::Wheat, 250.0, 3, 7));
    assert_ne!(base, batch_hash("BATCH-1", Commodity::Rice, 250.5, 3, 7));
    assert_ne!(base, batch_hash("BATCH-1", Commodity::Rice, 250.0, 4, 7));
    assert_ne!(base, batch_hash("BATCH-1", Commodity::Rice, 250.0, 3, 8));
}

/// A fresh batch starts DISPATCHED with its DISPATCH scan on record and a
/// generated code.
#[test]
fn create_batch_dispatches_immediately() {
    let store = test_store();
    let (warehouse_id, shop_id) = seed_shop(&store);

    let code = dispatch(&store, warehouse_id, shop_id);
    assert!(code.starts_with("BATCH-"));

    let batch = store.get_batch(&code).unwrap().unwrap();
    assert_eq!(batch.status, BatchStatus::Dispatched);
    assert!(batch.received_at.is_none());
    assert_eq!(
        batch.hash,
        batch_hash(&code, Commodity::Rice, 250.0, shop_id, warehouse_id)
    );
    assert!(store.has_scan(&code, ScanType::Dispatch).unwrap());
}

/// A RECEIVE scan with the correct hash advances the batch and stamps
/// received_at.
#[test]
fn receive_scan_advances_status() {
    let store = test_store();
    let (warehouse_id, shop_id) = seed_shop(&store);
    let code = dispatch(&store, warehouse_id, shop_id);
    let stored = store.get_batch(&code).unwrap().unwrap().hash;

    let outcome = apply_scan(
        &store,
        &clock(),
        &code,
        ScanType::Receive,
        Some("shop"),
        Some(&stored),
    )
    .unwrap()
    .unwrap();
    assert_eq!(
        outcome,
        ScanOutcome::Accepted {
            new_status: BatchStatus::Received
        }
    );

    let batch = store.get_batch(&code).unwrap().unwrap();
    assert_eq!(batch.status, BatchStatus::Received);
    assert_eq!(batch.received_at.as_deref(), Some(clock().timestamp().as_str()));
    assert!(store.has_scan(&code, ScanType::Receive).unwrap());
}

/// A wrong presented hash is rejected: no scan recorded, critical alert
/// raised against the batch, shop score bumped by 15.
#[test]
fn hash_mismatch_rejects_and_penalizes() {
    let store = test_store();
    let (warehouse_id, shop_id) = seed_shop(&store);
    let code = dispatch(&store, warehouse_id, shop_id);

    let outcome = apply_scan(
        &store,
        &clock(),
        &code,
        ScanType::Receive,
        Some("shop"),
        Some("deadbeef"),
    )
    .unwrap()
    .unwrap();
    assert_eq!(outcome, ScanOutcome::HashMismatch);

    let batch = store.get_batch(&code).unwrap().unwrap();
    assert_eq!(batch.status, BatchStatus::Dispatched);
    assert!(!store.has_scan(&code, ScanType::Receive).unwrap());

    let alerts = store.alerts_for_entity("batch", batch.id).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, alert_types::QR_MISMATCH);
    assert_eq!(alerts[0].severity, "critical");

    assert_eq!(store.get_shop(shop_id).unwrap().unwrap().risk_score, 15);
}

/// Repeating a scan type is rejected with a high alert and no state change.
#[test]
fn duplicate_scan_is_rejected() {
    let store = test_store();
    let (warehouse_id, shop_id) = seed_shop(&store);
    let code = dispatch(&store, warehouse_id, shop_id);

    let outcome = apply_scan(&store, &clock(), &code, ScanType::Dispatch, None, None)
        .unwrap()
        .unwrap();
    assert_eq!(outcome, ScanOutcome::DuplicateScan);

    let batch = store.get_batch(&code).unwrap().unwrap();
    assert_eq!(batch.status, BatchStatus::Dispatched);
    let alerts = store.alerts_for_entity("batch", batch.id).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, alert_types::DUPLICATE_SCAN);
    assert_eq!(alerts[0].severity, "high");
}

/// Scanning a code nobody dispatched yields None, not an error.
#[test]
fn unknown_batch_yields_none() {
    let store = test_store();
    let outcome = apply_scan(&store, &clock(), "BATCH-nope", ScanType::Receive, None, None).unwrap();
    assert!(outcome.is_none());
}

/// Farmer intake records the PENDING payment and rolls the totals.
#[test]
fn farmer_supply_updates_totals() {
    let store = test_store();
    let (warehouse_id, _) = seed_shop(&store);
    let farmer_id = seed_farmer(&store, warehouse_id);

    record_farmer_supply(
        &store,
        &clock(),
        &NewFarmerSupply {
            farmer_id,
            batch_code: None,
            quantity: 500.0,
            accepted_quantity: 480.0,
            rejected_quantity: 20.0,
            moisture_level: 11.0,
            rate_per_kg: 25.0,
        },
    )
    .unwrap();

    let farmer = store.get_farmer(farmer_id).unwrap().unwrap();
    assert!((farmer.total_supplied - 500.0).abs() < 1e-9);
    assert!((farmer.pending_amount - 12_000.0).abs() < 1e-9);
    assert_eq!(store.overdue_payment_count(farmer_id, &clock().timestamp()).unwrap(), 1);

    // Dry produce leaves no moisture alert behind.
    assert!(store.alerts_for_entity("farmer", farmer_id).unwrap().is_empty());
}

/// Moisture past 14% leaves a MOISTURE_ANOMALY alert against the farmer.
#[test]
fn wet_produce_raises_moisture_alert() {
    let store = test_store();
    let (warehouse_id, _) = seed_shop(&store);
    let farmer_id = seed_farmer(&store, warehouse_id);

    record_farmer_supply(
        &store,
        &clock(),
        &NewFarmerSupply {
            farmer_id,
            batch_code: None,
            quantity: 300.0,
            accepted_quantity: 250.0,
            rejected_quantity: 50.0,
            moisture_level: 17.5,
            rate_per_kg: 25.0,
        },
    )
    .unwrap();

    let alerts = store.alerts_for_entity("farmer", farmer_id).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, alert_types::MOISTURE_ANOMALY);
}

/// Activity events log, alert (severity scales with impact), and apply
/// the impact as an immediate score delta.
#[test]
fn activity_event_logs_alerts_and_bumps() {
    let store = test_store();
    let (_, shop_id) = seed_shop(&store);

    record_activity_event(&store, &clock(), shop_id, "night_dispatch", 12).unwrap();
    assert_eq!(store.get_shop(shop_id).unwrap().unwrap().risk_score, 12);
    assert_eq!(store.unresolved_activity_count(shop_id).unwrap(), 1);

    let alerts = store.alerts_for_entity("shop", shop_id).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, "high");

    record_activity_event(&store, &clock(), shop_id, "door_sensor", 5).unwrap();
    let alerts = store.alerts_for_entity("shop", shop_id).unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[1].severity, "medium");
    assert_eq!(store.get_shop(shop_id).unwrap().unwrap().risk_score, 17);
}
