//! Anomaly sweep: the four checks, and the one-consistent-dedup-policy
//! guarantee — a second pass over unchanged state is silent.

use chrono::{Duration, TimeZone, Utc};
use rationtrace_core::{
    batch_chain::{apply_scan, create_batch, NewBatch, ScanType},
    clock::{format_ts, EngineClock},
    config::RiskConfig,
    store::{alert_types, NewFarmer, NewFarmerSupply, NewSale, NewShop, NewWarehouse, RationStore},
    sweep::run_anomaly_sweep,
    types::{Commodity, ShopId, WarehouseId},
};

fn now_clock() -> EngineClock {
    EngineClock::fixed(Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap())
}

fn days_ago_clock(days: i64) -> EngineClock {
    EngineClock::fixed(now_clock().now() - Duration::days(days))
}

fn test_store() -> RationStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = RationStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

fn seed_warehouse(store: &RationStore) -> WarehouseId {
    store
        .insert_warehouse(
            &NewWarehouse {
                name: "South Central Warehouse".into(),
                district: "South".into(),
            },
            "2026-01-01 00:00:00",
        )
        .unwrap()
}

fn seed_shop(store: &RationStore, warehouse_id: WarehouseId, name: &str) -> ShopId {
    store
        .insert_shop(
            &NewShop {
                name: name.into(),
                district: "South".into(),
                warehouse_id,
                rice_stock: 100.0,
                wheat_stock: 100.0,
                sugar_stock: 100.0,
            },
            "2026-01-01 00:00:00",
        )
        .unwrap()
}

fn sell_now(store: &RationStore, shop_id: ShopId) {
    store
        .insert_sale(
            &NewSale {
                shop_id,
                beneficiary_id: Some(1),
                item: Commodity::Rice,
                quantity: 2.0,
                price: 4.0,
                official_price: 4.0,
                violation_type: None,
            },
            &format_ts(now_clock().now() - Duration::hours(2)),
        )
        .unwrap();
}

/// Build one offender per check and verify the counts.
fn seed_offenders(store: &RationStore) -> (ShopId, ShopId) {
    let warehouse_id = seed_warehouse(store);

    // Check 1: open shop with no sales in 48h.
    let idle_shop = seed_shop(store, warehouse_id, "Idle Shop");

    // Check 2: negative stock.
    let broken_shop = seed_shop(store, warehouse_id, "Broken Shop");
    sell_now(store, broken_shop);
    store.adjust_shop_stock(broken_shop, Commodity::Wheat, -500.0).unwrap();

    // Check 3: batch dispatched 3 days ago, never received.
    create_batch(
        store,
        &days_ago_clock(3),
        &NewBatch {
            batch_code: None,
            commodity: Commodity::Rice,
            weight: 300.0,
            warehouse_id,
            shop_id: broken_shop,
            farmer_id: None,
        },
    )
    .unwrap();

    // Check 4: payment pending for 40 days.
    let farmer_id = store
        .insert_farmer(
            &NewFarmer {
                name: "S. Kisku".into(),
                commodity: "wheat".into(),
                warehouse_id,
            },
            "2026-01-01 00:00:00",
        )
        .unwrap();
    store
        .insert_farmer_supply(
            &NewFarmerSupply {
                farmer_id,
                batch_code: None,
                quantity: 800.0,
                accepted_quantity: 800.0,
                rejected_quantity: 0.0,
                moisture_level: 10.0,
                rate_per_kg: 28.0,
            },
            &days_ago_clock(40).timestamp(),
        )
        .unwrap();

    (idle_shop, broken_shop)
}

#[test]
fn sweep_flags_each_offender_once() {
    let store = test_store();
    seed_offenders(&store);

    let report = run_anomaly_sweep(&store, &now_clock(), &RiskConfig::default()).unwrap();
    assert_eq!(report.idle_shops, 1);
    assert_eq!(report.negative_stock, 1);
    assert_eq!(report.missing_receives, 1);
    assert_eq!(report.payment_delays, 1);
    assert_eq!(report.alerts_generated, 4);
}

/// Second pass over unchanged state: zero new alerts for every check,
/// negative stock included.
#[test]
fn second_sweep_is_silent() {
    let store = test_store();
    seed_offenders(&store);

    run_anomaly_sweep(&store, &now_clock(), &RiskConfig::default()).unwrap();
    let second = run_anomaly_sweep(&store, &now_clock(), &RiskConfig::default()).unwrap();
    assert_eq!(second.alerts_generated, 0);
    assert_eq!(second.negative_stock, 0);
}

/// Resolving an alert re-arms its key for the next pass.
#[test]
fn resolved_alert_fires_again() {
    let store = test_store();
    seed_offenders(&store);
    run_anomaly_sweep(&store, &now_clock(), &RiskConfig::default()).unwrap();

    let negative = store
        .recent_alerts(50)
        .unwrap()
        .into_iter()
        .find(|a| a.alert_type == alert_types::NEGATIVE_STOCK)
        .unwrap();
    store.resolve_alert(negative.id).unwrap();

    let report = run_anomaly_sweep(&store, &now_clock(), &RiskConfig::default()).unwrap();
    assert_eq!(report.negative_stock, 1);
    assert_eq!(report.alerts_generated, 1);
}

/// A shop with a recent sale, or one marked closed, is not idle.
#[test]
fn idle_check_respects_sales_and_closure() {
    let store = test_store();
    let warehouse_id = seed_warehouse(&store);
    let active = seed_shop(&store, warehouse_id, "Active Shop");
    sell_now(&store, active);
    let closed = seed_shop(&store, warehouse_id, "Closed Shop");
    store.set_shop_open(closed, false).unwrap();

    let report = run_anomaly_sweep(&store, &now_clock(), &RiskConfig::default()).unwrap();
    assert_eq!(report.idle_shops, 0);
}

/// A dispatched batch that was received in time is not stale, and a
/// fresh dispatch is inside the grace window.
#[test]
fn received_and_fresh_batches_are_not_stale() {
    let store = test_store();
    let warehouse_id = seed_warehouse(&store);
    let shop_id = seed_shop(&store, warehouse_id, "Receiving Shop");
    sell_now(&store, shop_id);

    let (_, received_code) = create_batch(
        &store,
        &days_ago_clock(3),
        &NewBatch {
            batch_code: None,
            commodity: Commodity::Sugar,
            weight: 50.0,
            warehouse_id,
            shop_id,
            farmer_id: None,
        },
    )
    .unwrap();
    apply_scan(
        &store,
        &days_ago_clock(2),
        &received_code,
        ScanType::Receive,
        Some("shop"),
        None,
    )
    .unwrap();

    create_batch(
        &store,
        &now_clock(),
        &NewBatch {
            batch_code: None,
            commodity: Commodity::Rice,
            weight: 50.0,
            warehouse_id,
            shop_id,
            farmer_id: None,
        },
    )
    .unwrap();

    let report = run_anomaly_sweep(&store, &now_clock(), &RiskConfig::default()).unwrap();
    assert_eq!(report.missing_receives, 0);
}

/// An empty store sweeps clean.
#[test]
fn empty_store_generates_nothing() {
    let store = test_store();
    let report = run_anomaly_sweep(&store, &now_clock(), &RiskConfig::default()).unwrap();
    assert_eq!(report.alerts_generated, 0);
}
