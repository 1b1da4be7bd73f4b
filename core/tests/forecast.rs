//! Shortage forecast and restock recommendation, with a pinned clock.

use chrono::{Duration, TimeZone, Utc};
use rationtrace_core::{
    clock::{format_ts, EngineClock},
    config::RiskConfig,
    forecast::{restock_recommendation, shortage_forecast, ForecastTier, NO_DEPLETION_DATA},
    store::{NewSale, NewShop, NewWarehouse, RationStore},
    types::{Commodity, ShopId},
};

fn pinned_clock() -> EngineClock {
    EngineClock::fixed(Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap())
}

fn test_store() -> RationStore {
    let store = RationStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

fn seed_shop(store: &RationStore, rice: f64, wheat: f64, sugar: f64) -> ShopId {
    let ts = "2026-01-01 00:00:00";
    let warehouse_id = store
        .insert_warehouse(
            &NewWarehouse {
                name: "South Central Warehouse".into(),
                district: "South".into(),
            },
            ts,
        )
        .unwrap();
    store
        .insert_shop(
            &NewShop {
                name: "Fair Price Shop #7".into(),
                district: "South".into(),
                warehouse_id,
                rice_stock: rice,
                wheat_stock: wheat,
                sugar_stock: sugar,
            },
            ts,
        )
        .unwrap()
}

fn sell(store: &RationStore, shop_id: ShopId, item: Commodity, quantity: f64, days_ago: i64) {
    let clock = pinned_clock();
    let ts = format_ts(clock.now() - Duration::days(days_ago));
    store
        .insert_sale(
            &NewSale {
                shop_id,
                beneficiary_id: Some(1),
                item,
                quantity,
                price: 4.0,
                official_price: 4.0,
                violation_type: None,
            },
            &ts,
        )
        .unwrap();
}

/// Boundary case: zero stock and zero sales must report an empty shelf
/// (days_left 0, critical), never the no-data sentinel.
#[test]
fn zero_stock_zero_sales_is_critical() {
    let store = test_store();
    let shop_id = seed_shop(&store, 0.0, 0.0, 0.0);

    let forecast = shortage_forecast(&store, &pinned_clock(), &RiskConfig::default(), shop_id)
        .unwrap()
        .unwrap();
    for (_, f) in &forecast.forecasts {
        assert_eq!(f.days_left, 0);
        assert_eq!(f.alert, ForecastTier::Critical);
        assert_ne!(f.days_left, NO_DEPLETION_DATA);
    }
}

/// Positive stock with no sales drains over the full window: stock/30.
#[test]
fn no_sales_falls_back_to_window_drain() {
    let store = test_store();
    let shop_id = seed_shop(&store, 300.0, 0.0, 0.0);

    let forecast = shortage_forecast(&store, &pinned_clock(), &RiskConfig::default(), shop_id)
        .unwrap()
        .unwrap();
    let rice = &forecast.forecasts[&Commodity::Rice];
    assert!((rice.avg_daily_distribution - 10.0).abs() < 1e-9);
    assert_eq!(rice.days_left, 30);
    assert_eq!(rice.alert, ForecastTier::Normal);
}

/// Average is total quantity over DISTINCT sale days, not elapsed days.
#[test]
fn average_uses_distinct_sale_days() {
    let store = test_store();
    let shop_id = seed_shop(&store, 50.0, 200.0, 200.0);
    // 30 units of rice across 3 distinct days (two sales share a day).
    sell(&store, shop_id, Commodity::Rice, 10.0, 1);
    sell(&store, shop_id, Commodity::Rice, 5.0, 3);
    sell(&store, shop_id, Commodity::Rice, 5.0, 3);
    sell(&store, shop_id, Commodity::Rice, 10.0, 5);

    let forecast = shortage_forecast(&store, &pinned_clock(), &RiskConfig::default(), shop_id)
        .unwrap()
        .unwrap();
    let rice = &forecast.forecasts[&Commodity::Rice];
    assert!((rice.avg_daily_distribution - 10.0).abs() < 1e-9);
    assert_eq!(rice.days_left, 5);
    assert_eq!(rice.alert, ForecastTier::Critical);
}

/// Sales older than the window do not count.
#[test]
fn stale_sales_fall_out_of_the_window() {
    let store = test_store();
    let shop_id = seed_shop(&store, 300.0, 200.0, 200.0);
    sell(&store, shop_id, Commodity::Rice, 90.0, 45);

    let forecast = shortage_forecast(&store, &pinned_clock(), &RiskConfig::default(), shop_id)
        .unwrap()
        .unwrap();
    // Falls back to stock/30, as if no sales existed.
    let rice = &forecast.forecasts[&Commodity::Rice];
    assert!((rice.avg_daily_distribution - 10.0).abs() < 1e-9);
}

/// Tier boundaries: <7 critical, <14 warning, otherwise normal.
#[test]
fn alert_tiers_follow_days_left() {
    let store = test_store();
    let shop_id = seed_shop(&store, 0.0, 100.0, 200.0);
    sell(&store, shop_id, Commodity::Wheat, 10.0, 2); // 100/10 = 10 days
    sell(&store, shop_id, Commodity::Sugar, 10.0, 2); // 200/10 = 20 days

    let forecast = shortage_forecast(&store, &pinned_clock(), &RiskConfig::default(), shop_id)
        .unwrap()
        .unwrap();
    assert_eq!(forecast.forecasts[&Commodity::Wheat].alert, ForecastTier::Warning);
    assert_eq!(forecast.forecasts[&Commodity::Sugar].alert, ForecastTier::Normal);
}

/// Restock covers projected 30-day demand plus the 15% buffer, floored
/// at zero when the shelf already holds enough.
#[test]
fn restock_adds_safety_buffer() {
    let store = test_store();
    let shop_id = seed_shop(&store, 50.0, 2_000.0, 200.0);
    sell(&store, shop_id, Commodity::Rice, 10.0, 1);
    sell(&store, shop_id, Commodity::Rice, 10.0, 2);
    sell(&store, shop_id, Commodity::Wheat, 10.0, 1);
    sell(&store, shop_id, Commodity::Wheat, 10.0, 2);

    let plan = restock_recommendation(&store, &pinned_clock(), &RiskConfig::default(), shop_id)
        .unwrap()
        .unwrap();
    let rice = &plan.recommendations[&Commodity::Rice];
    // demand 300, stock 50, buffer 45 -> 295
    assert_eq!(rice.projected_demand_30d, 300);
    assert_eq!(rice.recommended_dispatch, 295);
    assert_eq!(rice.urgency, ForecastTier::Critical);

    // Wheat holds 2000 against demand 300: nothing to dispatch.
    let wheat = &plan.recommendations[&Commodity::Wheat];
    assert_eq!(wheat.recommended_dispatch, 0);
}

/// Unknown shops yield None, not an error.
#[test]
fn unknown_shop_yields_none() {
    let store = test_store();
    let clock = pinned_clock();
    let config = RiskConfig::default();
    assert!(shortage_forecast(&store, &clock, &config, 42).unwrap().is_none());
    assert!(restock_recommendation(&store, &clock, &config, 42).unwrap().is_none());
}
