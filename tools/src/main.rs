//! risk-runner: headless pipeline runner for rationtrace.
//!
//! Seeds a demo ration network deterministically from a seed, replays a few
//! weeks of supply-chain activity, then runs the full scoring pipeline:
//! base recompute, extended triggers, and the anomaly sweep.
//!
//! Usage:
//!   risk-runner --seed 12345 --shops 6 --db run.db
//!   risk-runner --seed 12345 --days 21 --json

use anyhow::Result;
use chrono::{Duration, Utc};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use rationtrace_core::{
    batch_chain::{self, NewBatch},
    clock::{format_ts, EngineClock},
    config::RiskConfig,
    diversion, extended, forecast,
    shop_risk, sweep,
    store::{NewComplaint, NewFarmer, NewFarmerSupply, NewSale, NewShop, NewWarehouse, RationStore},
    types::{Commodity, ShopId, ViolationFlag},
};
use std::env;

struct SeedRng(Pcg64Mcg);

impl SeedRng {
    fn new(seed: u64) -> Self {
        Self(Pcg64Mcg::seed_from_u64(seed))
    }

    fn below(&mut self, n: u64) -> u64 {
        self.0.next_u64() % n.max(1)
    }

    fn chance(&mut self, p: f64) -> bool {
        (self.0.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64) < p
    }
}

const DISTRICTS: [&str; 4] = ["North", "South", "East", "West"];

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let shops = parse_arg(&args, "--shops", 6u64);
    let days = parse_arg(&args, "--days", 21u64);
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let json = args.iter().any(|a| a == "--json");

    println!("rationtrace - risk-runner");
    println!("  seed:  {seed}");
    println!("  shops: {shops}");
    println!("  days:  {days}");
    println!("  db:    {db}");
    println!();

    let store = if db == ":memory:" {
        RationStore::in_memory()?
    } else {
        RationStore::open(db)?
    };
    store.migrate()?;

    let mut rng = SeedRng::new(seed);
    let shop_ids = seed_network(&store, &mut rng, shops, days)?;

    let clock = EngineClock::System;
    let config = RiskConfig::default();

    shop_risk::recalculate_all_scores(&store, &config)?;
    for &shop_id in &shop_ids {
        let report = shop_risk::calculate_shop_risk(&store, shop_id)?;
        let dpi = diversion::diversion_probability_index(&store, shop_id)?;
        let summary = extended::extended_risk_summary(&store, &clock, &config, shop_id)?;
        println!(
            "shop {:>2}  risk {:>3}  extended +{:<2}  dpi {}",
            shop_id,
            report.risk_score,
            summary.qr_integrity.risk_delta
                + summary.after_hours.risk_delta
                + summary.seasonal_misuse.risk_delta,
            dpi.map(|d| format!("{:>3} ({:?})", d.diversion_probability, d.level))
                .unwrap_or_else(|| "-".into()),
        );
        if let Some(plan) = forecast::restock_recommendation(&store, &clock, &config, shop_id)? {
            for (commodity, rec) in &plan.recommendations {
                if rec.recommended_dispatch > 0 {
                    println!(
                        "         restock {commodity}: {} units ({:?})",
                        rec.recommended_dispatch, rec.urgency
                    );
                }
            }
        }
    }

    let report = sweep::run_anomaly_sweep(&store, &clock, &config)?;
    println!();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!(
        "sweep: {} alerts ({} idle, {} negative stock, {} missing receives, {} payment delays)",
        report.alerts_generated,
        report.idle_shops,
        report.negative_stock,
        report.missing_receives,
        report.payment_delays
    );
    for alert in store.recent_alerts(20)? {
        println!(
            "  [{:<8}] {:<20} {}#{}  {}",
            alert.severity, alert.alert_type, alert.entity_type, alert.entity_id, alert.message
        );
    }

    Ok(())
}

/// Build a small network with enough irregularities to light up every
/// check: violation flags, overpriced sales, a negative-stock shop, stale
/// batches, and an overdue farmer payment.
fn seed_network(
    store: &RationStore,
    rng: &mut SeedRng,
    shops: u64,
    days: u64,
) -> Result<Vec<ShopId>> {
    let now = Utc::now();
    let genesis = format_ts(now - Duration::days(days as i64 + 30));

    let mut warehouse_ids = Vec::new();
    for district in DISTRICTS {
        let id = store.insert_warehouse(
            &NewWarehouse {
                name: format!("{district} Central Warehouse"),
                district: district.to_string(),
            },
            &genesis,
        )?;
        for c in Commodity::ALL {
            let received = 5_000.0 + rng.below(5_000) as f64;
            store.add_warehouse_received(id, c, received)?;
            store.add_warehouse_dispatched(id, c, received * 0.7)?;
            // One warehouse runs hot on damage to cross the 3% threshold.
            let damage_rate = if id == 1 { 0.05 } else { 0.01 };
            store.add_warehouse_damaged(id, c, received * damage_rate)?;
        }
        warehouse_ids.push(id);
    }

    let mut shop_ids = Vec::new();
    for i in 0..shops {
        let warehouse_id = warehouse_ids[(i % warehouse_ids.len() as u64) as usize];
        let shop_id = store.insert_shop(
            &NewShop {
                name: format!("Fair Price Shop #{}", i + 1),
                district: DISTRICTS[(i % 4) as usize].to_string(),
                warehouse_id,
                rice_stock: 80.0 + rng.below(300) as f64,
                wheat_stock: 60.0 + rng.below(200) as f64,
                sugar_stock: 20.0 + rng.below(80) as f64,
            },
            &genesis,
        )?;
        shop_ids.push(shop_id);
    }

    // Replay daily sales; some shops misbehave.
    for &shop_id in &shop_ids {
        let dirty = rng.chance(0.4);
        for day in 0..days {
            if rng.chance(0.2) {
                continue; // no sales that day
            }
            let ts = format_ts(now - Duration::days(day as i64) - Duration::hours(6));
            for _ in 0..(1 + rng.below(4)) {
                let item = Commodity::ALL[rng.below(3) as usize];
                let official = match item {
                    Commodity::Rice => 4.0,
                    Commodity::Wheat => 3.0,
                    Commodity::Sugar => 13.5,
                };
                let overpriced = dirty && rng.chance(0.15);
                let price = if overpriced { official + 2.0 } else { official };
                let quantity = 1.0 + rng.below(5) as f64;
                store.insert_sale(
                    &NewSale {
                        shop_id,
                        beneficiary_id: Some(rng.below(500) as i64 + 1),
                        item,
                        quantity,
                        price,
                        official_price: official,
                        violation_type: overpriced.then(|| "overpricing".to_string()),
                    },
                    &ts,
                )?;
                store.adjust_shop_stock(shop_id, item, -quantity)?;
                if overpriced {
                    store.increment_violation(shop_id, ViolationFlag::PriceViolation)?;
                }
            }
        }
        if dirty {
            for _ in 0..rng.below(3) {
                store.increment_violation(shop_id, ViolationFlag::StockOut)?;
            }
            if rng.chance(0.5) {
                store.increment_violation(shop_id, ViolationFlag::AfterHours)?;
            }
            store.insert_complaint(
                &NewComplaint {
                    shop_id,
                    text: "Dealer selling above the notified price".to_string(),
                    category: Some("overpricing".to_string()),
                    urgency: "high".to_string(),
                },
                &format_ts(now - Duration::days(2)),
            )?;
        }
    }

    log::info!("seeded {} warehouses, {} shops", warehouse_ids.len(), shop_ids.len());

    // One shop oversold into negative stock.
    if let Some(&shop_id) = shop_ids.first() {
        store.adjust_shop_stock(shop_id, Commodity::Sugar, -10_000.0)?;
    }

    // A batch dispatched days ago that nobody scanned in.
    let stale_clock = EngineClock::fixed(now - Duration::days(4));
    batch_chain::create_batch(
        store,
        &stale_clock,
        &NewBatch {
            batch_code: None,
            commodity: Commodity::Rice,
            weight: 500.0,
            warehouse_id: warehouse_ids[0],
            shop_id: shop_ids[0],
            farmer_id: None,
        },
    )?;

    // A farmer whose payment has been pending for six weeks.
    let farmer_id = store.insert_farmer(
        &NewFarmer {
            name: "R. Devi".to_string(),
            commodity: "rice".to_string(),
            warehouse_id: warehouse_ids[0],
        },
        &genesis,
    )?;
    let overdue_clock = EngineClock::fixed(now - Duration::days(42));
    batch_chain::record_farmer_supply(
        store,
        &overdue_clock,
        &NewFarmerSupply {
            farmer_id,
            batch_code: None,
            quantity: 1_200.0,
            accepted_quantity: 1_150.0,
            rejected_quantity: 50.0,
            moisture_level: 12.0,
            rate_per_kg: 28.0,
        },
    )?;

    Ok(shop_ids)
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
