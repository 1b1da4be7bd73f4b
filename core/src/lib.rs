//! rationtrace-core — risk scoring and anomaly detection for a public
//! ration-distribution network.
//!
//! The engine converts raw transactional counters (stock-out flags, price
//! violations, after-hours activity, damage claims, complaints, QR scan
//! irregularities, payment delays) into bounded 0–100 risk scores per shop
//! and warehouse, forecasts commodity shortages, and sweeps the store for
//! cross-table anomalies. The HTTP layer that feeds the counters is an
//! external caller: it invokes these functions after each state-changing
//! operation and persists what they return.
//!
//! Unknown entity ids degrade to zero-valued results instead of erroring;
//! callers check for the sentinel.

pub mod batch_chain;
pub mod clock;
pub mod config;
pub mod diversion;
pub mod error;
pub mod extended;
pub mod forecast;
pub mod shop_risk;
pub mod store;
pub mod sweep;
pub mod types;
pub mod warehouse_risk;
