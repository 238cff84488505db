//! VenueLab Core — a simulated exchange for deterministic backtests.
//!
//! This crate contains the heart of the venue simulation:
//! - Domain types (orders, quote ticks, instruments, positions, accounts,
//!   lifecycle events)
//! - Tick-driven matching engine with a seeded stochastic fill model
//! - Bracket (entry + protective children) and OCO linked-order bookkeeping
//! - Commission and realized-PnL account mutation with cross-rate conversion
//! - Dense per-symbol venue identifier allocation
//!
//! The exchange is strictly single-threaded: ticks and commands run to
//! completion on the caller, and every event emission is a synchronous call
//! into the registered execution client.

pub mod domain;
pub mod engine;
