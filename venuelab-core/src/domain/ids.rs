//! Identifier types and the venue id allocator.
//!
//! All venue-assigned identifiers are dense monotonic counters rendered into
//! stable string forms: positions and orders count per symbol
//! (`B-<symbol>-<n>`), executions count globally (`E-<n>`). Client order ids
//! arrive from the client and are never synthesized here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

macro_rules! str_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

str_id!(AccountId);
str_id!(ClientOrderId);
str_id!(OrderId);
str_id!(PositionId);
str_id!(ExecutionId);

/// Venue identifier allocator.
///
/// Position and order sequences are per-symbol; the execution sequence is
/// global. Every sequence starts at 1 and is dense (1, 2, 3, …).
#[derive(Debug, Default)]
pub struct IdAllocator {
    symbol_pos_count: HashMap<String, u64>,
    symbol_ord_count: HashMap<String, u64>,
    executions_count: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next position id for the symbol: `B-<symbol>-<n>`.
    pub fn position_id(&mut self, symbol: &str) -> PositionId {
        let n = self.symbol_pos_count.entry(symbol.to_string()).or_insert(0);
        *n += 1;
        PositionId(format!("B-{symbol}-{n}"))
    }

    /// Next venue order id for the symbol: `B-<symbol>-<n>`.
    pub fn order_id(&mut self, symbol: &str) -> OrderId {
        let n = self.symbol_ord_count.entry(symbol.to_string()).or_insert(0);
        *n += 1;
        OrderId(format!("B-{symbol}-{n}"))
    }

    /// Next global execution id: `E-<n>`.
    pub fn execution_id(&mut self) -> ExecutionId {
        self.executions_count += 1;
        ExecutionId(format!("E-{}", self.executions_count))
    }

    /// Number of executions generated so far.
    pub fn executions_count(&self) -> u64 {
        self.executions_count
    }

    /// Return every sequence to its initial state.
    pub fn reset(&mut self) {
        self.symbol_pos_count.clear();
        self.symbol_ord_count.clear();
        self.executions_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_ids_are_dense_per_symbol() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.position_id("EUR/USD").as_str(), "B-EUR/USD-1");
        assert_eq!(ids.position_id("EUR/USD").as_str(), "B-EUR/USD-2");
        assert_eq!(ids.position_id("USD/JPY").as_str(), "B-USD/JPY-1");
        assert_eq!(ids.position_id("EUR/USD").as_str(), "B-EUR/USD-3");
    }

    #[test]
    fn order_ids_count_independently_of_position_ids() {
        let mut ids = IdAllocator::new();
        ids.position_id("EUR/USD");
        ids.position_id("EUR/USD");
        assert_eq!(ids.order_id("EUR/USD").as_str(), "B-EUR/USD-1");
        assert_eq!(ids.order_id("EUR/USD").as_str(), "B-EUR/USD-2");
    }

    #[test]
    fn execution_ids_are_global() {
        let mut ids = IdAllocator::new();
        ids.order_id("EUR/USD");
        assert_eq!(ids.execution_id().as_str(), "E-1");
        assert_eq!(ids.execution_id().as_str(), "E-2");
        assert_eq!(ids.executions_count(), 2);
    }

    #[test]
    fn reset_restores_all_sequences() {
        let mut ids = IdAllocator::new();
        ids.position_id("EUR/USD");
        ids.order_id("EUR/USD");
        ids.execution_id();

        ids.reset();

        assert_eq!(ids.position_id("EUR/USD").as_str(), "B-EUR/USD-1");
        assert_eq!(ids.order_id("EUR/USD").as_str(), "B-EUR/USD-1");
        assert_eq!(ids.execution_id().as_str(), "E-1");
    }

    #[test]
    fn id_display_is_the_raw_value() {
        let id = ClientOrderId::new("O-20240102-001");
        assert_eq!(id.to_string(), "O-20240102-001");
    }
}
