//! Top-of-book quote ticks.

use super::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single top-of-book update. The exchange never sees depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteTick {
    pub symbol: Symbol,
    pub bid: f64,
    pub ask: f64,
    pub timestamp: DateTime<Utc>,
}

impl QuoteTick {
    pub fn new(symbol: impl Into<Symbol>, bid: f64, ask: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            bid,
            ask,
            timestamp,
        }
    }

    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_is_ask_minus_bid() {
        let tick = QuoteTick::new(
            "EUR/USD",
            1.1000,
            1.1002,
            DateTime::<Utc>::UNIX_EPOCH,
        );
        assert!((tick.spread() - 0.0002).abs() < 1e-12);
    }
}
