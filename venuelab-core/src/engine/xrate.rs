//! Currency cross-rate lookup over the current market snapshot.
//!
//! Quote maps are keyed by FX symbol (`"EUR/USD"`); the rate from one
//! currency to another is resolved via a direct pair, the inverse pair, or a
//! single intermediate hop. Intermediates are tried in sorted symbol order so
//! resolution is deterministic.

use crate::domain::{base_and_quote, Currency};
use std::collections::HashMap;
use thiserror::Error;

/// Which side of the quote to convert at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceType {
    Bid,
    Ask,
}

#[derive(Debug, Error, PartialEq)]
pub enum XrateError {
    #[error("no conversion path from {0} to {1}")]
    NoPath(Currency, Currency),
}

/// Rate from `from` to `to` at the given price type.
///
/// `bid_quotes` / `ask_quotes` map FX symbols to their current top-of-book
/// prices; every leg of a multi-hop conversion uses the same price type.
pub fn get_rate(
    from: &Currency,
    to: &Currency,
    price_type: PriceType,
    bid_quotes: &HashMap<String, f64>,
    ask_quotes: &HashMap<String, f64>,
) -> Result<f64, XrateError> {
    if from == to {
        return Ok(1.0);
    }

    let quotes = match price_type {
        PriceType::Bid => bid_quotes,
        PriceType::Ask => ask_quotes,
    };
    let edges = build_edges(quotes);

    if let Some(rate) = direct(&edges, from.as_str(), to.as_str()) {
        return Ok(rate);
    }

    // Single intermediate hop, e.g. AUD → USD → JPY.
    if let Some(outgoing) = edges.get(from.as_str()) {
        for (mid, first_leg) in outgoing {
            if let Some(second_leg) = direct(&edges, mid, to.as_str()) {
                return Ok(first_leg * second_leg);
            }
        }
    }

    Err(XrateError::NoPath(from.clone(), to.clone()))
}

type EdgeMap = HashMap<String, Vec<(String, f64)>>;

/// Expand pair quotes into a directed edge map: each pair contributes the
/// quoted rate and its reciprocal.
fn build_edges(quotes: &HashMap<String, f64>) -> EdgeMap {
    let mut edges: EdgeMap = HashMap::new();
    let mut symbols: Vec<&String> = quotes.keys().collect();
    symbols.sort();

    for symbol in symbols {
        let Some((base, quote)) = base_and_quote(symbol) else {
            continue;
        };
        let rate = quotes[symbol];
        if rate <= 0.0 {
            continue;
        }
        edges
            .entry(base.to_string())
            .or_default()
            .push((quote.to_string(), rate));
        edges
            .entry(quote.to_string())
            .or_default()
            .push((base.to_string(), 1.0 / rate));
    }
    edges
}

fn direct(edges: &EdgeMap, from: &str, to: &str) -> Option<f64> {
    edges
        .get(from)?
        .iter()
        .find(|(code, _)| code == to)
        .map(|(_, rate)| *rate)
}
