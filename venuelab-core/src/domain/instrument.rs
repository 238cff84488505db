//! Instrument metadata and the commission schedule.

use super::currency::{Currency, Money};
use super::order::LiquiditySide;
use super::Symbol;
use serde::{Deserialize, Serialize};

/// Catalog entry for a tradable symbol.
///
/// `maker_fee_bps` / `taker_fee_bps` price commissions in basis points of
/// notional. `is_inverse` instruments settle in the base currency, so their
/// notional is `quantity / price` rather than `quantity * price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: Symbol,
    pub tick_size: f64,
    pub min_quantity: Option<f64>,
    pub max_quantity: Option<f64>,
    pub quote_currency: Currency,
    pub settlement_currency: Currency,
    pub is_inverse: bool,
    pub maker_fee_bps: f64,
    pub taker_fee_bps: f64,
}

impl Instrument {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<Symbol>,
        tick_size: f64,
        min_quantity: Option<f64>,
        max_quantity: Option<f64>,
        quote_currency: Currency,
        settlement_currency: Currency,
        is_inverse: bool,
        maker_fee_bps: f64,
        taker_fee_bps: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            tick_size,
            min_quantity,
            max_quantity,
            quote_currency,
            settlement_currency,
            is_inverse,
            maker_fee_bps,
            taker_fee_bps,
        }
    }

    /// Default spot FX pair: 0.0001 tick, quote-currency settlement, no
    /// quantity bounds. The quote currency is parsed from the `BBB/QQQ`
    /// symbol form.
    pub fn fx(symbol: impl Into<Symbol>) -> Self {
        let symbol = symbol.into();
        let quote = base_and_quote(&symbol)
            .map(|(_, q)| Currency::new(q))
            .unwrap_or_else(Currency::usd);
        Self {
            symbol,
            tick_size: 0.0001,
            min_quantity: None,
            max_quantity: None,
            quote_currency: quote.clone(),
            settlement_currency: quote,
            is_inverse: false,
            maker_fee_bps: 0.2,
            taker_fee_bps: 0.5,
        }
    }

    pub fn with_quantity_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_quantity = min;
        self.max_quantity = max;
        self
    }

    /// Commission for a fill, in the settlement currency.
    ///
    /// `xrate` is the reserved quanto-settlement hook; the core always passes
    /// 1.0.
    pub fn calculate_commission(
        &self,
        quantity: f64,
        fill_price: f64,
        liquidity_side: LiquiditySide,
        xrate: f64,
    ) -> Money {
        let notional = if self.is_inverse {
            quantity / fill_price
        } else {
            quantity * fill_price
        };
        let fee_bps = match liquidity_side {
            LiquiditySide::Maker => self.maker_fee_bps,
            LiquiditySide::Taker => self.taker_fee_bps,
        };
        Money::new(
            notional * (fee_bps / 10_000.0) * xrate,
            self.settlement_currency.clone(),
        )
    }
}

/// Parse a `BBB/QQQ` FX symbol into its base and quote codes.
pub fn base_and_quote(symbol: &str) -> Option<(&str, &str)> {
    symbol.split_once('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fx_default_parses_quote_currency() {
        let inst = Instrument::fx("EUR/USD");
        assert_eq!(inst.quote_currency, Currency::usd());
        assert_eq!(inst.settlement_currency, Currency::usd());
        assert_eq!(inst.tick_size, 0.0001);
    }

    #[test]
    fn commission_uses_taker_rate_for_takers() {
        let mut inst = Instrument::fx("EUR/USD");
        inst.maker_fee_bps = 1.0;
        inst.taker_fee_bps = 2.0;

        let maker = inst.calculate_commission(10_000.0, 1.1, LiquiditySide::Maker, 1.0);
        let taker = inst.calculate_commission(10_000.0, 1.1, LiquiditySide::Taker, 1.0);

        // notional 11_000: maker 1bp = 1.10, taker 2bp = 2.20
        assert!((maker.amount - 1.10).abs() < 1e-9);
        assert!((taker.amount - 2.20).abs() < 1e-9);
        assert_eq!(maker.currency, Currency::usd());
    }

    #[test]
    fn inverse_instrument_commission_divides_by_price() {
        let mut inst = Instrument::fx("XBT/USD");
        inst.is_inverse = true;
        inst.settlement_currency = Currency::new("XBT");
        inst.taker_fee_bps = 10.0;

        let c = inst.calculate_commission(50_000.0, 10_000.0, LiquiditySide::Taker, 1.0);
        // notional 5 XBT at 10bp
        assert!((c.amount - 0.005).abs() < 1e-12);
        assert_eq!(c.currency, Currency::new("XBT"));
    }

    #[test]
    fn base_and_quote_parsing() {
        assert_eq!(base_and_quote("EUR/USD"), Some(("EUR", "USD")));
        assert_eq!(base_and_quote("AAPL"), None);
    }

    #[test]
    fn quantity_bounds_builder() {
        let inst = Instrument::fx("EUR/USD").with_quantity_bounds(Some(1_000.0), Some(1e7));
        assert_eq!(inst.min_quantity, Some(1_000.0));
        assert_eq!(inst.max_quantity, Some(1e7));
    }
}
