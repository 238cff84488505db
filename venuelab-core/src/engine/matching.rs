//! Fill decision — does a tick fill a working order?
//!
//! Pure decision logic, separated from book mutation. Strict price
//! penetration fills definitely; an exact touch consults the fill model.
//! Stop fills cross the spread (TAKER) and may slip one tick against the
//! order; limit fills rest (MAKER) and always execute at the order's own
//! price.

use crate::domain::{LiquiditySide, Order, OrderSide, OrderType, QuoteTick};

use super::fill_model::FillModel;

/// Outcome of checking one working order against one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    NoFill,
    Fill {
        price: f64,
        liquidity: LiquiditySide,
    },
}

/// Evaluate the fill decision table for a working order.
///
/// Market orders never reach this function: they fill at submission time.
pub fn check_fill(
    order: &Order,
    tick: &QuoteTick,
    tick_size: f64,
    fill_model: &mut FillModel,
) -> MatchResult {
    debug_assert_eq!(order.symbol, tick.symbol, "tick symbol mismatch");

    match (&order.order_type, order.side) {
        (OrderType::StopMarket { trigger }, OrderSide::Buy) => {
            if tick.ask > *trigger || (tick.ask == *trigger && fill_model.is_stop_filled()) {
                stop_fill(*trigger, OrderSide::Buy, tick_size, fill_model)
            } else {
                MatchResult::NoFill
            }
        }
        (OrderType::StopMarket { trigger }, OrderSide::Sell) => {
            if tick.bid < *trigger || (tick.bid == *trigger && fill_model.is_stop_filled()) {
                stop_fill(*trigger, OrderSide::Sell, tick_size, fill_model)
            } else {
                MatchResult::NoFill
            }
        }
        (OrderType::Limit { price, .. }, OrderSide::Buy) => {
            if tick.ask < *price || (tick.ask == *price && fill_model.is_limit_filled()) {
                MatchResult::Fill {
                    price: *price,
                    liquidity: LiquiditySide::Maker,
                }
            } else {
                MatchResult::NoFill
            }
        }
        (OrderType::Limit { price, .. }, OrderSide::Sell) => {
            if tick.bid > *price || (tick.bid == *price && fill_model.is_limit_filled()) {
                MatchResult::Fill {
                    price: *price,
                    liquidity: LiquiditySide::Maker,
                }
            } else {
                MatchResult::NoFill
            }
        }
        (OrderType::Market, _) => MatchResult::NoFill,
    }
}

/// A triggered stop fills at its trigger price, shifted one tick against the
/// order when the fill model says it slipped.
fn stop_fill(
    trigger: f64,
    side: OrderSide,
    tick_size: f64,
    fill_model: &mut FillModel,
) -> MatchResult {
    let price = if fill_model.is_slipped() {
        match side {
            OrderSide::Buy => trigger + tick_size,
            OrderSide::Sell => trigger - tick_size,
        }
    } else {
        trigger
    };
    MatchResult::Fill {
        price,
        liquidity: LiquiditySide::Taker,
    }
}
