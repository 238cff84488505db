//! Order variants, lifecycle states, transitions, and brackets.

use super::ids::{ClientOrderId, OrderId};
use super::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn flipped(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

/// Which side of the spread a fill took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquiditySide {
    /// Rested on the book and was hit.
    Maker,
    /// Crossed the spread.
    Taker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    Gtc,
    Day,
    Ioc,
    Fok,
    Gtd,
}

/// Order-management style. Retained for downstream consumers; the exchange
/// core does not interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OmsType {
    Netting,
    Hedging,
}

/// What kind of order and its price parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderType {
    /// Fill immediately at the current top of book.
    Market,
    /// Fill at `price` or better.
    Limit { price: f64, post_only: bool },
    /// Becomes marketable when the touch reaches `trigger`.
    StopMarket { trigger: f64 },
}

impl OrderType {
    /// The working price, where one exists.
    pub fn price(&self) -> Option<f64> {
        match self {
            Self::Market => None,
            Self::Limit { price, .. } => Some(*price),
            Self::StopMarket { trigger } => Some(*trigger),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::Limit { .. } => "LIMIT",
            Self::StopMarket { .. } => "STOP_MARKET",
        }
    }
}

/// Order lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Initialized,
    Submitted,
    Accepted,
    Working,
    Filled,
    Cancelled,
    Rejected,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Cancelled | Self::Rejected | Self::Expired
        )
    }
}

/// A single order through its whole lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub cl_ord_id: ClientOrderId,
    /// Venue order id, assigned on accept.
    pub venue_order_id: Option<OrderId>,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: f64,
    pub time_in_force: TimeInForce,
    pub expire_time: Option<DateTime<Utc>>,
    pub status: OrderStatus,
}

impl Order {
    pub fn new(
        cl_ord_id: ClientOrderId,
        symbol: impl Into<Symbol>,
        side: OrderSide,
        order_type: OrderType,
        quantity: f64,
    ) -> Self {
        Self {
            cl_ord_id,
            venue_order_id: None,
            symbol: symbol.into(),
            side,
            order_type,
            quantity,
            time_in_force: TimeInForce::Gtc,
            expire_time: None,
            status: OrderStatus::Initialized,
        }
    }

    /// Good-till-date: expires once the simulated clock reaches `expire_time`.
    pub fn with_expire_time(mut self, expire_time: DateTime<Utc>) -> Self {
        self.time_in_force = TimeInForce::Gtd;
        self.expire_time = Some(expire_time);
        self
    }

    pub fn price(&self) -> Option<f64> {
        self.order_type.price()
    }

    /// Replace the working price in place (modify command path).
    pub fn set_price(&mut self, new_price: f64) {
        match &mut self.order_type {
            OrderType::Market => {}
            OrderType::Limit { price, .. } => *price = new_price,
            OrderType::StopMarket { trigger } => *trigger = new_price,
        }
    }

    pub fn is_post_only(&self) -> bool {
        matches!(self.order_type, OrderType::Limit { post_only: true, .. })
    }

    pub fn is_working(&self) -> bool {
        self.status == OrderStatus::Working
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    // ── Transitions ────────────────────────────────────────────────────

    pub fn set_submitted(&mut self) {
        self.status = OrderStatus::Submitted;
    }

    pub fn set_accepted(&mut self, venue_order_id: OrderId) {
        self.venue_order_id = Some(venue_order_id);
        self.status = OrderStatus::Accepted;
    }

    pub fn set_working(&mut self) {
        self.status = OrderStatus::Working;
    }

    pub fn set_filled(&mut self) {
        self.status = OrderStatus::Filled;
    }

    pub fn set_cancelled(&mut self) {
        self.status = OrderStatus::Cancelled;
    }

    pub fn set_rejected(&mut self) {
        self.status = OrderStatus::Rejected;
    }

    pub fn set_expired(&mut self) {
        self.status = OrderStatus::Expired;
    }
}

/// A bracket order: entry + stop-loss + optional take-profit.
///
/// The protective children become working only after the entry fills; when
/// both are present they are linked one-cancels-other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketOrder {
    pub entry: Order,
    pub stop_loss: Order,
    pub take_profit: Option<Order>,
}

impl BracketOrder {
    pub fn new(entry: Order, stop_loss: Order, take_profit: Option<Order>) -> Self {
        debug_assert_eq!(entry.symbol, stop_loss.symbol, "bracket symbol mismatch");
        Self {
            entry,
            stop_loss,
            take_profit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit_buy(id: &str, price: f64) -> Order {
        Order::new(
            ClientOrderId::new(id),
            "EUR/USD",
            OrderSide::Buy,
            OrderType::Limit {
                price,
                post_only: false,
            },
            10_000.0,
        )
    }

    #[test]
    fn lifecycle_through_working() {
        let mut order = limit_buy("O-1", 1.1000);
        assert_eq!(order.status, OrderStatus::Initialized);

        order.set_submitted();
        order.set_accepted(OrderId::new("B-EUR/USD-1"));
        assert_eq!(order.status, OrderStatus::Accepted);
        assert_eq!(order.venue_order_id, Some(OrderId::new("B-EUR/USD-1")));

        order.set_working();
        assert!(order.is_working());
        assert!(!order.is_completed());

        order.set_filled();
        assert!(order.is_completed());
        assert!(!order.is_working());
    }

    #[test]
    fn terminal_states() {
        for (set, expected) in [
            (Order::set_cancelled as fn(&mut Order), OrderStatus::Cancelled),
            (Order::set_rejected, OrderStatus::Rejected),
            (Order::set_expired, OrderStatus::Expired),
            (Order::set_filled, OrderStatus::Filled),
        ] {
            let mut order = limit_buy("O-1", 1.1000);
            set(&mut order);
            assert_eq!(order.status, expected);
            assert!(order.is_completed());
        }
    }

    #[test]
    fn price_accessors() {
        let order = limit_buy("O-1", 1.1000);
        assert_eq!(order.price(), Some(1.1000));

        let market = Order::new(
            ClientOrderId::new("O-2"),
            "EUR/USD",
            OrderSide::Sell,
            OrderType::Market,
            1.0,
        );
        assert_eq!(market.price(), None);
    }

    #[test]
    fn set_price_replaces_working_price() {
        let mut order = limit_buy("O-1", 1.1000);
        order.set_price(1.0950);
        assert_eq!(order.price(), Some(1.0950));

        let mut stop = Order::new(
            ClientOrderId::new("O-2"),
            "EUR/USD",
            OrderSide::Sell,
            OrderType::StopMarket { trigger: 1.0990 },
            1.0,
        );
        stop.set_price(1.0980);
        assert_eq!(stop.price(), Some(1.0980));
    }

    #[test]
    fn gtd_builder_sets_time_in_force() {
        let t = chrono::DateTime::<Utc>::UNIX_EPOCH;
        let order = limit_buy("O-1", 1.1000).with_expire_time(t);
        assert_eq!(order.time_in_force, TimeInForce::Gtd);
        assert_eq!(order.expire_time, Some(t));
    }

    #[test]
    fn post_only_detection() {
        let mut order = limit_buy("O-1", 1.1000);
        assert!(!order.is_post_only());
        order.order_type = OrderType::Limit {
            price: 1.1000,
            post_only: true,
        };
        assert!(order.is_post_only());
    }

    #[test]
    fn order_serialization_roundtrip() {
        let order = limit_buy("O-1", 1.1000);
        let json = serde_json::to_string(&order).unwrap();
        let deser: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deser);
    }
}
