//! Collaborator capabilities registered with the exchange.
//!
//! The exchange is single-threaded and synchronous: event handlers run on
//! the caller and must not re-enter the exchange during emission.

use crate::domain::{AccountId, AccountState, ClientOrderId, Order, OrderEvent, Position, PositionId, QuoteTick};
use chrono::{DateTime, Utc};

/// The downstream execution client: consumes lifecycle and account events
/// and names the account the exchange trades.
pub trait ExecutionClient {
    fn account_id(&self) -> AccountId;

    fn handle_order_event(&self, event: OrderEvent);

    fn handle_account_event(&self, state: AccountState);
}

/// Read-only lookup of orders and positions maintained outside the core.
/// The exchange never mutates it.
pub trait ExecutionCache {
    fn position(&self, id: &PositionId) -> Option<Position>;

    fn order(&self, cl_ord_id: &ClientOrderId) -> Option<Order>;
}

/// A plug-in simulation given every tick before order matching, in
/// registration order.
pub trait SimulationModule {
    fn process(&mut self, tick: &QuoteTick, now: DateTime<Utc>);

    fn reset(&mut self);
}
