//! Lifecycle events emitted by the exchange.
//!
//! Every event carries a fresh UUID and two timestamps (event time and
//! submission time); in the simulation both equal the clock value set from
//! the triggering tick or command.

use super::currency::{Currency, Money};
use super::ids::{AccountId, ClientOrderId, ExecutionId, OrderId, PositionId};
use super::order::{LiquiditySide, OrderSide};
use super::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An order lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub event_id: Uuid,
    pub ts_event: DateTime<Utc>,
    pub ts_init: DateTime<Utc>,
    pub kind: OrderEventKind,
}

impl OrderEvent {
    /// The client order id the event concerns.
    pub fn cl_ord_id(&self) -> &ClientOrderId {
        match &self.kind {
            OrderEventKind::Submitted { cl_ord_id, .. }
            | OrderEventKind::Accepted { cl_ord_id, .. }
            | OrderEventKind::Rejected { cl_ord_id, .. }
            | OrderEventKind::Working { cl_ord_id, .. }
            | OrderEventKind::Modified { cl_ord_id, .. }
            | OrderEventKind::Cancelled { cl_ord_id, .. }
            | OrderEventKind::CancelReject { cl_ord_id, .. }
            | OrderEventKind::Expired { cl_ord_id, .. } => cl_ord_id,
            OrderEventKind::Filled(fill) => &fill.cl_ord_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderEventKind {
    Submitted {
        cl_ord_id: ClientOrderId,
        symbol: Symbol,
    },
    Accepted {
        cl_ord_id: ClientOrderId,
        venue_order_id: OrderId,
        symbol: Symbol,
    },
    Rejected {
        cl_ord_id: ClientOrderId,
        symbol: Symbol,
        reason: String,
    },
    Working {
        cl_ord_id: ClientOrderId,
        venue_order_id: OrderId,
        symbol: Symbol,
    },
    Modified {
        cl_ord_id: ClientOrderId,
        venue_order_id: OrderId,
        quantity: f64,
        price: f64,
    },
    Cancelled {
        cl_ord_id: ClientOrderId,
        venue_order_id: OrderId,
        symbol: Symbol,
    },
    CancelReject {
        cl_ord_id: ClientOrderId,
        response: String,
        reason: String,
    },
    Expired {
        cl_ord_id: ClientOrderId,
        venue_order_id: OrderId,
        symbol: Symbol,
    },
    Filled(OrderFilled),
}

/// A completed execution. No partial fills: `filled_qty` is always the full
/// order quantity and `leaves_qty` is always zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFilled {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
    pub venue_order_id: OrderId,
    pub execution_id: ExecutionId,
    pub position_id: PositionId,
    /// Placeholder: strategies are resolved downstream, not at the venue.
    pub strategy_id: Option<String>,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub filled_qty: f64,
    pub leaves_qty: f64,
    pub avg_price: f64,
    pub quote_currency: Currency,
    pub settlement_currency: Currency,
    pub is_inverse: bool,
    pub commission: Money,
    pub liquidity_side: LiquiditySide,
}

/// Snapshot of the account after a mutation.
///
/// There is no margin model in the core, so the margin fields mirror the
/// balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub account_id: AccountId,
    pub currency: Currency,
    pub balance: Money,
    pub margin_balance: Money,
    pub margin_available: Money,
    pub event_id: Uuid,
    pub ts_event: DateTime<Utc>,
}

/// Generates fresh event ids. Injected into the exchange so event identity
/// never depends on ambient process state.
#[derive(Debug, Default, Clone)]
pub struct EventIdFactory;

impl EventIdFactory {
    pub fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}
