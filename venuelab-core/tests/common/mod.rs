//! Shared test harness: a recording execution client plus the external
//! position cache the exchange reads, maintained from the fill stream the
//! way the downstream execution engine would.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, TimeZone, Utc};
use venuelab_core::domain::{
    AccountId, AccountState, ClientOrderId, Instrument, Order, OrderEvent, OrderEventKind,
    OrderFilled, OrderSide, OrderType, Position, PositionId, QuoteTick, SubmitOrder,
};
use venuelab_core::engine::{
    ExchangeConfig, ExecutionCache, ExecutionClient, FillModel, SimulatedExchange,
};

pub const ACCOUNT: &str = "SIM-001";
pub const EURUSD: &str = "EUR/USD";

// ── External cache ───────────────────────────────────────────────────

/// Positions live outside the exchange; the core only reads them.
#[derive(Default)]
pub struct TestCache {
    positions: RefCell<HashMap<PositionId, Position>>,
    orders: RefCell<HashMap<ClientOrderId, Order>>,
}

impl TestCache {
    pub fn position_snapshot(&self, id: &PositionId) -> Option<Position> {
        self.positions.borrow().get(id).cloned()
    }

    pub fn apply_fill(&self, fill: &OrderFilled) {
        let mut positions = self.positions.borrow_mut();
        match positions.get_mut(&fill.position_id) {
            Some(position) => position.apply(fill),
            None => {
                positions.insert(fill.position_id.clone(), Position::from_fill(fill));
            }
        }
    }
}

impl ExecutionCache for TestCache {
    fn position(&self, id: &PositionId) -> Option<Position> {
        self.positions.borrow().get(id).cloned()
    }

    fn order(&self, cl_ord_id: &ClientOrderId) -> Option<Order> {
        self.orders.borrow().get(cl_ord_id).cloned()
    }
}

// ── Recording client ─────────────────────────────────────────────────

/// Records every event and keeps the position cache in sync with fills.
pub struct RecordingClient {
    events: Rc<RefCell<Vec<OrderEvent>>>,
    account_states: Rc<RefCell<Vec<AccountState>>>,
    cache: Rc<TestCache>,
}

impl ExecutionClient for RecordingClient {
    fn account_id(&self) -> AccountId {
        AccountId::new(ACCOUNT)
    }

    fn handle_order_event(&self, event: OrderEvent) {
        if let OrderEventKind::Filled(fill) = &event.kind {
            self.cache.apply_fill(fill);
        }
        self.events.borrow_mut().push(event);
    }

    fn handle_account_event(&self, state: AccountState) {
        self.account_states.borrow_mut().push(state);
    }
}

// ── Harness ──────────────────────────────────────────────────────────

pub struct Harness {
    pub exchange: SimulatedExchange,
    pub cache: Rc<TestCache>,
    events: Rc<RefCell<Vec<OrderEvent>>>,
    account_states: Rc<RefCell<Vec<AccountState>>>,
}

impl Harness {
    pub fn events(&self) -> Vec<OrderEvent> {
        self.events.borrow().clone()
    }

    pub fn account_states(&self) -> Vec<AccountState> {
        self.account_states.borrow().clone()
    }

    pub fn last_balance(&self) -> f64 {
        self.account_states
            .borrow()
            .last()
            .expect("no account state issued")
            .balance
            .amount
    }

    pub fn fills(&self) -> Vec<OrderFilled> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match &e.kind {
                OrderEventKind::Filled(fill) => Some(fill.clone()),
                _ => None,
            })
            .collect()
    }

    /// (cl_ord_id, reason) of every OrderRejected.
    pub fn rejects(&self) -> Vec<(ClientOrderId, String)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match &e.kind {
                OrderEventKind::Rejected {
                    cl_ord_id, reason, ..
                } => Some((cl_ord_id.clone(), reason.clone())),
                _ => None,
            })
            .collect()
    }

    /// (cl_ord_id, response, reason) of every OrderCancelReject.
    pub fn cancel_rejects(&self) -> Vec<(ClientOrderId, String, String)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match &e.kind {
                OrderEventKind::CancelReject {
                    cl_ord_id,
                    response,
                    reason,
                } => Some((cl_ord_id.clone(), response.clone(), reason.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn cancelled_ids(&self) -> Vec<ClientOrderId> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match &e.kind {
                OrderEventKind::Cancelled { cl_ord_id, .. } => Some(cl_ord_id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn working_ids(&self) -> Vec<ClientOrderId> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match &e.kind {
                OrderEventKind::Working { cl_ord_id, .. } => Some(cl_ord_id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
        self.account_states.borrow_mut().clear();
    }
}

/// A registered exchange with the EUR/USD instrument installed.
pub fn harness(config: ExchangeConfig, fill_model: FillModel) -> Harness {
    let cache = Rc::new(TestCache::default());
    let cache_concrete: Rc<TestCache> = Rc::clone(&cache);
    let cache_handle: Rc<dyn ExecutionCache> = cache_concrete;
    let mut exchange = SimulatedExchange::new(config, fill_model, cache_handle);
    let events = Rc::new(RefCell::new(Vec::new()));
    let account_states = Rc::new(RefCell::new(Vec::new()));
    let client = RecordingClient {
        events: Rc::clone(&events),
        account_states: Rc::clone(&account_states),
        cache: Rc::clone(&cache),
    };
    exchange.register_client(Box::new(client)).unwrap();
    exchange.add_instrument(Instrument::fx(EURUSD));
    Harness {
        exchange,
        cache,
        events,
        account_states,
    }
}

/// Deterministic fill model: strict penetration only, no touch fills, no
/// slippage.
pub fn no_edge_fills() -> FillModel {
    FillModel::new(0.0, 0.0, 0.0, Some(1)).unwrap()
}

/// Deterministic fill model: stops and limits fill on exact touch, no
/// slippage.
pub fn touch_fills() -> FillModel {
    FillModel::new(1.0, 1.0, 0.0, Some(1)).unwrap()
}

// ── Builders ─────────────────────────────────────────────────────────

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap()
}

pub fn t_plus(seconds: i64) -> DateTime<Utc> {
    t0() + chrono::Duration::seconds(seconds)
}

pub fn tick(bid: f64, ask: f64, at: DateTime<Utc>) -> QuoteTick {
    QuoteTick::new(EURUSD, bid, ask, at)
}

pub fn market_order(id: &str, side: OrderSide, quantity: f64) -> Order {
    Order::new(ClientOrderId::new(id), EURUSD, side, OrderType::Market, quantity)
}

pub fn limit_order(id: &str, side: OrderSide, price: f64, quantity: f64, post_only: bool) -> Order {
    Order::new(
        ClientOrderId::new(id),
        EURUSD,
        side,
        OrderType::Limit { price, post_only },
        quantity,
    )
}

pub fn stop_order(id: &str, side: OrderSide, trigger: f64, quantity: f64) -> Order {
    Order::new(
        ClientOrderId::new(id),
        EURUSD,
        side,
        OrderType::StopMarket { trigger },
        quantity,
    )
}

pub fn submit(order: Order) -> SubmitOrder {
    SubmitOrder {
        account_id: AccountId::new(ACCOUNT),
        order,
        position_id: None,
    }
}

pub fn cl(id: &str) -> ClientOrderId {
    ClientOrderId::new(id)
}
