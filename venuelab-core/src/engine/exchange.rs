//! The simulated exchange — tick-driven matching, order lifecycle, linked
//! orders, and account accounting.
//!
//! A single-threaded state machine. Quote ticks advance the simulated clock,
//! refresh the per-symbol market snapshot, and sweep the working-order book
//! for fills and expiries. Commands (submit / submit-bracket / modify /
//! cancel) mutate state and emit lifecycle events synchronously on the
//! caller. Linked-order bookkeeping lives in side tables keyed by stable
//! ids: `child_orders` (bracket parent → children), the symmetric
//! `oco_orders` pair table, and `position_oco_orders` (position →
//! protecting orders).
//!
//! Rule violations surface as events (`OrderRejected`, `OrderCancelReject`)
//! so the event log stays linear and replayable; state-machine violations
//! are logged at error level and skipped; only conditions the backtest
//! cannot survive (unknown instrument, missing client) are `Err`.

use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::domain::{
    Account, AccountId, AccountState, BracketOrder, CancelOrder, ClientOrderId, Currency,
    EventIdFactory, IdAllocator, Instrument, LiquiditySide, ModifyOrder, Money, Order, OrderEvent,
    OrderEventKind, OrderFilled, OrderId, OrderSide, OrderStatus, OrderType, PositionId, QuoteTick,
    SubmitBracketOrder, SubmitOrder, Symbol,
};

use super::clock::SimClock;
use super::config::ExchangeConfig;
use super::fill_model::FillModel;
use super::matching::{check_fill, MatchResult};
use super::traits::{ExecutionCache, ExecutionClient, SimulationModule};
use super::xrate::{get_rate, PriceType, XrateError};

/// Reserved quanto-settlement hook; the core always converts commissions at
/// unity and leaves non-unit settlement rates to a future extension.
const QUANTO_XRATE: f64 = 1.0;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("no instrument registered for symbol {0}")]
    InstrumentNotFound(Symbol),

    #[error("no execution client registered")]
    ClientNotRegistered,

    #[error("an execution client is already registered")]
    ClientAlreadyRegistered,

    #[error("order {0} has no venue order id assigned")]
    VenueOrderIdMissing(ClientOrderId),

    #[error("cannot convert {0} into the account currency")]
    NoExchangeRate(Currency, #[source] XrateError),
}

/// The simulated exchange.
pub struct SimulatedExchange {
    config: ExchangeConfig,
    clock: SimClock,
    fill_model: FillModel,
    event_ids: EventIdFactory,

    instruments: HashMap<Symbol, Instrument>,
    market: HashMap<Symbol, QuoteTick>,
    account: Account,
    ids: IdAllocator,

    /// Exactly the orders in WORKING state.
    working_orders: HashMap<ClientOrderId, Order>,
    /// Pre-assigned position for an order (bracket legs, client-directed fills).
    position_index: HashMap<ClientOrderId, PositionId>,
    /// Bracket parent → children, in submission order.
    child_orders: HashMap<ClientOrderId, Vec<Order>>,
    /// Symmetric OCO pair table: both directions are stored and removed together.
    oco_orders: HashMap<ClientOrderId, ClientOrderId>,
    /// Protecting orders keyed by the position they guard.
    position_oco_orders: HashMap<PositionId, Vec<Order>>,

    modules: Vec<Box<dyn SimulationModule>>,
    client: Option<Box<dyn ExecutionClient>>,
    cache: Rc<dyn ExecutionCache>,
}

impl SimulatedExchange {
    pub fn new(
        config: ExchangeConfig,
        fill_model: FillModel,
        cache: Rc<dyn ExecutionCache>,
    ) -> Self {
        let account = Account::new(
            AccountId::new("SIM-000"),
            config.starting_capital.clone(),
            config.frozen_account,
        );
        Self {
            config,
            clock: SimClock::new(),
            fill_model,
            event_ids: EventIdFactory,
            instruments: HashMap::new(),
            market: HashMap::new(),
            account,
            ids: IdAllocator::new(),
            working_orders: HashMap::new(),
            position_index: HashMap::new(),
            child_orders: HashMap::new(),
            oco_orders: HashMap::new(),
            position_oco_orders: HashMap::new(),
            modules: Vec::new(),
            client: None,
            cache,
        }
    }

    // ── Registration ───────────────────────────────────────────────────

    /// Register the execution client (event sink). Exactly once; issues the
    /// initial account state.
    pub fn register_client(
        &mut self,
        client: Box<dyn ExecutionClient>,
    ) -> Result<(), ExchangeError> {
        if self.client.is_some() {
            return Err(ExchangeError::ClientAlreadyRegistered);
        }
        let account_id = client.account_id();
        self.account = Account::new(
            account_id,
            self.config.starting_capital.clone(),
            self.config.frozen_account,
        );
        self.client = Some(client);
        self.issue_account_state();
        Ok(())
    }

    /// Register a simulation module; modules run in registration order on
    /// every tick, before order matching.
    pub fn register_module(&mut self, module: Box<dyn SimulationModule>) {
        self.modules.push(module);
    }

    pub fn add_instrument(&mut self, instrument: Instrument) {
        self.instruments.insert(instrument.symbol.clone(), instrument);
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn working_orders(&self) -> &HashMap<ClientOrderId, Order> {
        &self.working_orders
    }

    pub fn child_orders(&self) -> &HashMap<ClientOrderId, Vec<Order>> {
        &self.child_orders
    }

    pub fn oco_sibling(&self, cl_ord_id: &ClientOrderId) -> Option<&ClientOrderId> {
        self.oco_orders.get(cl_ord_id)
    }

    pub fn oco_orders(&self) -> &HashMap<ClientOrderId, ClientOrderId> {
        &self.oco_orders
    }

    pub fn position_oco_orders(&self) -> &HashMap<PositionId, Vec<Order>> {
        &self.position_oco_orders
    }

    pub fn position_index(&self) -> &HashMap<ClientOrderId, PositionId> {
        &self.position_index
    }

    // ── Tick processing ────────────────────────────────────────────────

    /// Advance the clock, refresh the market snapshot, run simulation
    /// modules, then sweep working orders on the tick's symbol for fills and
    /// expiries.
    ///
    /// The sweep runs over a snapshot copy so fills can remove orders
    /// mid-loop; orders that become working *during* the sweep (bracket
    /// children) are not visited until a later tick.
    pub fn process_tick(&mut self, tick: &QuoteTick) -> Result<(), ExchangeError> {
        self.clock.set_time(tick.timestamp);
        let now = self.clock.now();

        self.market.insert(tick.symbol.clone(), tick.clone());

        for module in &mut self.modules {
            module.process(tick, now);
        }

        let snapshot: Vec<Order> = self
            .working_orders
            .values()
            .filter(|o| o.symbol == tick.symbol)
            .cloned()
            .collect();

        for order in snapshot {
            let cl_ord_id = order.cl_ord_id.clone();
            // An earlier fill's OCO cascade may have removed this order.
            if !self.working_orders.contains_key(&cl_ord_id) {
                continue;
            }
            let tick_size = self
                .instruments
                .get(&order.symbol)
                .map(|i| i.tick_size)
                .ok_or_else(|| ExchangeError::InstrumentNotFound(order.symbol.clone()))?;

            match check_fill(&order, tick, tick_size, &mut self.fill_model) {
                MatchResult::Fill { price, liquidity } => {
                    if let Some(working) = self.working_orders.remove(&cl_ord_id) {
                        self.fill_order(working, price, liquidity)?;
                    }
                }
                MatchResult::NoFill => {
                    if let Some(expire_time) = order.expire_time {
                        if now >= expire_time {
                            if let Some(mut expired) = self.working_orders.remove(&cl_ord_id) {
                                expired.set_expired();
                                self.emit_expired(&expired);
                                self.check_oco_order(&cl_ord_id);
                                self.clean_up_child_orders(&cl_ord_id);
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    // ── Command handlers ───────────────────────────────────────────────

    pub fn handle_submit_order(&mut self, command: SubmitOrder) -> Result<(), ExchangeError> {
        self.require_client()?;
        let SubmitOrder {
            mut order,
            position_id,
            ..
        } = command;

        if let Some(position_id) = position_id {
            self.position_index
                .insert(order.cl_ord_id.clone(), position_id);
        }

        order.set_submitted();
        self.emit(OrderEventKind::Submitted {
            cl_ord_id: order.cl_ord_id.clone(),
            symbol: order.symbol.clone(),
        });
        self.process_order(order)
    }

    /// Submit an entry plus protective children. The children are recorded
    /// (and OCO-linked when both exist) but only the entry is processed now;
    /// children go live when the entry fills.
    pub fn handle_submit_bracket_order(
        &mut self,
        command: SubmitBracketOrder,
    ) -> Result<(), ExchangeError> {
        self.require_client()?;
        let BracketOrder {
            mut entry,
            mut stop_loss,
            mut take_profit,
        } = command.bracket;

        let position_id = self.ids.position_id(&entry.symbol);

        entry.set_submitted();
        stop_loss.set_submitted();
        if let Some(tp) = take_profit.as_mut() {
            tp.set_submitted();
        }

        self.position_index
            .insert(entry.cl_ord_id.clone(), position_id.clone());
        self.position_index
            .insert(stop_loss.cl_ord_id.clone(), position_id.clone());
        if let Some(tp) = &take_profit {
            self.position_index
                .insert(tp.cl_ord_id.clone(), position_id.clone());
        }

        let mut children = vec![stop_loss.clone()];
        let mut protecting = vec![stop_loss.clone()];
        if let Some(tp) = &take_profit {
            self.oco_orders
                .insert(tp.cl_ord_id.clone(), stop_loss.cl_ord_id.clone());
            self.oco_orders
                .insert(stop_loss.cl_ord_id.clone(), tp.cl_ord_id.clone());
            children.push(tp.clone());
            protecting.push(tp.clone());
        }
        self.child_orders.insert(entry.cl_ord_id.clone(), children);
        self.position_oco_orders.insert(position_id, protecting);

        self.emit(OrderEventKind::Submitted {
            cl_ord_id: entry.cl_ord_id.clone(),
            symbol: entry.symbol.clone(),
        });
        self.emit(OrderEventKind::Submitted {
            cl_ord_id: stop_loss.cl_ord_id.clone(),
            symbol: stop_loss.symbol.clone(),
        });
        if let Some(tp) = &take_profit {
            self.emit(OrderEventKind::Submitted {
                cl_ord_id: tp.cl_ord_id.clone(),
                symbol: tp.symbol.clone(),
            });
        }

        self.process_order(entry)
    }

    pub fn handle_cancel_order(&mut self, command: CancelOrder) -> Result<(), ExchangeError> {
        self.require_client()?;
        match self.working_orders.remove(&command.cl_ord_id) {
            None => {
                self.emit(OrderEventKind::CancelReject {
                    cl_ord_id: command.cl_ord_id,
                    response: "cancel order".into(),
                    reason: "order not found".into(),
                });
            }
            Some(mut order) => {
                order.set_cancelled();
                self.emit_cancelled(&order);
                self.check_oco_order(&command.cl_ord_id);
            }
        }
        Ok(())
    }

    /// Modify a working order's quantity and price. The new price is
    /// re-validated against the current market; a crossing non-post-only
    /// limit fills immediately as a TAKER (no re-accept — the order is
    /// already past ACCEPTED).
    pub fn handle_modify_order(&mut self, command: ModifyOrder) -> Result<(), ExchangeError> {
        self.require_client()?;
        let Some(order) = self.working_orders.get(&command.cl_ord_id) else {
            self.emit(OrderEventKind::CancelReject {
                cl_ord_id: command.cl_ord_id,
                response: "modify order".into(),
                reason: "order not found".into(),
            });
            return Ok(());
        };

        if command.quantity <= 0.0 {
            self.emit(OrderEventKind::CancelReject {
                cl_ord_id: command.cl_ord_id,
                response: "modify order".into(),
                reason: format!("modified quantity {} is invalid", command.quantity),
            });
            return Ok(());
        }

        let side = order.side;
        let type_name = order.order_type.name();
        let post_only = order.is_post_only();
        let is_limit = matches!(order.order_type, OrderType::Limit { .. });
        let is_stop = matches!(order.order_type, OrderType::StopMarket { .. });

        let Some(market) = self.market.get(&order.symbol).cloned() else {
            let reason = format!("no market for {}", order.symbol);
            self.emit(OrderEventKind::CancelReject {
                cl_ord_id: command.cl_ord_id,
                response: "modify order".into(),
                reason,
            });
            return Ok(());
        };

        if is_stop {
            let wrong_side = match side {
                OrderSide::Buy => command.price < market.ask,
                OrderSide::Sell => command.price > market.bid,
            };
            if wrong_side {
                self.emit(OrderEventKind::CancelReject {
                    cl_ord_id: command.cl_ord_id,
                    response: "modify order".into(),
                    reason: format!(
                        "modified {} {} order price of {} is too far from the market, bid={}, ask={}",
                        side.as_str(),
                        type_name,
                        command.price,
                        market.bid,
                        market.ask
                    ),
                });
                return Ok(());
            }
        }

        if is_limit {
            let crosses = match side {
                OrderSide::Buy => command.price >= market.ask,
                OrderSide::Sell => command.price <= market.bid,
            };
            if crosses {
                if post_only {
                    self.emit(OrderEventKind::CancelReject {
                        cl_ord_id: command.cl_ord_id,
                        response: "modify order".into(),
                        reason: format!(
                            "modified {} {} order price of {} is too far from the market, bid={}, ask={}",
                            side.as_str(),
                            type_name,
                            command.price,
                            market.bid,
                            market.ask
                        ),
                    });
                    return Ok(());
                }
                if let Some(mut working) = self.working_orders.remove(&command.cl_ord_id) {
                    working.quantity = command.quantity;
                    working.set_price(command.price);
                    let fill_price = match side {
                        OrderSide::Buy => market.ask,
                        OrderSide::Sell => market.bid,
                    };
                    return self.fill_order(working, fill_price, LiquiditySide::Taker);
                }
                return Ok(());
            }
        }

        if let Some(working) = self.working_orders.get_mut(&command.cl_ord_id) {
            working.quantity = command.quantity;
            working.set_price(command.price);
            match working.venue_order_id.clone() {
                Some(venue_order_id) => {
                    let kind = OrderEventKind::Modified {
                        cl_ord_id: command.cl_ord_id,
                        venue_order_id,
                        quantity: command.quantity,
                        price: command.price,
                    };
                    self.emit(kind);
                }
                None => {
                    error!(cl_ord_id = %command.cl_ord_id, "working order missing venue id");
                }
            }
        }
        Ok(())
    }

    // ── Run control ────────────────────────────────────────────────────

    /// Restore the exchange to its just-registered state: all tables and
    /// counters cleared, account back to starting capital, modules reset,
    /// and a fresh initial account state issued.
    pub fn reset(&mut self) {
        self.market.clear();
        self.working_orders.clear();
        self.position_index.clear();
        self.child_orders.clear();
        self.oco_orders.clear();
        self.position_oco_orders.clear();
        self.ids.reset();
        self.clock = SimClock::new();
        for module in &mut self.modules {
            module.reset();
        }
        self.account = Account::new(
            self.account.id.clone(),
            self.config.starting_capital.clone(),
            self.config.frozen_account,
        );
        if self.client.is_some() {
            self.issue_account_state();
        }
        debug!("exchange reset");
    }

    /// End-of-run audit: warn about every order still resting on the book
    /// and hand the list back to the driver.
    pub fn check_residuals(&self) -> Vec<&Order> {
        let mut residuals: Vec<&Order> = self.working_orders.values().collect();
        residuals.sort_by(|a, b| a.cl_ord_id.as_str().cmp(b.cl_ord_id.as_str()));
        for order in &residuals {
            warn!(
                cl_ord_id = %order.cl_ord_id,
                symbol = %order.symbol,
                "residual working order"
            );
        }
        residuals
    }

    // ── Order routing ──────────────────────────────────────────────────

    /// Route a submitted order: validate quantity bounds and market
    /// presence, then dispatch by type. Precondition: not already working.
    fn process_order(&mut self, order: Order) -> Result<(), ExchangeError> {
        debug_assert!(
            !self.working_orders.contains_key(&order.cl_ord_id),
            "order already working"
        );

        let Some(instrument) = self.instruments.get(&order.symbol) else {
            return Err(ExchangeError::InstrumentNotFound(order.symbol.clone()));
        };
        let tick_size = instrument.tick_size;
        let min_quantity = instrument.min_quantity;
        let max_quantity = instrument.max_quantity;

        if let Some(max) = max_quantity {
            if order.quantity > max {
                let reason = format!(
                    "order quantity of {} exceeds the maximum {}",
                    order.quantity, max
                );
                self.reject_order(order, reason);
                return Ok(());
            }
        }
        if let Some(min) = min_quantity {
            if order.quantity < min {
                let reason = format!(
                    "order quantity of {} is less than the minimum {}",
                    order.quantity, min
                );
                self.reject_order(order, reason);
                return Ok(());
            }
        }

        let Some(market) = self.market.get(&order.symbol).cloned() else {
            let reason = format!("no market for {}", order.symbol);
            self.reject_order(order, reason);
            return Ok(());
        };

        match order.order_type {
            OrderType::Market => self.process_market_order(order, &market, tick_size),
            OrderType::Limit { .. } => self.process_limit_order(order, &market),
            OrderType::StopMarket { .. } => self.process_stop_order(order, &market),
        }
    }

    /// Market orders fill immediately at the touch, slipping one tick when
    /// the fill model says so.
    fn process_market_order(
        &mut self,
        mut order: Order,
        market: &QuoteTick,
        tick_size: f64,
    ) -> Result<(), ExchangeError> {
        let slipped = self.fill_model.is_slipped();
        let price = match order.side {
            OrderSide::Buy => {
                if slipped {
                    market.ask + tick_size
                } else {
                    market.ask
                }
            }
            OrderSide::Sell => {
                if slipped {
                    market.bid - tick_size
                } else {
                    market.bid
                }
            }
        };
        self.accept_order(&mut order);
        self.fill_order(order, price, LiquiditySide::Taker)
    }

    /// A marketable limit fills at the opposite touch as a TAKER unless it is
    /// post-only, which rejects instead; otherwise the order rests.
    fn process_limit_order(
        &mut self,
        mut order: Order,
        market: &QuoteTick,
    ) -> Result<(), ExchangeError> {
        let OrderType::Limit { price, post_only } = order.order_type else {
            debug_assert!(false, "not a limit order");
            return Ok(());
        };

        let crosses = match order.side {
            OrderSide::Buy => price >= market.ask,
            OrderSide::Sell => price <= market.bid,
        };

        if crosses {
            if post_only {
                let reason = format!(
                    "{} {} order price of {} is too far from the market, bid={}, ask={}",
                    order.side.as_str(),
                    order.order_type.name(),
                    price,
                    market.bid,
                    market.ask
                );
                self.reject_order(order, reason);
                return Ok(());
            }
            self.accept_order(&mut order);
            let fill_price = match order.side {
                OrderSide::Buy => market.ask,
                OrderSide::Sell => market.bid,
            };
            return self.fill_order(order, fill_price, LiquiditySide::Taker);
        }

        self.accept_order(&mut order);
        self.work_order(order)
    }

    /// A stop must rest on the passive side of the market; a trigger already
    /// through the touch rejects.
    fn process_stop_order(
        &mut self,
        mut order: Order,
        market: &QuoteTick,
    ) -> Result<(), ExchangeError> {
        let OrderType::StopMarket { trigger } = order.order_type else {
            debug_assert!(false, "not a stop order");
            return Ok(());
        };

        let wrong_side = match order.side {
            OrderSide::Buy => trigger < market.ask,
            OrderSide::Sell => trigger > market.bid,
        };
        if wrong_side {
            let reason = format!(
                "{} {} order price of {} is too far from the market, bid={}, ask={}",
                order.side.as_str(),
                order.order_type.name(),
                trigger,
                market.bid,
                market.ask
            );
            self.reject_order(order, reason);
            return Ok(());
        }

        self.accept_order(&mut order);
        self.work_order(order)
    }

    // ── Lifecycle transitions ──────────────────────────────────────────

    fn accept_order(&mut self, order: &mut Order) {
        let venue_order_id = self.ids.order_id(&order.symbol);
        order.set_accepted(venue_order_id.clone());
        self.emit(OrderEventKind::Accepted {
            cl_ord_id: order.cl_ord_id.clone(),
            venue_order_id,
            symbol: order.symbol.clone(),
        });
    }

    /// Reject is only legal from SUBMITTED; anything else is a state-machine
    /// violation which is logged and skipped.
    fn reject_order(&mut self, mut order: Order, reason: String) {
        if order.status != OrderStatus::Submitted {
            error!(
                cl_ord_id = %order.cl_ord_id,
                status = ?order.status,
                "cannot reject order: not in SUBMITTED"
            );
            return;
        }
        order.set_rejected();
        self.emit(OrderEventKind::Rejected {
            cl_ord_id: order.cl_ord_id.clone(),
            symbol: order.symbol.clone(),
            reason,
        });
    }

    fn work_order(&mut self, mut order: Order) -> Result<(), ExchangeError> {
        order.set_working();
        let venue_order_id = venue_order_id(&order)?;
        self.emit(OrderEventKind::Working {
            cl_ord_id: order.cl_ord_id.clone(),
            venue_order_id,
            symbol: order.symbol.clone(),
        });
        debug!(cl_ord_id = %order.cl_ord_id, symbol = %order.symbol, "order working");
        self.working_orders.insert(order.cl_ord_id.clone(), order);
        Ok(())
    }

    // ── Fill pipeline ──────────────────────────────────────────────────

    /// Fill an order completely: resolve its position, compute commission,
    /// emit the fill, mutate the account, cascade OCO, bring bracket
    /// children live, and clean up once the position closes.
    fn fill_order(
        &mut self,
        mut order: Order,
        fill_price: f64,
        liquidity_side: LiquiditySide,
    ) -> Result<(), ExchangeError> {
        let position_id = match self.position_index.get(&order.cl_ord_id) {
            Some(id) => id.clone(),
            None => {
                let id = self.ids.position_id(&order.symbol);
                self.position_index
                    .insert(order.cl_ord_id.clone(), id.clone());
                id
            }
        };

        let Some(instrument) = self.instruments.get(&order.symbol).cloned() else {
            return Err(ExchangeError::InstrumentNotFound(order.symbol.clone()));
        };
        let commission = instrument.calculate_commission(
            order.quantity,
            fill_price,
            liquidity_side,
            QUANTO_XRATE,
        );

        let account_id = self
            .client
            .as_ref()
            .map(|c| c.account_id())
            .ok_or(ExchangeError::ClientNotRegistered)?;
        let venue_order_id = venue_order_id(&order)?;

        order.set_filled();
        let fill = OrderFilled {
            account_id,
            cl_ord_id: order.cl_ord_id.clone(),
            venue_order_id,
            execution_id: self.ids.execution_id(),
            position_id: position_id.clone(),
            strategy_id: None,
            symbol: order.symbol.clone(),
            side: order.side,
            filled_qty: order.quantity,
            leaves_qty: 0.0,
            avg_price: fill_price,
            quote_currency: instrument.quote_currency.clone(),
            settlement_currency: instrument.settlement_currency.clone(),
            is_inverse: instrument.is_inverse,
            commission,
            liquidity_side,
        };

        self.emit(OrderEventKind::Filled(fill.clone()));
        self.adjust_account(&fill)?;
        self.check_oco_order(&order.cl_ord_id);
        self.process_child_orders(&order.cl_ord_id)?;
        self.check_position_closed(&position_id);
        Ok(())
    }

    /// Bring a filled bracket parent's children live. Children are re-read
    /// from the table each step because a sibling's immediate fill can
    /// reject a later child in place (OCO).
    fn process_child_orders(&mut self, parent: &ClientOrderId) -> Result<(), ExchangeError> {
        if !self.child_orders.contains_key(parent) {
            return Ok(());
        }
        let count = self.child_orders.get(parent).map_or(0, |c| c.len());
        for index in 0..count {
            let child = match self.child_orders.get(parent).and_then(|c| c.get(index)) {
                Some(child) => child.clone(),
                None => continue,
            };
            if !child.is_completed() {
                self.process_order(child)?;
            }
        }
        self.child_orders.remove(parent);
        Ok(())
    }

    /// When a position has fully closed, cancel every order still protecting
    /// it and drop the table entry.
    fn check_position_closed(&mut self, position_id: &PositionId) {
        let Some(position) = self.cache.position(position_id) else {
            return;
        };
        if !position.is_closed() {
            return;
        }
        let Some(protecting) = self.position_oco_orders.remove(position_id) else {
            return;
        };
        for order in protecting {
            if let Some(mut working) = self.working_orders.remove(&order.cl_ord_id) {
                working.set_cancelled();
                self.emit_cancelled(&working);
            }
        }
    }

    // ── Linked orders ──────────────────────────────────────────────────

    /// One-cancels-other cascade. Removing either direction removes both; a
    /// still-pending bracket child on the far end is rejected in place, a
    /// working sibling is cancelled.
    fn check_oco_order(&mut self, cl_ord_id: &ClientOrderId) {
        let Some(other_id) = self.oco_orders.remove(cl_ord_id) else {
            return;
        };
        self.oco_orders.remove(&other_id);

        let mut rejected: Vec<(ClientOrderId, Symbol)> = Vec::new();
        for children in self.child_orders.values_mut() {
            for child in children.iter_mut() {
                if child.cl_ord_id != other_id || child.is_working() {
                    continue;
                }
                if child.is_completed() {
                    error!(
                        cl_ord_id = %child.cl_ord_id,
                        "cannot reject OCO order: already completed"
                    );
                    continue;
                }
                child.set_rejected();
                rejected.push((child.cl_ord_id.clone(), child.symbol.clone()));
            }
        }
        for (id, symbol) in rejected {
            self.emit(OrderEventKind::Rejected {
                cl_ord_id: id,
                symbol,
                reason: format!("OCO order rejected from {cl_ord_id}"),
            });
        }

        if let Some(mut other) = self.working_orders.remove(&other_id) {
            other.set_cancelled();
            self.emit_cancelled(&other);
        }
    }

    fn clean_up_child_orders(&mut self, cl_ord_id: &ClientOrderId) {
        self.child_orders.remove(cl_ord_id);
    }

    // ── Account mutation ───────────────────────────────────────────────

    /// Convert the fill's commission (and any realized PnL from closing
    /// against the position's entry side) into the account currency, mutate
    /// the balance, and issue a fresh account state. Frozen accounts only
    /// re-issue their unchanged snapshot.
    fn adjust_account(&mut self, fill: &OrderFilled) -> Result<(), ExchangeError> {
        if self.account.frozen {
            self.issue_account_state();
            return Ok(());
        }

        let mut commission = fill.commission.clone();
        let mut pnl = Money::zero(commission.currency.clone());

        if let Some(position) = self.cache.position(&fill.position_id) {
            if fill.side != position.entry {
                pnl = position.calculate_pnl(
                    position.avg_open_price,
                    fill.avg_price,
                    fill.filled_qty,
                );
            }
        }

        if commission.currency != self.account.currency {
            let price_type = if fill.side == OrderSide::Sell {
                PriceType::Bid
            } else {
                PriceType::Ask
            };
            let (bid_quotes, ask_quotes) = self.build_quote_maps();
            let xrate = get_rate(
                &commission.currency,
                &self.account.currency,
                price_type,
                &bid_quotes,
                &ask_quotes,
            )
            .map_err(|e| ExchangeError::NoExchangeRate(commission.currency.clone(), e))?;
            commission = Money::new(commission.amount * xrate, self.account.currency.clone());
            pnl = Money::new(pnl.amount * xrate, self.account.currency.clone());
        }

        let net_pnl = pnl.amount - commission.amount;
        self.account.total_commissions.add(&commission);
        self.account.balance.amount += net_pnl;
        self.account.balance_activity_day.amount += net_pnl;

        self.issue_account_state();
        Ok(())
    }

    /// Snapshot the account, apply the event to the in-memory account, and
    /// forward it to the client.
    fn issue_account_state(&mut self) {
        let state = AccountState {
            account_id: self.account.id.clone(),
            currency: self.account.currency.clone(),
            balance: self.account.balance.clone(),
            margin_balance: self.account.balance.clone(),
            margin_available: self.account.balance.clone(),
            event_id: self.event_ids.generate(),
            ts_event: self.clock.now(),
        };
        self.account.apply(&state);
        if let Some(client) = &self.client {
            client.handle_account_event(state);
        }
    }

    /// Per-symbol top-of-book snapshots flattened into pair-keyed quote maps
    /// for the cross-rate lookup.
    fn build_quote_maps(&self) -> (HashMap<String, f64>, HashMap<String, f64>) {
        let mut bid_quotes = HashMap::new();
        let mut ask_quotes = HashMap::new();
        for (symbol, tick) in &self.market {
            bid_quotes.insert(symbol.clone(), tick.bid);
            ask_quotes.insert(symbol.clone(), tick.ask);
        }
        (bid_quotes, ask_quotes)
    }

    // ── Event emission ─────────────────────────────────────────────────

    fn emit(&self, kind: OrderEventKind) {
        let Some(client) = &self.client else {
            error!("no execution client registered; dropping event");
            return;
        };
        let now = self.clock.now();
        client.handle_order_event(OrderEvent {
            event_id: self.event_ids.generate(),
            ts_event: now,
            ts_init: now,
            kind,
        });
    }

    fn emit_cancelled(&self, order: &Order) {
        match &order.venue_order_id {
            Some(venue_order_id) => self.emit(OrderEventKind::Cancelled {
                cl_ord_id: order.cl_ord_id.clone(),
                venue_order_id: venue_order_id.clone(),
                symbol: order.symbol.clone(),
            }),
            None => error!(cl_ord_id = %order.cl_ord_id, "cancelled order missing venue id"),
        }
    }

    fn emit_expired(&self, order: &Order) {
        match &order.venue_order_id {
            Some(venue_order_id) => self.emit(OrderEventKind::Expired {
                cl_ord_id: order.cl_ord_id.clone(),
                venue_order_id: venue_order_id.clone(),
                symbol: order.symbol.clone(),
            }),
            None => error!(cl_ord_id = %order.cl_ord_id, "expired order missing venue id"),
        }
    }

    fn require_client(&self) -> Result<(), ExchangeError> {
        if self.client.is_some() {
            Ok(())
        } else {
            Err(ExchangeError::ClientNotRegistered)
        }
    }
}

fn venue_order_id(order: &Order) -> Result<OrderId, ExchangeError> {
    order
        .venue_order_id
        .clone()
        .ok_or_else(|| ExchangeError::VenueOrderIdMissing(order.cl_ord_id.clone()))
}
