//! Domain types for the simulated exchange.

pub mod account;
pub mod commands;
pub mod currency;
pub mod events;
pub mod ids;
pub mod instrument;
pub mod order;
pub mod position;
pub mod tick;

pub use account::Account;
pub use commands::{CancelOrder, ModifyOrder, SubmitBracketOrder, SubmitOrder};
pub use currency::{Currency, Money};
pub use events::{AccountState, EventIdFactory, OrderEvent, OrderEventKind, OrderFilled};
pub use ids::{AccountId, ClientOrderId, ExecutionId, IdAllocator, OrderId, PositionId};
pub use instrument::{base_and_quote, Instrument};
pub use order::{
    BracketOrder, LiquiditySide, OmsType, Order, OrderSide, OrderStatus, OrderType, TimeInForce,
};
pub use position::Position;
pub use tick::QuoteTick;

/// Symbol type alias
pub type Symbol = String;
