//! Trading commands accepted by the exchange.

use super::ids::{AccountId, ClientOrderId, PositionId};
use super::order::{BracketOrder, Order};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOrder {
    pub account_id: AccountId,
    pub order: Order,
    /// Pre-resolved position this order should fill into, if any.
    pub position_id: Option<PositionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitBracketOrder {
    pub account_id: AccountId,
    pub bracket: BracketOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyOrder {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
    pub quantity: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
}
