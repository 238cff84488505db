//! Exchange configuration.

use crate::domain::{Currency, Money, OmsType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub starting_capital: Money,
    pub account_currency: Currency,
    /// Disables all balance mutation; fills still produce events.
    pub frozen_account: bool,
    /// Retained for downstream consumers; not interpreted by the core.
    pub oms_type: OmsType,
    /// Retained hook; the core always generates position ids on demand.
    pub generate_position_ids: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            starting_capital: Money::new(100_000.0, Currency::usd()),
            account_currency: Currency::usd(),
            frozen_account: false,
            oms_type: OmsType::Netting,
            generate_position_ids: true,
        }
    }
}
