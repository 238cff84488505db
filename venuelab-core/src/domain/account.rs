//! Account state.
//!
//! The exchange never pokes balances directly from the outside: every
//! mutation is expressed as an [`AccountState`] event which the in-memory
//! account then applies. A frozen account ignores applications entirely.

use super::currency::{Currency, Money};
use super::events::AccountState;
use super::ids::AccountId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub currency: Currency,
    pub balance: Money,
    pub balance_start_day: Money,
    pub balance_activity_day: Money,
    pub total_commissions: Money,
    pub frozen: bool,
}

impl Account {
    pub fn new(id: AccountId, starting_capital: Money, frozen: bool) -> Self {
        let currency = starting_capital.currency.clone();
        Self {
            id,
            currency: currency.clone(),
            balance: starting_capital.clone(),
            balance_start_day: starting_capital,
            balance_activity_day: Money::zero(currency.clone()),
            total_commissions: Money::zero(currency),
            frozen,
        }
    }

    /// Apply a state event. Frozen accounts never change.
    pub fn apply(&mut self, state: &AccountState) {
        if self.frozen {
            return;
        }
        self.balance = state.balance.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn state(balance: f64) -> AccountState {
        let money = Money::new(balance, Currency::usd());
        AccountState {
            account_id: AccountId::new("SIM-001"),
            currency: Currency::usd(),
            balance: money.clone(),
            margin_balance: money.clone(),
            margin_available: money,
            event_id: Uuid::new_v4(),
            ts_event: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn apply_updates_balance() {
        let mut account = Account::new(
            AccountId::new("SIM-001"),
            Money::new(100_000.0, Currency::usd()),
            false,
        );
        account.apply(&state(99_995.0));
        assert_eq!(account.balance.amount, 99_995.0);
        assert_eq!(account.balance_start_day.amount, 100_000.0);
    }

    #[test]
    fn frozen_account_ignores_applications() {
        let mut account = Account::new(
            AccountId::new("SIM-001"),
            Money::new(100_000.0, Currency::usd()),
            true,
        );
        account.apply(&state(0.0));
        assert_eq!(account.balance.amount, 100_000.0);
    }
}
