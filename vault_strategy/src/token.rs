//! Fungible token ledger shared by the strategy, the vault and the venue.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};

use crate::utils::error::{StrategyError, StrategyResult};

/// Minimal ERC-20 surface the strategy relies on.
pub trait TokenLedger {
    /// Balance of `holder` in `token`.
    fn balance_of(&self, token: Address, holder: Address) -> U256;

    /// Moves `amount` of `token` from `from` to `to`.
    /// Fails with `InsufficientBalance` without touching either balance.
    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> StrategyResult<()>;
}

/// In-memory balances keyed by `(token, holder)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Balances {
    balances: HashMap<(Address, Address), U256>,
}

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` of `token` to `holder` out of thin air.
    pub fn mint(&mut self, token: Address, holder: Address, amount: U256) {
        let balance = self.balances.entry((token, holder)).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Destroys up to `amount` of `holder`'s `token`, returning what was burnt.
    pub fn burn(&mut self, token: Address, holder: Address, amount: U256) -> U256 {
        let balance = self.balances.entry((token, holder)).or_default();
        let burnt = amount.min(*balance);
        *balance -= burnt;
        burnt
    }
}

impl TokenLedger for Balances {
    fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.balances
            .get(&(token, holder))
            .copied()
            .unwrap_or_default()
    }

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        let from_balance = self.balance_of(token, from);
        if from_balance < amount {
            return Err(StrategyError::InsufficientBalance);
        }
        if from == to || amount.is_zero() {
            return Ok(());
        }
        self.balances.insert((token, from), from_balance - amount);
        let to_balance = self.balances.entry((token, to)).or_default();
        *to_balance = to_balance.saturating_add(amount);
        Ok(())
    }
}
