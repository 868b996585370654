//! Capital adapter
//!
//! Everything the strategy does with the external yield venue goes through
//! [`CapitalAdapter`]. The venue itself is the [`Venue`] collaborator: a token
//! vault that accepts `want` as collateral, the registry that lists it, and an
//! optional liquidity-mining program paying rewards on the position.

use alloy_primitives::{Address, U256};

use crate::{
    accounting::exceeds_shortfall_tolerance,
    token::TokenLedger,
    utils::error::{StrategyError, StrategyResult},
};

/// Current target of the strategy's capital
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExternalDeposit {
    /// Token vault the want is deposited into
    pub token_vault: Address,
    /// Registry the token vault must be listed in
    pub registry: Address,
    /// Liquidity-mining program rewarding the position, if any
    pub liquidity_mining: Option<Address>,
    /// Token paid out by the liquidity-mining program
    pub reward_token: Address,
}

/// External yield venue.
#[cfg_attr(test, mockall::automock)]
pub trait Venue {
    /// Collateral accepted by `token_vault`, `None` if the venue does not know it
    fn collateral_token(&self, token_vault: Address) -> Option<Address>;

    fn is_registered(&self, registry: Address, token_vault: Address) -> bool;

    /// Token paid out by `liquidity_mining`, `None` if unknown
    fn reward_token(&self, liquidity_mining: Address) -> Option<Address>;

    /// Remaining deposit capacity of `token_vault`
    fn deposit_limit(&self, token_vault: Address) -> U256;

    /// Pulls `amount` of collateral from `depositor` into the position
    fn deposit(
        &mut self,
        token_vault: Address,
        depositor: Address,
        amount: U256,
        tokens: &mut dyn TokenLedger,
    ) -> StrategyResult<()>;

    /// Releases up to `amount` worth of `holder`'s position and returns the
    /// collateral actually paid out, which may be less under illiquidity or fees
    fn withdraw(
        &mut self,
        token_vault: Address,
        holder: Address,
        amount: U256,
        tokens: &mut dyn TokenLedger,
    ) -> StrategyResult<U256>;

    /// Part of `holder`'s position value a withdrawal can release right now,
    /// before fees. Below `position_value` when the token vault is illiquid.
    fn max_withdraw(&self, token_vault: Address, holder: Address) -> U256;

    /// Collateral `withdraw` would pay out right now for `amount`
    fn quote_withdraw(&self, token_vault: Address, holder: Address, amount: U256) -> U256;

    /// Valuation of `holder`'s position, in collateral
    fn position_value(&self, token_vault: Address, holder: Address) -> U256;

    /// Moves the whole position of `from` to `to`
    fn transfer_position(
        &mut self,
        token_vault: Address,
        from: Address,
        to: Address,
    ) -> StrategyResult<()>;

    /// Rewards accrued to `holder`, valued in collateral
    fn pending_rewards(&self, liquidity_mining: Address, holder: Address) -> U256;

    /// Claims the accrued rewards, converted into collateral and paid to `holder`
    fn claim_rewards(
        &mut self,
        liquidity_mining: Address,
        holder: Address,
        tokens: &mut dyn TokenLedger,
    ) -> StrategyResult<U256>;
}

/// Result of a divest request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DivestOutcome {
    pub requested: U256,
    pub recovered: U256,
}

impl DivestOutcome {
    pub fn shortfall(&self) -> U256 {
        self.requested.saturating_sub(self.recovered)
    }
}

/// Binds a strategy (the position holder) to its current venue target
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapitalAdapter {
    want: Address,
    holder: Address,
    deposit: ExternalDeposit,
}

impl CapitalAdapter {
    pub fn new(want: Address, holder: Address, deposit: ExternalDeposit) -> Self {
        Self {
            want,
            holder,
            deposit,
        }
    }

    pub fn external_deposit(&self) -> &ExternalDeposit {
        &self.deposit
    }

    /// Checks that `deposit` accepts `want` before anything is committed to it
    pub fn validate(want: Address, deposit: &ExternalDeposit, venue: &dyn Venue) -> StrategyResult<()> {
        if venue.collateral_token(deposit.token_vault) != Some(want) {
            return Err(StrategyError::InvalidVenue);
        }
        if !venue.is_registered(deposit.registry, deposit.token_vault) {
            return Err(StrategyError::InvalidVenue);
        }
        if let Some(liquidity_mining) = deposit.liquidity_mining {
            if venue.reward_token(liquidity_mining) != Some(deposit.reward_token) {
                return Err(StrategyError::InvalidVenue);
            }
        }
        Ok(())
    }

    pub fn value_position(&self, venue: &dyn Venue) -> U256 {
        venue.position_value(self.deposit.token_vault, self.holder)
    }

    /// Deposits up to `amount` of liquid want, bounded by the venue's capacity.
    /// Returns the amount actually invested.
    pub fn invest(
        &self,
        amount: U256,
        venue: &mut dyn Venue,
        tokens: &mut dyn TokenLedger,
    ) -> StrategyResult<U256> {
        let liquid = tokens.balance_of(self.want, self.holder);
        let capacity = venue.deposit_limit(self.deposit.token_vault);
        let investable = amount.min(liquid).min(capacity);
        if investable.is_zero() {
            return Ok(U256::ZERO);
        }
        venue.deposit(self.deposit.token_vault, self.holder, investable, tokens)?;
        Ok(investable)
    }

    /// Fails with `InsufficientLiquidity` if divesting `amount` right now would
    /// miss by more than `max_shortfall_bps`. Mutates nothing.
    pub fn ensure_divestable(
        &self,
        amount: U256,
        venue: &dyn Venue,
        max_shortfall_bps: u64,
    ) -> StrategyResult<()> {
        let requested = amount.min(self.value_position(venue));
        let available = venue.quote_withdraw(self.deposit.token_vault, self.holder, requested);
        if exceeds_shortfall_tolerance(requested, available, max_shortfall_bps)? {
            return Err(StrategyError::InsufficientLiquidity {
                requested: requested.to_string(),
                available: available.to_string(),
            });
        }
        Ok(())
    }

    /// Fails with `InsufficientLiquidity` unless the whole position can leave
    /// the venue right now, with fees within `max_shortfall_bps`. Mutates
    /// nothing. Returns the position value.
    pub fn ensure_exitable(&self, venue: &dyn Venue, max_shortfall_bps: u64) -> StrategyResult<U256> {
        let position = self.value_position(venue);
        let releasable = venue.max_withdraw(self.deposit.token_vault, self.holder);
        if releasable < position {
            return Err(StrategyError::InsufficientLiquidity {
                requested: position.to_string(),
                available: releasable.to_string(),
            });
        }
        self.ensure_divestable(position, venue, max_shortfall_bps)?;
        Ok(position)
    }

    /// Releases up to `amount` from the position. A partial fill is not an
    /// error; the outcome carries what was actually recovered.
    pub fn divest(
        &self,
        amount: U256,
        venue: &mut dyn Venue,
        tokens: &mut dyn TokenLedger,
    ) -> StrategyResult<DivestOutcome> {
        let requested = amount.min(self.value_position(venue));
        if requested.is_zero() {
            return Ok(DivestOutcome::default());
        }
        let recovered = venue.withdraw(self.deposit.token_vault, self.holder, requested, tokens)?;
        Ok(DivestOutcome {
            requested,
            recovered,
        })
    }

    pub fn divest_all(
        &self,
        venue: &mut dyn Venue,
        tokens: &mut dyn TokenLedger,
    ) -> StrategyResult<DivestOutcome> {
        let position = self.value_position(venue);
        self.divest(position, venue, tokens)
    }

    pub fn pending_rewards(&self, venue: &dyn Venue) -> U256 {
        self.deposit
            .liquidity_mining
            .map(|liquidity_mining| venue.pending_rewards(liquidity_mining, self.holder))
            .unwrap_or_default()
    }

    /// Claims liquidity-mining rewards into liquid want
    pub fn claim_rewards(
        &self,
        venue: &mut dyn Venue,
        tokens: &mut dyn TokenLedger,
    ) -> StrategyResult<U256> {
        match self.deposit.liquidity_mining {
            Some(liquidity_mining) if !venue.pending_rewards(liquidity_mining, self.holder).is_zero() => {
                venue.claim_rewards(liquidity_mining, self.holder, tokens)
            }
            _ => Ok(U256::ZERO),
        }
    }

    /// Hands the whole position over to `successor`, which must target the same token vault
    pub fn transfer_position(&self, successor: &CapitalAdapter, venue: &mut dyn Venue) -> StrategyResult<()> {
        if successor.deposit.token_vault != self.deposit.token_vault {
            return Err(StrategyError::InvalidVenue);
        }
        if self.value_position(venue).is_zero() {
            return Ok(());
        }
        venue.transfer_position(self.deposit.token_vault, self.holder, successor.holder)
    }

    /// Moves the adapter to `new_deposit`.
    ///
    /// The new target is validated and the old position checked for a full
    /// exit before any funds move. The old position is then divested into
    /// liquid want. Returns the want recovered.
    pub fn switch_venue(
        &mut self,
        new_deposit: ExternalDeposit,
        venue: &mut dyn Venue,
        tokens: &mut dyn TokenLedger,
        max_shortfall_bps: u64,
    ) -> StrategyResult<U256> {
        Self::validate(self.want, &new_deposit, venue)?;
        let position = self.ensure_exitable(venue, max_shortfall_bps)?;

        let rewards = self.claim_rewards(venue, tokens)?;
        let outcome = self.divest(position, venue, tokens)?;

        // only a venue releasing less than its `max_withdraw` leaves a remainder;
        // the recovered want stays liquid with the old target kept
        let leftover = self.value_position(venue);
        if !leftover.is_zero() {
            return Err(StrategyError::InsufficientLiquidity {
                requested: position.to_string(),
                available: outcome.recovered.to_string(),
            });
        }

        self.deposit = new_deposit;
        Ok(outcome.recovered.saturating_add(rewards))
    }
}
