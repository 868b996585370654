//! The vault collaborator, as seen from a strategy.

use alloy_primitives::{Address, U256};

use crate::{accounting::HarvestReport, token::TokenLedger, utils::error::StrategyResult};

/// Per-strategy bookkeeping kept by the vault
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrategyParams {
    /// Timestamp at which the vault added the strategy
    pub activation: u64,
    /// Share of the vault's assets the strategy may manage, in basis points
    pub debt_ratio: u64,
    /// Amount currently lent to the strategy
    pub total_debt: U256,
    pub total_gain: U256,
    pub total_loss: U256,
    /// Timestamp of the last accepted report
    pub last_report: u64,
}

/// What the vault answers to a report
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportReceipt {
    /// Debt after the report was applied
    pub total_debt: U256,
    /// Debt the strategy should hold back from investing until the next cycle
    pub debt_outstanding: U256,
}

/// Vault interface consumed by the strategy.
///
/// The vault's own address doubles as its share token.
#[cfg_attr(test, mockall::automock)]
pub trait VaultApi {
    fn address(&self) -> Address;

    /// The asset the vault (and therefore every strategy of it) manages
    fn token(&self) -> Address;

    fn governance(&self) -> Address;

    fn management(&self) -> Address;

    /// Idle funds plus everything lent to strategies
    fn total_assets(&self, tokens: &dyn TokenLedger) -> U256;

    /// `None` if the strategy was never added to the vault
    fn strategy_params(&self, strategy: Address) -> Option<StrategyParams>;

    /// Amount the vault would lend to the strategy on its next report
    fn credit_available(&self, strategy: Address, tokens: &dyn TokenLedger) -> U256;

    /// Applies a harvest report. Pulls `profit + debt_payment` from the
    /// strategy and pushes any available credit to it.
    fn report(
        &mut self,
        strategy: Address,
        report: HarvestReport,
        now: u64,
        tokens: &mut dyn TokenLedger,
    ) -> StrategyResult<ReportReceipt>;

    /// Sets the strategy's debt ratio to zero so that all its debt becomes outstanding
    fn revoke_strategy(&mut self, strategy: Address) -> StrategyResult<()>;
}
