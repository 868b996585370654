//! Strategy settings
//!
//! Identity and role configuration written by `initialize`, plus the report
//! parameters the triggers read. Only the administrative operations mutate
//! these after initialization.

use alloy_primitives::{Address, U256};
use candid::{CandidType, Nat};

use crate::{
    adapter::ExternalDeposit,
    constants::{
        default_debt_threshold, default_max_report_delay, DEFAULT_MAX_SHORTFALL_BPS,
        DEFAULT_MIN_REPORT_DELAY, DEFAULT_PROFIT_FACTOR,
    },
    utils::common::u256_to_nat,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategySettings {
    /// Asset managed by the strategy, taken from the vault's token
    pub want: Address,
    /// Vault the strategy reports to
    pub vault: Address,
    pub strategist: Address,
    /// Receiver of the strategist's share of performance fees
    pub rewards: Address,
    pub keeper: Address,
    /// Minimum seconds between harvests
    pub min_report_delay: u64,
    /// Seconds after which a harvest is forced
    pub max_report_delay: u64,
    /// Required multiple of call cost over expected benefit
    pub profit_factor: u64,
    pub debt_threshold: U256,
    /// Divest shortfall absorbed before a call aborts, in basis points
    pub max_shortfall_bps: u64,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            want: Address::ZERO,
            vault: Address::ZERO,
            strategist: Address::ZERO,
            rewards: Address::ZERO,
            keeper: Address::ZERO,
            min_report_delay: DEFAULT_MIN_REPORT_DELAY,
            max_report_delay: default_max_report_delay(),
            profit_factor: DEFAULT_PROFIT_FACTOR,
            debt_threshold: default_debt_threshold(),
            max_shortfall_bps: DEFAULT_MAX_SHORTFALL_BPS,
        }
    }
}

impl StrategySettings {
    pub fn want(&mut self, want: Address) -> &mut Self {
        self.want = want;
        self
    }

    pub fn vault(&mut self, vault: Address) -> &mut Self {
        self.vault = vault;
        self
    }

    pub fn strategist(&mut self, strategist: Address) -> &mut Self {
        self.strategist = strategist;
        self
    }

    pub fn rewards(&mut self, rewards: Address) -> &mut Self {
        self.rewards = rewards;
        self
    }

    pub fn keeper(&mut self, keeper: Address) -> &mut Self {
        self.keeper = keeper;
        self
    }

    pub fn min_report_delay(&mut self, min_report_delay: u64) -> &mut Self {
        self.min_report_delay = min_report_delay;
        self
    }

    pub fn max_report_delay(&mut self, max_report_delay: u64) -> &mut Self {
        self.max_report_delay = max_report_delay;
        self
    }

    pub fn profit_factor(&mut self, profit_factor: u64) -> &mut Self {
        self.profit_factor = profit_factor;
        self
    }

    pub fn debt_threshold(&mut self, debt_threshold: U256) -> &mut Self {
        self.debt_threshold = debt_threshold;
        self
    }

    pub fn max_shortfall_bps(&mut self, max_shortfall_bps: u64) -> &mut Self {
        self.max_shortfall_bps = max_shortfall_bps;
        self
    }
}

/// Candid view of the settings and the current venue target
#[derive(Clone, Default, CandidType, Debug, PartialEq)]
pub struct StrategySettingsQuery {
    pub address: String,
    pub want: String,
    pub vault: String,
    pub strategist: String,
    pub rewards: String,
    pub keeper: String,
    pub token_vault: String,
    pub token_vault_registry: String,
    pub liquidity_mining: Option<String>,
    pub reward_token: String,
    pub min_report_delay: u64,
    pub max_report_delay: u64,
    pub profit_factor: u64,
    pub debt_threshold: Nat,
    pub max_shortfall_bps: u64,
    pub emergency_exit: bool,
}

impl StrategySettingsQuery {
    pub fn new(
        address: Address,
        settings: &StrategySettings,
        deposit: &ExternalDeposit,
        emergency_exit: bool,
    ) -> Self {
        Self {
            address: address.to_string(),
            want: settings.want.to_string(),
            vault: settings.vault.to_string(),
            strategist: settings.strategist.to_string(),
            rewards: settings.rewards.to_string(),
            keeper: settings.keeper.to_string(),
            token_vault: deposit.token_vault.to_string(),
            token_vault_registry: deposit.registry.to_string(),
            liquidity_mining: deposit.liquidity_mining.map(|address| address.to_string()),
            reward_token: deposit.reward_token.to_string(),
            min_report_delay: settings.min_report_delay,
            max_report_delay: settings.max_report_delay,
            profit_factor: settings.profit_factor,
            debt_threshold: u256_to_nat(&settings.debt_threshold),
            max_shortfall_bps: settings.max_shortfall_bps,
            emergency_exit,
        }
    }
}
