//! Simulated vault, venue and accounts shared by the scenario suites.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, U256};
use chrono::Duration;
use vault_strategy::{
    accounting::{HarvestReport, Liquidation},
    adapter::{ExternalDeposit, Venue},
    constants::MAX_BPS,
    token::{Balances, TokenLedger},
    types::InitArgs,
    vault::{ReportReceipt, StrategyParams, VaultApi},
    CallContext, Strategy, StrategyError, StrategyResult,
};

pub fn units(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18u64))
}

pub fn amount() -> U256 {
    units(5_000_000)
}

/// Relative tolerance of 1e-5
pub fn approx_eq(actual: U256, expected: U256) -> bool {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    diff * U256::from(100_000u64) <= expected
}

pub fn profit_unlock_seconds() -> u64 {
    Duration::hours(6).num_seconds() as u64
}

pub fn hours(count: i64) -> u64 {
    Duration::hours(count).num_seconds() as u64
}

pub fn want() -> Address {
    Address::repeat_byte(0xd0)
}

pub fn other_token() -> Address {
    Address::repeat_byte(0xd1)
}

pub fn reward_token() -> Address {
    Address::repeat_byte(0xd2)
}

pub fn vault_address() -> Address {
    Address::repeat_byte(0xa0)
}

pub fn governance() -> Address {
    Address::repeat_byte(0x01)
}

pub fn management() -> Address {
    Address::repeat_byte(0x02)
}

pub fn strategist() -> Address {
    Address::repeat_byte(0x03)
}

pub fn rewards() -> Address {
    Address::repeat_byte(0x04)
}

pub fn keeper() -> Address {
    Address::repeat_byte(0x05)
}

pub fn user() -> Address {
    Address::repeat_byte(0x06)
}

pub fn stranger() -> Address {
    Address::repeat_byte(0x07)
}

pub fn token_vault() -> Address {
    Address::repeat_byte(0xb0)
}

pub fn alt_token_vault() -> Address {
    Address::repeat_byte(0xb1)
}

/// Listed, but takes another collateral
pub fn foreign_token_vault() -> Address {
    Address::repeat_byte(0xb2)
}

/// Takes `want`, but is not listed in the registry
pub fn unlisted_token_vault() -> Address {
    Address::repeat_byte(0xb3)
}

pub fn registry() -> Address {
    Address::repeat_byte(0xc0)
}

pub fn liquidity_mining() -> Address {
    Address::repeat_byte(0xc1)
}

pub fn strategy_address() -> Address {
    Address::repeat_byte(0xe0)
}

pub fn successor_address() -> Address {
    Address::repeat_byte(0xe1)
}

pub fn primary_deposit() -> ExternalDeposit {
    ExternalDeposit {
        token_vault: token_vault(),
        registry: registry(),
        liquidity_mining: Some(liquidity_mining()),
        reward_token: reward_token(),
    }
}

pub fn deposit_on(token_vault: Address) -> ExternalDeposit {
    ExternalDeposit {
        token_vault,
        registry: registry(),
        liquidity_mining: None,
        reward_token: Address::ZERO,
    }
}

pub fn init_args(external_deposit: ExternalDeposit) -> InitArgs {
    InitArgs {
        vault: vault_address(),
        strategist: strategist(),
        rewards: rewards(),
        keeper: keeper(),
        external_deposit,
    }
}

/// Yearn-style vault: debt ratios, credit, locked profit and share price
#[derive(Clone, Debug)]
pub struct SimVault {
    pub address: Address,
    pub token: Address,
    pub governance: Address,
    pub management: Address,
    pub strategies: HashMap<Address, StrategyParams>,
    pub debt_ratio: u64,
    pub total_debt: U256,
    pub total_supply: U256,
    pub locked_profit: U256,
    pub last_report: u64,
}

impl SimVault {
    pub fn new() -> Self {
        Self {
            address: vault_address(),
            token: want(),
            governance: governance(),
            management: management(),
            strategies: HashMap::new(),
            debt_ratio: 0,
            total_debt: U256::ZERO,
            total_supply: U256::ZERO,
            locked_profit: U256::ZERO,
            last_report: 0,
        }
    }

    pub fn add_strategy(&mut self, strategy: Address, debt_ratio: u64, now: u64) {
        self.strategies.insert(
            strategy,
            StrategyParams {
                activation: now,
                debt_ratio,
                last_report: now,
                ..Default::default()
            },
        );
        self.debt_ratio += debt_ratio;
    }

    pub fn update_debt_ratio(&mut self, strategy: Address, debt_ratio: u64) {
        if let Some(params) = self.strategies.get_mut(&strategy) {
            self.debt_ratio = self.debt_ratio - params.debt_ratio + debt_ratio;
            params.debt_ratio = debt_ratio;
        }
    }

    /// Moves the bookkeeping of `old` to `new`
    pub fn migrate_strategy(&mut self, old: Address, new: Address) {
        if let Some(params) = self.strategies.remove(&old) {
            self.strategies.insert(new, params);
        }
    }

    pub fn idle(&self, tokens: &dyn TokenLedger) -> U256 {
        tokens.balance_of(self.token, self.address)
    }

    /// Reported profit still locked at `now`, released linearly
    pub fn locked_profit_at(&self, now: u64) -> U256 {
        let unlock = profit_unlock_seconds();
        let elapsed = now.saturating_sub(self.last_report);
        if elapsed >= unlock {
            return U256::ZERO;
        }
        self.locked_profit * U256::from(unlock - elapsed) / U256::from(unlock)
    }

    fn free_funds(&self, tokens: &dyn TokenLedger, now: u64) -> U256 {
        self.total_assets(tokens)
            .saturating_sub(self.locked_profit_at(now))
    }

    pub fn price_per_share(&self, tokens: &dyn TokenLedger, now: u64) -> U256 {
        if self.total_supply.is_zero() {
            return units(1);
        }
        self.free_funds(tokens, now) * units(1) / self.total_supply
    }

    pub fn share_value(&self, shares: U256, tokens: &dyn TokenLedger, now: u64) -> U256 {
        if self.total_supply.is_zero() {
            return U256::ZERO;
        }
        shares * self.free_funds(tokens, now) / self.total_supply
    }

    pub fn deposit(
        &mut self,
        depositor: Address,
        amount: U256,
        tokens: &mut Balances,
        now: u64,
    ) -> StrategyResult<U256> {
        let shares = if self.total_supply.is_zero() {
            amount
        } else {
            amount * self.total_supply / self.free_funds(tokens, now)
        };
        tokens.transfer(self.token, depositor, self.address, amount)?;
        tokens.mint(self.address, depositor, shares);
        self.total_supply += shares;
        Ok(shares)
    }

    /// Books what a strategy handed back while serving a withdrawal
    pub fn settle_withdrawal(&mut self, strategy: Address, liquidation: Liquidation) {
        if let Some(params) = self.strategies.get_mut(&strategy) {
            let repaid = liquidation.freed.min(params.total_debt);
            params.total_debt -= repaid;
            self.total_debt -= repaid;

            let loss = liquidation.loss.min(params.total_debt);
            params.total_debt -= loss;
            params.total_loss += loss;
            self.total_debt -= loss;
        }
    }

    pub fn redeem(
        &mut self,
        holder: Address,
        shares: U256,
        value: U256,
        tokens: &mut Balances,
    ) -> StrategyResult<U256> {
        let paid = value.min(self.idle(tokens));
        tokens.burn(self.address, holder, shares);
        self.total_supply -= shares;
        tokens.transfer(self.token, self.address, holder, paid)?;
        Ok(paid)
    }

    fn credit_for(&self, params: &StrategyParams, tokens: &dyn TokenLedger) -> U256 {
        let total_assets = self.total_assets(tokens);
        let vault_limit = total_assets * U256::from(self.debt_ratio) / U256::from(MAX_BPS);
        let strategy_limit = total_assets * U256::from(params.debt_ratio) / U256::from(MAX_BPS);
        if strategy_limit <= params.total_debt || vault_limit <= self.total_debt {
            return U256::ZERO;
        }
        (strategy_limit - params.total_debt)
            .min(vault_limit - self.total_debt)
            .min(self.idle(tokens))
    }

    fn debt_outstanding_for(&self, params: &StrategyParams, tokens: &dyn TokenLedger) -> U256 {
        if self.debt_ratio == 0 {
            return params.total_debt;
        }
        let limit = self.total_assets(tokens) * U256::from(params.debt_ratio) / U256::from(MAX_BPS);
        params.total_debt.saturating_sub(limit)
    }
}

impl VaultApi for SimVault {
    fn address(&self) -> Address {
        self.address
    }

    fn token(&self) -> Address {
        self.token
    }

    fn governance(&self) -> Address {
        self.governance
    }

    fn management(&self) -> Address {
        self.management
    }

    fn total_assets(&self, tokens: &dyn TokenLedger) -> U256 {
        self.idle(tokens) + self.total_debt
    }

    fn strategy_params(&self, strategy: Address) -> Option<StrategyParams> {
        self.strategies.get(&strategy).copied()
    }

    fn credit_available(&self, strategy: Address, tokens: &dyn TokenLedger) -> U256 {
        self.strategies
            .get(&strategy)
            .map(|params| self.credit_for(params, tokens))
            .unwrap_or_default()
    }

    fn report(
        &mut self,
        strategy: Address,
        report: HarvestReport,
        now: u64,
        tokens: &mut dyn TokenLedger,
    ) -> StrategyResult<ReportReceipt> {
        let mut params = self
            .strategies
            .get(&strategy)
            .copied()
            .ok_or_else(|| StrategyError::PreconditionFailed("!strategy".to_string()))?;
        if tokens.balance_of(self.token, strategy) < report.profit + report.debt_payment {
            return Err(StrategyError::InsufficientBalance);
        }

        if !report.loss.is_zero() {
            let loss = report.loss.min(params.total_debt);
            if !self.total_debt.is_zero() {
                let ratio_change = (loss * U256::from(self.debt_ratio) / self.total_debt)
                    .min(U256::from(params.debt_ratio))
                    .to::<u64>();
                params.debt_ratio -= ratio_change;
                self.debt_ratio -= ratio_change;
            }
            params.total_loss += loss;
            params.total_debt -= loss;
            self.total_debt -= loss;
        }
        params.total_gain += report.profit;

        let credit = self.credit_for(&params, &*tokens);
        let debt_payment = report
            .debt_payment
            .min(self.debt_outstanding_for(&params, &*tokens));
        params.total_debt -= debt_payment;
        self.total_debt -= debt_payment;
        params.total_debt += credit;
        self.total_debt += credit;

        let total_available = report.profit + debt_payment;
        if total_available < credit {
            tokens.transfer(self.token, self.address, strategy, credit - total_available)?;
        } else if total_available > credit {
            tokens.transfer(self.token, strategy, self.address, total_available - credit)?;
        }

        self.locked_profit = (self.locked_profit_at(now) + report.profit).saturating_sub(report.loss);
        self.last_report = now;
        params.last_report = now;
        self.strategies.insert(strategy, params);

        Ok(ReportReceipt {
            total_debt: params.total_debt,
            debt_outstanding: self.debt_outstanding_for(&params, &*tokens),
        })
    }

    fn revoke_strategy(&mut self, strategy: Address) -> StrategyResult<()> {
        self.update_debt_ratio(strategy, 0);
        Ok(())
    }
}

/// Share-based token vault accruing yield on its reserve
#[derive(Clone, Debug)]
pub struct SimTokenVault {
    pub collateral: Address,
    pub capacity: U256,
    pub reserve: U256,
    pub total_shares: U256,
    pub shares: HashMap<Address, U256>,
    /// Yield per day, in basis points of the reserve
    pub yield_bps_per_day: u64,
    pub withdraw_fee_bps: u64,
    /// Most collateral a single withdrawal pays out
    pub liquidity: Option<U256>,
}

impl SimTokenVault {
    pub fn new(collateral: Address) -> Self {
        Self {
            collateral,
            capacity: U256::MAX,
            reserve: U256::ZERO,
            total_shares: U256::ZERO,
            shares: HashMap::new(),
            yield_bps_per_day: 0,
            withdraw_fee_bps: 0,
            liquidity: None,
        }
    }

    fn value_of(&self, holder: Address) -> U256 {
        if self.total_shares.is_zero() {
            return U256::ZERO;
        }
        let held = self.shares.get(&holder).copied().unwrap_or_default();
        held * self.reserve / self.total_shares
    }

    fn fillable(&self, holder: Address, amount: U256) -> U256 {
        let requested = amount.min(self.value_of(holder));
        match self.liquidity {
            Some(liquidity) => requested.min(liquidity),
            None => requested,
        }
    }

    fn fee(&self, amount: U256) -> U256 {
        amount * U256::from(self.withdraw_fee_bps) / U256::from(MAX_BPS)
    }
}

/// Liquidity-mining program paying rewards, already swapped into collateral
#[derive(Clone, Debug)]
pub struct SimMining {
    pub token_vault: Address,
    pub reward_token: Address,
    /// Rewards per day, in basis points of the position
    pub reward_bps_per_day: u64,
    pub pending: HashMap<Address, U256>,
}

#[derive(Clone, Debug, Default)]
pub struct SimVenue {
    pub token_vaults: HashMap<Address, SimTokenVault>,
    /// registry -> listed token vaults
    pub registries: HashMap<Address, HashSet<Address>>,
    pub mining: HashMap<Address, SimMining>,
}

impl SimVenue {
    pub fn token_vault_mut(&mut self, token_vault: Address) -> &mut SimTokenVault {
        self.token_vaults
            .get_mut(&token_vault)
            .expect("token vault is simulated")
    }

    /// Accrues rewards on the current positions, then yield on the reserves
    pub fn accrue(&mut self, seconds: u64, tokens: &mut Balances) {
        let day = U256::from(Duration::days(1).num_seconds() as u64 * MAX_BPS);
        for mining in self.mining.values_mut() {
            if let Some(token_vault) = self.token_vaults.get(&mining.token_vault) {
                for holder in token_vault.shares.keys() {
                    let reward = token_vault.value_of(*holder)
                        * U256::from(mining.reward_bps_per_day)
                        * U256::from(seconds)
                        / day;
                    *mining.pending.entry(*holder).or_default() += reward;
                }
            }
        }
        for (address, token_vault) in self.token_vaults.iter_mut() {
            let interest = token_vault.reserve
                * U256::from(token_vault.yield_bps_per_day)
                * U256::from(seconds)
                / day;
            tokens.mint(token_vault.collateral, *address, interest);
            token_vault.reserve += interest;
        }
    }
}

impl Venue for SimVenue {
    fn collateral_token(&self, token_vault: Address) -> Option<Address> {
        self.token_vaults.get(&token_vault).map(|vault| vault.collateral)
    }

    fn is_registered(&self, registry: Address, token_vault: Address) -> bool {
        self.registries
            .get(&registry)
            .map_or(false, |listed| listed.contains(&token_vault))
    }

    fn reward_token(&self, liquidity_mining: Address) -> Option<Address> {
        self.mining
            .get(&liquidity_mining)
            .map(|mining| mining.reward_token)
    }

    fn deposit_limit(&self, token_vault: Address) -> U256 {
        self.token_vaults
            .get(&token_vault)
            .map(|vault| vault.capacity.saturating_sub(vault.reserve))
            .unwrap_or_default()
    }

    fn deposit(
        &mut self,
        token_vault: Address,
        depositor: Address,
        amount: U256,
        tokens: &mut dyn TokenLedger,
    ) -> StrategyResult<()> {
        let vault = self
            .token_vaults
            .get_mut(&token_vault)
            .ok_or(StrategyError::InvalidVenue)?;
        tokens.transfer(vault.collateral, depositor, token_vault, amount)?;
        let minted = if vault.total_shares.is_zero() || vault.reserve.is_zero() {
            amount
        } else {
            amount * vault.total_shares / vault.reserve
        };
        vault.reserve += amount;
        vault.total_shares += minted;
        *vault.shares.entry(depositor).or_default() += minted;
        Ok(())
    }

    fn withdraw(
        &mut self,
        token_vault: Address,
        holder: Address,
        amount: U256,
        tokens: &mut dyn TokenLedger,
    ) -> StrategyResult<U256> {
        let vault = self
            .token_vaults
            .get_mut(&token_vault)
            .ok_or(StrategyError::InvalidVenue)?;
        let fillable = vault.fillable(holder, amount);
        if fillable.is_zero() {
            return Ok(U256::ZERO);
        }

        let held = vault.shares.get(&holder).copied().unwrap_or_default();
        let burnt = if fillable == vault.value_of(holder) {
            held
        } else {
            ((fillable * vault.total_shares + vault.reserve - U256::from(1u64)) / vault.reserve).min(held)
        };
        let paid = fillable - vault.fee(fillable);

        tokens.transfer(vault.collateral, token_vault, holder, paid)?;
        vault.reserve -= paid;
        vault.total_shares -= burnt;
        vault.shares.insert(holder, held - burnt);
        Ok(paid)
    }

    fn max_withdraw(&self, token_vault: Address, holder: Address) -> U256 {
        self.token_vaults
            .get(&token_vault)
            .map(|vault| vault.fillable(holder, U256::MAX))
            .unwrap_or_default()
    }

    fn quote_withdraw(&self, token_vault: Address, holder: Address, amount: U256) -> U256 {
        self.token_vaults
            .get(&token_vault)
            .map(|vault| {
                let fillable = vault.fillable(holder, amount);
                fillable - vault.fee(fillable)
            })
            .unwrap_or_default()
    }

    fn position_value(&self, token_vault: Address, holder: Address) -> U256 {
        self.token_vaults
            .get(&token_vault)
            .map(|vault| vault.value_of(holder))
            .unwrap_or_default()
    }

    fn transfer_position(
        &mut self,
        token_vault: Address,
        from: Address,
        to: Address,
    ) -> StrategyResult<()> {
        let vault = self
            .token_vaults
            .get_mut(&token_vault)
            .ok_or(StrategyError::InvalidVenue)?;
        let moved = vault.shares.remove(&from).unwrap_or_default();
        *vault.shares.entry(to).or_default() += moved;
        Ok(())
    }

    fn pending_rewards(&self, liquidity_mining: Address, holder: Address) -> U256 {
        self.mining
            .get(&liquidity_mining)
            .and_then(|mining| mining.pending.get(&holder).copied())
            .unwrap_or_default()
    }

    fn claim_rewards(
        &mut self,
        liquidity_mining: Address,
        holder: Address,
        tokens: &mut dyn TokenLedger,
    ) -> StrategyResult<U256> {
        let mining = self
            .mining
            .get_mut(&liquidity_mining)
            .ok_or(StrategyError::InvalidVenue)?;
        let collateral = self
            .token_vaults
            .get(&mining.token_vault)
            .map(|vault| vault.collateral)
            .ok_or(StrategyError::InvalidVenue)?;
        let amount = mining.pending.get(&holder).copied().unwrap_or_default();
        tokens.transfer(collateral, liquidity_mining, holder, amount)?;
        mining.pending.remove(&holder);
        Ok(amount)
    }
}

/// One chain: clock, balances, the vault and the venue
pub struct Env {
    pub now: u64,
    pub tokens: Balances,
    pub vault: SimVault,
    pub venue: SimVenue,
}

impl Env {
    pub fn new() -> Self {
        let mut tokens = Balances::new();
        tokens.mint(want(), user(), amount());
        tokens.mint(want(), liquidity_mining(), units(1_000_000_000));

        let mut venue = SimVenue::default();
        let mut primary = SimTokenVault::new(want());
        primary.yield_bps_per_day = 10;
        venue.token_vaults.insert(token_vault(), primary);
        venue
            .token_vaults
            .insert(alt_token_vault(), SimTokenVault::new(want()));
        venue
            .token_vaults
            .insert(foreign_token_vault(), SimTokenVault::new(other_token()));
        venue
            .token_vaults
            .insert(unlisted_token_vault(), SimTokenVault::new(want()));
        venue.registries.insert(
            registry(),
            [token_vault(), alt_token_vault(), foreign_token_vault()]
                .into_iter()
                .collect(),
        );
        venue.mining.insert(
            liquidity_mining(),
            SimMining {
                token_vault: token_vault(),
                reward_token: reward_token(),
                reward_bps_per_day: 5,
                pending: HashMap::new(),
            },
        );

        Self {
            now: 1_600_000_000,
            tokens,
            vault: SimVault::new(),
            venue,
        }
    }

    pub fn ctx(&mut self, caller: Address) -> CallContext<'_> {
        CallContext::new(
            caller,
            self.now,
            &mut self.vault,
            &mut self.venue,
            &mut self.tokens,
        )
    }

    /// Deploys an instance without registering it in the vault
    pub fn deploy_at(&mut self, address: Address, external_deposit: ExternalDeposit) -> Strategy {
        let ctx = self.ctx(strategist());
        Strategy::deploy(address, &ctx, init_args(external_deposit)).expect("deployment succeeds")
    }

    /// Deploys the primary strategy and adds it to the vault with a 100% debt ratio
    pub fn deploy(&mut self) -> Strategy {
        let strategy = self.deploy_at(strategy_address(), primary_deposit());
        self.vault
            .add_strategy(strategy.address(), MAX_BPS, self.now);
        strategy
    }

    pub fn deposit(&mut self, depositor: Address, amount: U256) -> U256 {
        self.vault
            .deposit(depositor, amount, &mut self.tokens, self.now)
            .expect("deposit succeeds")
    }

    /// Redeems `shares`, pulling from `strategy` what the vault does not hold
    pub fn withdraw(&mut self, holder: Address, shares: U256, strategy: &mut Strategy) -> U256 {
        let mut value = self.vault.share_value(shares, &self.tokens, self.now);
        let idle = self.vault.idle(&self.tokens);
        if value > idle {
            let mut ctx = self.ctx(vault_address());
            let liquidation = strategy
                .withdraw(&mut ctx, value - idle)
                .expect("strategy serves the withdrawal");
            self.vault.settle_withdrawal(strategy.address(), liquidation);
            value -= liquidation.loss;
        }
        self.vault
            .redeem(holder, shares, value, &mut self.tokens)
            .expect("redeem succeeds")
    }

    pub fn withdraw_all(&mut self, holder: Address, strategy: &mut Strategy) -> U256 {
        let shares = self.tokens.balance_of(vault_address(), holder);
        self.withdraw(holder, shares, strategy)
    }

    pub fn harvest(&mut self, strategy: &mut Strategy) -> HarvestReport {
        let mut ctx = self.ctx(keeper());
        strategy.harvest(&mut ctx).expect("harvest succeeds")
    }

    pub fn eta(&mut self, strategy: &Strategy) -> U256 {
        let ctx = self.ctx(Address::ZERO);
        strategy.estimated_total_assets(&ctx)
    }

    pub fn balance(&self, token: Address, holder: Address) -> U256 {
        self.tokens.balance_of(token, holder)
    }

    pub fn price_per_share(&self) -> U256 {
        self.vault.price_per_share(&self.tokens, self.now)
    }

    /// Advances the clock, accruing venue yield and rewards
    pub fn sleep(&mut self, seconds: u64) {
        self.now += seconds;
        self.venue.accrue(seconds, &mut self.tokens);
    }

    /// Deposits the fixture amount and runs the first harvest
    pub fn funded(&mut self, strategy: &mut Strategy) {
        self.deposit(user(), amount());
        self.harvest(strategy);
    }
}
