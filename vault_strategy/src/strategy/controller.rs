//! The strategy controller that runs the harvest cycle.

use alloy_primitives::{Address, U256};

use crate::{
    accounting::{
        amount_to_free, debt_outstanding, settle, HarvestReport, LedgerSnapshot, Liquidation,
    },
    adapter::{CapitalAdapter, DivestOutcome, ExternalDeposit},
    auth::{authorize, Operation, Roles},
    context::CallContext,
    journal::{JournalCollection, LogType},
    types::OutboundCall,
    utils::error::*,
    vault::StrategyParams,
};

use super::{
    data::{Lifecycle, StrategyData},
    settings::{StrategySettings, StrategySettingsQuery},
};

#[derive(Debug)]
pub struct Strategy {
    /// Address the instance lives at, also the holder of its balances
    address: Address,
    /// Address of the instance whose logic this one runs. Equal to `address` for originals.
    implementation: Address,
    /// Settings and configurations
    pub(crate) settings: StrategySettings,
    /// Mutable state
    pub(crate) data: StrategyData,
    /// Binding to the external venue
    pub(crate) adapter: CapitalAdapter,
    pub(crate) journal: JournalCollection,
}

impl Strategy {
    /// Uninitialized original instance living at `address`
    pub fn new(address: Address) -> Self {
        Self::with_implementation(address, address)
    }

    pub(crate) fn with_implementation(address: Address, implementation: Address) -> Self {
        Self {
            address,
            implementation,
            settings: StrategySettings::default(),
            data: StrategyData::default(),
            adapter: CapitalAdapter::default(),
            journal: JournalCollection::new(address),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn implementation(&self) -> Address {
        self.implementation
    }

    /// `false` for instances produced by `clone_strategy`
    pub fn is_original(&self) -> bool {
        self.implementation == self.address
    }

    pub fn want(&self) -> Address {
        self.settings.want
    }

    pub fn vault(&self) -> Address {
        self.settings.vault
    }

    pub fn settings(&self) -> &StrategySettings {
        &self.settings
    }

    pub fn data(&self) -> &StrategyData {
        &self.data
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.data.lifecycle
    }

    pub fn is_emergency_exit(&self) -> bool {
        self.data.emergency_exit
    }

    pub fn external_deposit(&self) -> &ExternalDeposit {
        self.adapter.external_deposit()
    }

    pub fn journal(&self) -> &JournalCollection {
        &self.journal
    }

    pub fn query(&self) -> StrategySettingsQuery {
        StrategySettingsQuery::new(
            self.address,
            &self.settings,
            self.adapter.external_deposit(),
            self.data.emergency_exit,
        )
    }

    /// Liquid want plus the valuation of the venue position.
    /// Stays readable after migration.
    pub fn estimated_total_assets(&self, ctx: &CallContext) -> U256 {
        if self.data.lifecycle == Lifecycle::Uninitialized {
            return U256::ZERO;
        }
        self.liquid_want(ctx)
            .saturating_add(self.adapter.value_position(&*ctx.venue))
    }

    /// Runs one harvest cycle: realizes profit, pays back outstanding debt,
    /// reports to the vault and invests what the vault leaves with the strategy.
    pub fn harvest(&mut self, ctx: &mut CallContext) -> StrategyResult<HarvestReport> {
        let result = self.run_harvest(ctx);
        let note = match &result {
            Ok(report) => format!(
                "Harvest settled with profit {}, loss {} and debt payment {}.",
                report.profit, report.loss, report.debt_payment
            ),
            Err(_) => "Harvest aborted.".to_string(),
        };
        self.record(ctx.now, LogType::Harvest, &result, note);
        result
    }

    fn run_harvest(&mut self, ctx: &mut CallContext) -> StrategyResult<HarvestReport> {
        self.guard(ctx, Operation::Harvest)?;

        // Fetch the vault's view of this strategy
        let params = self.vault_params(ctx)?;
        let vault_assets = ctx.vault.total_assets(&*ctx.tokens);
        let outstanding = debt_outstanding(params.total_debt, params.debt_ratio, vault_assets)?;

        let mut before = self.snapshot(ctx, params.total_debt, outstanding);

        if self.data.emergency_exit {
            // Everything goes back to the vault, whatever the venue manages to return
            before = before.calling_all_debt();
            self.adapter.claim_rewards(ctx.venue, ctx.tokens)?;
            let outcome = self.adapter.divest_all(ctx.venue, ctx.tokens)?;
            self.note_shortfall(ctx.now, &outcome);
        } else {
            let to_free = amount_to_free(&before);
            if !to_free.is_zero() {
                self.adapter.ensure_divestable(
                    to_free,
                    &*ctx.venue,
                    self.settings.max_shortfall_bps,
                )?;
            }

            // Claimed rewards are liquid and reduce what the venue has to return
            self.adapter.claim_rewards(ctx.venue, ctx.tokens)?;
            let plan = self.snapshot(ctx, before.total_debt, before.debt_outstanding);
            let outcome = self
                .adapter
                .divest(amount_to_free(&plan), ctx.venue, ctx.tokens)?;
            self.note_shortfall(ctx.now, &outcome);
        }

        // Settle from what is actually held after divesting
        let after = self.snapshot(ctx, before.total_debt, before.debt_outstanding);
        let report = settle(&after);

        let receipt = ctx
            .vault
            .report(self.address, report, ctx.now, ctx.tokens)?;
        let call = OutboundCall::report(self.settings.vault, &report);
        self.journal.append_note(
            ctx.now,
            Ok(()),
            LogType::Report,
            format!(
                "Reported to {} with calldata {}. Debt after report: {}, outstanding: {}.",
                call.to,
                call.data_hex(),
                receipt.total_debt,
                receipt.debt_outstanding
            ),
        );

        if !self.data.emergency_exit {
            self.adjust_position(ctx, receipt.debt_outstanding)?;
        }

        self.data.last_report(ctx.now).last_harvest(report);
        Ok(report)
    }

    /// Compounds liquidity-mining rewards and invests idle want above the
    /// outstanding debt. Never reports. Returns the amount invested.
    pub fn tend(&mut self, ctx: &mut CallContext) -> StrategyResult<U256> {
        let result = self.run_tend(ctx);
        let note = match &result {
            Ok(invested) => format!("Tend invested {}.", invested),
            Err(_) => "Tend aborted.".to_string(),
        };
        self.record(ctx.now, LogType::Tend, &result, note);
        result
    }

    fn run_tend(&mut self, ctx: &mut CallContext) -> StrategyResult<U256> {
        self.guard(ctx, Operation::Tend)?;
        let outstanding = self.current_debt_outstanding(ctx)?;
        self.adapter.claim_rewards(ctx.venue, ctx.tokens)?;
        self.adjust_position(ctx, outstanding)
    }

    /// Serves a vault withdrawal of `amount_needed` want, divesting what is not
    /// liquid. The part that cannot be served is returned as a loss.
    pub fn withdraw(&mut self, ctx: &mut CallContext, amount_needed: U256) -> StrategyResult<Liquidation> {
        let result = self.liquidate(ctx, amount_needed);
        let note = match &result {
            Ok(liquidation) => format!(
                "Vault withdrawal served {} with a loss of {}.",
                liquidation.freed, liquidation.loss
            ),
            Err(_) => format!("Vault withdrawal of {} aborted.", amount_needed),
        };
        self.record(ctx.now, LogType::Info, &result, note);
        result
    }

    fn liquidate(&mut self, ctx: &mut CallContext, amount_needed: U256) -> StrategyResult<Liquidation> {
        self.guard(ctx, Operation::Withdraw)?;

        let liquid = self.liquid_want(ctx);
        if liquid < amount_needed {
            let to_free = amount_needed - liquid;
            if !self.data.emergency_exit {
                self.adapter.ensure_divestable(
                    to_free,
                    &*ctx.venue,
                    self.settings.max_shortfall_bps,
                )?;
            }
            let outcome = self.adapter.divest(to_free, ctx.venue, ctx.tokens)?;
            self.note_shortfall(ctx.now, &outcome);
        }

        let liquidation = Liquidation::serve(amount_needed, self.liquid_want(ctx));
        if !liquidation.freed.is_zero() {
            ctx.tokens.transfer(
                self.settings.want,
                self.address,
                self.settings.vault,
                liquidation.freed,
            )?;
        }
        Ok(liquidation)
    }

    /// Irreversibly switches the strategy into emergency exit and revokes it
    /// at the vault. Calling it again is a no-op.
    pub fn set_emergency_exit(&mut self, ctx: &mut CallContext) -> StrategyResult<()> {
        let result = self.enter_emergency_exit(ctx);
        let note = format!(
            "Emergency exit engaged. Revocation calldata {}.",
            OutboundCall::revoke_strategy(self.settings.vault).data_hex()
        );
        self.record(ctx.now, LogType::EmergencyExit, &result, note);
        result
    }

    fn enter_emergency_exit(&mut self, ctx: &mut CallContext) -> StrategyResult<()> {
        self.guard(ctx, Operation::SetEmergencyExit)?;
        if self.data.emergency_exit {
            return Ok(());
        }
        ctx.vault.revoke_strategy(self.address)?;
        self.data.emergency_exit(true);
        Ok(())
    }

    /// Pulls `amount` (or the whole position, rewards included, for `None`)
    /// out of the venue into liquid want. Any shortfall is accepted.
    pub fn emergency_withdrawal(
        &mut self,
        ctx: &mut CallContext,
        amount: Option<U256>,
    ) -> StrategyResult<DivestOutcome> {
        let result = self.withdraw_from_venue(ctx, amount);
        let note = match &result {
            Ok(outcome) => format!(
                "Emergency withdrawal recovered {} of {} requested.",
                outcome.recovered, outcome.requested
            ),
            Err(_) => "Emergency withdrawal aborted.".to_string(),
        };
        self.record(ctx.now, LogType::EmergencyExit, &result, note);
        result
    }

    fn withdraw_from_venue(
        &mut self,
        ctx: &mut CallContext,
        amount: Option<U256>,
    ) -> StrategyResult<DivestOutcome> {
        self.guard(ctx, Operation::EmergencyWithdrawal)?;
        match amount {
            Some(amount) => self.adapter.divest(amount, ctx.venue, ctx.tokens),
            None => {
                self.adapter.claim_rewards(ctx.venue, ctx.tokens)?;
                self.adapter.divest_all(ctx.venue, ctx.tokens)
            }
        }
    }

    /// Hands every asset over to `successor` and retires this instance.
    ///
    /// The venue position moves as is when both target the same token vault,
    /// otherwise it is divested first and must leave the venue completely.
    /// Returns the value the successor holds afterward.
    pub fn migrate(&mut self, ctx: &mut CallContext, successor: &mut Strategy) -> StrategyResult<U256> {
        let result = self.hand_over(ctx, successor);
        let note = match &result {
            Ok(moved) => format!("Migrated {} to {}.", moved, successor.address),
            Err(_) => format!("Migration to {} aborted.", successor.address),
        };
        self.record(ctx.now, LogType::Migration, &result, note);
        if let Ok(moved) = &result {
            successor.journal.append_note(
                ctx.now,
                Ok(()),
                LogType::Migration,
                format!("Received {} from {}.", moved, self.address),
            );
        }
        result
    }

    fn hand_over(&mut self, ctx: &mut CallContext, successor: &Strategy) -> StrategyResult<U256> {
        self.guard(ctx, Operation::Migrate)?;
        self.ensure_valid_successor(ctx, successor)?;

        let same_token_vault =
            successor.external_deposit().token_vault == self.external_deposit().token_vault;
        if !same_token_vault {
            // the whole position has to leave before this instance retires
            self.adapter
                .ensure_exitable(&*ctx.venue, self.settings.max_shortfall_bps)?;
        }

        self.adapter.claim_rewards(ctx.venue, ctx.tokens)?;
        if same_token_vault {
            self.adapter.transfer_position(&successor.adapter, ctx.venue)?;
        } else {
            let outcome = self.adapter.divest_all(ctx.venue, ctx.tokens)?;
            self.note_shortfall(ctx.now, &outcome);
            let leftover = self.adapter.value_position(&*ctx.venue);
            if !leftover.is_zero() {
                return Err(StrategyError::InsufficientLiquidity {
                    requested: outcome.requested.to_string(),
                    available: outcome.recovered.to_string(),
                });
            }
        }

        // Transfer the remaining liquid want
        let liquid = self.liquid_want(ctx);
        if !liquid.is_zero() {
            ctx.tokens
                .transfer(self.settings.want, self.address, successor.address, liquid)?;
        }

        self.data.lifecycle(Lifecycle::Migrated {
            successor: successor.address,
            at: ctx.now,
        });
        Ok(successor.estimated_total_assets(ctx))
    }

    fn ensure_valid_successor(&self, ctx: &CallContext, successor: &Strategy) -> StrategyResult<()> {
        if successor.data.lifecycle != Lifecycle::Active {
            return Err(precondition_err("Migration target is not an active strategy."));
        }
        if successor.address == self.address {
            return Err(precondition_err("A strategy cannot migrate to itself."));
        }
        if successor.settings.vault != self.settings.vault || successor.settings.want != self.settings.want {
            return Err(precondition_err(
                "Migration target belongs to another vault or manages another asset.",
            ));
        }
        if !successor.estimated_total_assets(ctx).is_zero() {
            return Err(precondition_err("Migration target already manages funds."));
        }
        Ok(())
    }

    /// Moves the capital to `new_deposit`. The target is validated before any
    /// funds move; the recovered want is re-invested unless in emergency exit.
    pub fn migrate_token_vault(
        &mut self,
        ctx: &mut CallContext,
        new_deposit: ExternalDeposit,
    ) -> StrategyResult<U256> {
        let result = self.switch_token_vault(ctx, new_deposit);
        let note = match &result {
            Ok(recovered) => format!(
                "Moved to token vault {} with {} recovered from the previous one.",
                new_deposit.token_vault, recovered
            ),
            Err(_) => format!("Move to token vault {} aborted.", new_deposit.token_vault),
        };
        self.record(ctx.now, LogType::Migration, &result, note);
        result
    }

    fn switch_token_vault(
        &mut self,
        ctx: &mut CallContext,
        new_deposit: ExternalDeposit,
    ) -> StrategyResult<U256> {
        self.guard(ctx, Operation::MigrateTokenVault)?;
        let outstanding = self.current_debt_outstanding(ctx)?;

        let recovered = self.adapter.switch_venue(
            new_deposit,
            ctx.venue,
            ctx.tokens,
            self.settings.max_shortfall_bps,
        )?;

        if !self.data.emergency_exit {
            self.adjust_position(ctx, outstanding)?;
        }
        Ok(recovered)
    }

    /// Invests liquid want above `debt_outstanding`. Nothing is invested in emergency exit.
    fn adjust_position(&mut self, ctx: &mut CallContext, debt_outstanding: U256) -> StrategyResult<U256> {
        if self.data.emergency_exit {
            return Ok(U256::ZERO);
        }
        let liquid = self.liquid_want(ctx);
        if liquid <= debt_outstanding {
            return Ok(U256::ZERO);
        }
        self.adapter
            .invest(liquid - debt_outstanding, ctx.venue, ctx.tokens)
    }

    /// Lifecycle, vault and role checks shared by every gated operation
    pub(crate) fn guard(&self, ctx: &CallContext, operation: Operation) -> StrategyResult<()> {
        self.ensure_live()?;
        if ctx.vault.address() != self.settings.vault {
            return Err(precondition_err("The call targets another vault."));
        }
        authorize(&self.roles(ctx), ctx.caller, operation)
    }

    pub(crate) fn ensure_live(&self) -> StrategyResult<()> {
        match self.data.lifecycle {
            Lifecycle::Uninitialized => Err(StrategyError::NotInitialized),
            Lifecycle::Active => Ok(()),
            Lifecycle::Migrated { .. } => Err(StrategyError::Migrated),
        }
    }

    fn roles(&self, ctx: &CallContext) -> Roles {
        Roles {
            vault: self.settings.vault,
            governance: ctx.vault.governance(),
            management: ctx.vault.management(),
            strategist: self.settings.strategist,
            keeper: self.settings.keeper,
        }
    }

    pub(crate) fn vault_params(&self, ctx: &CallContext) -> StrategyResult<StrategyParams> {
        ctx.vault
            .strategy_params(self.address)
            .ok_or_else(|| precondition_err("The strategy is not registered in its vault."))
    }

    pub(crate) fn current_debt_outstanding(&self, ctx: &CallContext) -> StrategyResult<U256> {
        let params = self.vault_params(ctx)?;
        debt_outstanding(
            params.total_debt,
            params.debt_ratio,
            ctx.vault.total_assets(&*ctx.tokens),
        )
    }

    pub(crate) fn liquid_want(&self, ctx: &CallContext) -> U256 {
        ctx.tokens.balance_of(self.settings.want, self.address)
    }

    fn snapshot(&self, ctx: &CallContext, total_debt: U256, debt_outstanding: U256) -> LedgerSnapshot {
        LedgerSnapshot {
            liquid: self.liquid_want(ctx),
            position_value: self.adapter.value_position(&*ctx.venue),
            total_debt,
            debt_outstanding,
        }
    }

    fn note_shortfall(&mut self, now: u64, outcome: &DivestOutcome) {
        let shortfall = outcome.shortfall();
        if !shortfall.is_zero() {
            self.journal.append_note(
                now,
                Ok(()),
                LogType::Info,
                format!(
                    "Venue returned {} of {} requested, absorbed a shortfall of {}.",
                    outcome.recovered, outcome.requested, shortfall
                ),
            );
        }
    }

    /// Journals the outcome of an operation
    pub(crate) fn record<T, S: AsRef<str>>(
        &mut self,
        now: u64,
        log_type: LogType,
        result: &StrategyResult<T>,
        note: S,
    ) {
        let entry = match result {
            Ok(_) => Ok(()),
            Err(err) => Err(err.clone()),
        };
        self.journal.append_note(now, entry, log_type, note);
    }
}
