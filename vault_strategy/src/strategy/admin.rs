//! Initialization, role management and report parameters

use alloy_primitives::{Address, U256};

use crate::{
    adapter::CapitalAdapter,
    auth::{authorize, Operation, Roles},
    constants::MAX_BPS,
    context::CallContext,
    journal::LogType,
    types::InitArgs,
    utils::error::*,
};

use super::{
    controller::Strategy,
    data::Lifecycle,
    settings::StrategySettings,
};

impl Strategy {
    /// Creates an original instance at `address` and initializes it in one step
    pub fn deploy(address: Address, ctx: &CallContext, args: InitArgs) -> StrategyResult<Self> {
        let mut strategy = Self::new(address);
        strategy.initialize(ctx, args)?;
        Ok(strategy)
    }

    /// One-time setup of roles, vault binding and venue target.
    /// Callable by the vault's governance or management, or by the strategist
    /// being installed. Moves no capital.
    pub fn initialize(&mut self, ctx: &CallContext, args: InitArgs) -> StrategyResult<()> {
        let result = self.apply_init_args(ctx, args);
        let note = match &result {
            Ok(()) => format!(
                "Initialized for vault {} on token vault {}.",
                args.vault, args.external_deposit.token_vault
            ),
            Err(_) => "Initialization rejected.".to_string(),
        };
        self.record(ctx.now, LogType::Initialization, &result, note);
        result
    }

    fn apply_init_args(&mut self, ctx: &CallContext, args: InitArgs) -> StrategyResult<()> {
        if self.data.lifecycle != Lifecycle::Uninitialized {
            return Err(StrategyError::AlreadyInitialized);
        }
        if args.vault != ctx.vault.address() {
            return Err(precondition_err(
                "Initialization targets a vault other than the one in context.",
            ));
        }

        let roles = Roles {
            vault: args.vault,
            governance: ctx.vault.governance(),
            management: ctx.vault.management(),
            strategist: args.strategist,
            keeper: args.keeper,
        };
        authorize(&roles, ctx.caller, Operation::Initialize)?;
        for role in [args.strategist, args.rewards, args.keeper] {
            ensure_non_zero(role)?;
        }

        // want is whatever the vault manages
        let want = ctx.vault.token();
        CapitalAdapter::validate(want, &args.external_deposit, &*ctx.venue)?;

        let mut settings = StrategySettings::default();
        settings
            .want(want)
            .vault(args.vault)
            .strategist(args.strategist)
            .rewards(args.rewards)
            .keeper(args.keeper);

        self.settings = settings;
        self.adapter = CapitalAdapter::new(want, self.address(), args.external_deposit);
        self.data.lifecycle(Lifecycle::Active);
        Ok(())
    }

    /// Transfers the full balance of `token` to governance.
    /// `want` and the vault's share token are protected.
    pub fn sweep(&mut self, ctx: &mut CallContext, token: Address) -> StrategyResult<U256> {
        let result = self.sweep_token(ctx, token);
        let note = match &result {
            Ok(amount) => format!("Swept {} of token {} to governance.", amount, token),
            Err(_) => format!("Sweep of token {} rejected.", token),
        };
        self.record(ctx.now, LogType::Sweep, &result, note);
        result
    }

    fn sweep_token(&mut self, ctx: &mut CallContext, token: Address) -> StrategyResult<U256> {
        self.guard(ctx, Operation::Sweep)?;
        if token == self.settings.want {
            return Err(StrategyError::ProtectedToken("!want".to_string()));
        }
        if token == self.settings.vault {
            return Err(StrategyError::ProtectedToken("!shares".to_string()));
        }

        let amount = ctx.tokens.balance_of(token, self.address());
        if !amount.is_zero() {
            let governance = ctx.vault.governance();
            ctx.tokens.transfer(token, self.address(), governance, amount)?;
        }
        Ok(amount)
    }

    pub fn set_strategist(&mut self, ctx: &CallContext, strategist: Address) -> StrategyResult<()> {
        self.administer(
            ctx,
            Operation::SetStrategist,
            format!("Strategist set to {}.", strategist),
            |settings| {
                ensure_non_zero(strategist)?;
                settings.strategist(strategist);
                Ok(())
            },
        )
    }

    pub fn set_keeper(&mut self, ctx: &CallContext, keeper: Address) -> StrategyResult<()> {
        self.administer(
            ctx,
            Operation::SetKeeper,
            format!("Keeper set to {}.", keeper),
            |settings| {
                ensure_non_zero(keeper)?;
                settings.keeper(keeper);
                Ok(())
            },
        )
    }

    pub fn set_rewards(&mut self, ctx: &CallContext, rewards: Address) -> StrategyResult<()> {
        self.administer(
            ctx,
            Operation::SetRewards,
            format!("Rewards receiver set to {}.", rewards),
            |settings| {
                ensure_non_zero(rewards)?;
                settings.rewards(rewards);
                Ok(())
            },
        )
    }

    pub fn set_min_report_delay(&mut self, ctx: &CallContext, delay: u64) -> StrategyResult<()> {
        self.administer(
            ctx,
            Operation::SetReportParams,
            format!("Minimum report delay set to {}s.", delay),
            |settings| {
                settings.min_report_delay(delay);
                Ok(())
            },
        )
    }

    pub fn set_max_report_delay(&mut self, ctx: &CallContext, delay: u64) -> StrategyResult<()> {
        self.administer(
            ctx,
            Operation::SetReportParams,
            format!("Maximum report delay set to {}s.", delay),
            |settings| {
                settings.max_report_delay(delay);
                Ok(())
            },
        )
    }

    pub fn set_profit_factor(&mut self, ctx: &CallContext, profit_factor: u64) -> StrategyResult<()> {
        self.administer(
            ctx,
            Operation::SetReportParams,
            format!("Profit factor set to {}.", profit_factor),
            |settings| {
                settings.profit_factor(profit_factor);
                Ok(())
            },
        )
    }

    pub fn set_debt_threshold(&mut self, ctx: &CallContext, debt_threshold: U256) -> StrategyResult<()> {
        self.administer(
            ctx,
            Operation::SetReportParams,
            format!("Debt threshold set to {}.", debt_threshold),
            |settings| {
                settings.debt_threshold(debt_threshold);
                Ok(())
            },
        )
    }

    pub fn set_max_shortfall(&mut self, ctx: &CallContext, max_shortfall_bps: u64) -> StrategyResult<()> {
        self.administer(
            ctx,
            Operation::SetMaxShortfall,
            format!("Maximum divest shortfall set to {} bps.", max_shortfall_bps),
            |settings| {
                if max_shortfall_bps > MAX_BPS {
                    return Err(precondition_err(format!(
                        "Shortfall bound {} exceeds {} bps.",
                        max_shortfall_bps, MAX_BPS
                    )));
                }
                settings.max_shortfall_bps(max_shortfall_bps);
                Ok(())
            },
        )
    }

    /// Checks `operation` against the caller, applies `update` to the settings and journals the outcome
    fn administer<F>(
        &mut self,
        ctx: &CallContext,
        operation: Operation,
        note: String,
        update: F,
    ) -> StrategyResult<()>
    where
        F: FnOnce(&mut StrategySettings) -> StrategyResult<()>,
    {
        let result = self
            .guard(ctx, operation)
            .and_then(|_| update(&mut self.settings));
        self.record(ctx.now, LogType::Admin, &result, note);
        result
    }
}

fn ensure_non_zero(address: Address) -> StrategyResult<()> {
    if address == Address::ZERO {
        return Err(precondition_err("Role holders cannot be the zero address."));
    }
    Ok(())
}
