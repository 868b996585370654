//! Keeper advice. Both triggers are read-only.

use alloy_primitives::U256;

use crate::{accounting::debt_outstanding, context::CallContext, utils::error::StrategyResult};

use super::controller::Strategy;

impl Strategy {
    /// Whether a keeper paying `call_cost` (in want) should call `harvest` now
    pub fn harvest_trigger(&self, ctx: &CallContext, call_cost: U256) -> StrategyResult<bool> {
        if self.ensure_live().is_err() {
            return Ok(false);
        }
        let params = match ctx.vault.strategy_params(self.address()) {
            Some(params) => params,
            None => return Ok(false),
        };

        // Respect the report window
        let since_last_report = ctx.now.saturating_sub(params.last_report);
        if since_last_report < self.settings.min_report_delay {
            return Ok(false);
        }
        if since_last_report >= self.settings.max_report_delay {
            return Ok(true);
        }

        // The vault wants funds back
        let vault_assets = ctx.vault.total_assets(&*ctx.tokens);
        let outstanding = debt_outstanding(params.total_debt, params.debt_ratio, vault_assets)?;
        if outstanding > self.settings.debt_threshold {
            return Ok(true);
        }

        // A loss worth reporting
        let total = self.estimated_total_assets(ctx);
        if total.saturating_add(self.settings.debt_threshold) < params.total_debt {
            return Ok(true);
        }

        // Otherwise only when the value moved outweighs the call cost
        let profit = total.saturating_sub(params.total_debt);
        let credit = ctx.vault.credit_available(self.address(), &*ctx.tokens);
        Ok(self.scaled_cost(call_cost) < credit.saturating_add(profit))
    }

    /// Whether a keeper paying `call_cost` (in want) should call `tend` now
    pub fn tend_trigger(&self, ctx: &CallContext, call_cost: U256) -> StrategyResult<bool> {
        if self.ensure_live().is_err() || self.data.emergency_exit {
            return Ok(false);
        }
        if ctx.vault.strategy_params(self.address()).is_none() {
            return Ok(false);
        }

        let outstanding = self.current_debt_outstanding(ctx)?;
        let idle_surplus = self.liquid_want(ctx).saturating_sub(outstanding);
        let benefit = self
            .adapter
            .pending_rewards(&*ctx.venue)
            .saturating_add(idle_surplus);

        Ok(!benefit.is_zero() && self.scaled_cost(call_cost) < benefit)
    }

    fn scaled_cost(&self, call_cost: U256) -> U256 {
        U256::from(self.settings.profit_factor).saturating_mul(call_cost)
    }
}
