//! Accounting ledger
//!
//! Pure functions that turn balances into the numbers reported to the vault.
//! Nothing in here talks to a collaborator, so every result can be replayed
//! from its inputs alone.

use alloy_primitives::U256;

use crate::{
    constants::{max_bps, MAX_BPS},
    utils::error::{arithmetic_err, StrategyResult},
};

/// Balances observed at one point of a harvest
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// Want held directly by the strategy
    pub liquid: U256,
    /// Valuation of the venue position, in want
    pub position_value: U256,
    /// What the vault considers lent to the strategy
    pub total_debt: U256,
    /// Part of `total_debt` the vault wants back this cycle
    pub debt_outstanding: U256,
}

impl LedgerSnapshot {
    /// Liquid want plus the position valuation
    pub fn total_assets(&self) -> U256 {
        self.liquid.saturating_add(self.position_value)
    }

    /// The same snapshot with the whole debt called back
    pub fn calling_all_debt(mut self) -> Self {
        self.debt_outstanding = self.debt_outstanding.max(self.total_debt);
        self
    }
}

/// Outcome of one harvest cycle, as reported to the vault
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub profit: U256,
    pub loss: U256,
    pub debt_payment: U256,
}

/// Outcome of a vault withdrawal served by the strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Liquidation {
    /// Want handed to the vault
    pub freed: U256,
    /// Part of the request the strategy could not serve
    pub loss: U256,
}

impl Liquidation {
    /// Serves `amount_needed` out of `liquid` want
    pub fn serve(amount_needed: U256, liquid: U256) -> Self {
        let freed = amount_needed.min(liquid);
        Self {
            freed,
            loss: amount_needed - freed,
        }
    }
}

/// `amount × bps / MAX_BPS`
pub fn bps_of(amount: U256, bps: u64) -> StrategyResult<U256> {
    amount
        .checked_mul(U256::from(bps))
        .map(|scaled| scaled / max_bps())
        .ok_or_else(|| arithmetic_err("Basis point multiplication overflowed."))
}

/// Debt the vault wants the strategy to manage: `debt_ratio × vault_total_assets`
pub fn target_debt(debt_ratio: u64, vault_total_assets: U256) -> StrategyResult<U256> {
    if debt_ratio > MAX_BPS {
        return Err(arithmetic_err(format!(
            "Debt ratio {} exceeds {} bps.",
            debt_ratio, MAX_BPS
        )));
    }
    bps_of(vault_total_assets, debt_ratio)
}

/// `max(0, total_debt − target_debt)`
pub fn debt_outstanding(
    total_debt: U256,
    debt_ratio: u64,
    vault_total_assets: U256,
) -> StrategyResult<U256> {
    Ok(total_debt.saturating_sub(target_debt(debt_ratio, vault_total_assets)?))
}

/// Amount the venue has to return so that the outstanding debt and the
/// unrealized profit both become liquid. Capped by the position itself.
pub fn amount_to_free(snapshot: &LedgerSnapshot) -> U256 {
    let unrealized_profit = snapshot.total_assets().saturating_sub(snapshot.total_debt);
    snapshot
        .debt_outstanding
        .saturating_add(unrealized_profit)
        .saturating_sub(snapshot.liquid)
        .min(snapshot.position_value)
}

/// Settles a cycle from the balances observed after divesting.
///
/// Profit and loss are mutually exclusive, and `profit + debt_payment` never
/// exceeds the liquid balance, so everything reported can actually be
/// transferred to the vault.
pub fn settle(snapshot: &LedgerSnapshot) -> HarvestReport {
    let total_assets = snapshot.total_assets();
    let debt_payment = snapshot.debt_outstanding.min(snapshot.liquid);

    if total_assets >= snapshot.total_debt {
        let transferable = snapshot.liquid - debt_payment;
        HarvestReport {
            profit: (total_assets - snapshot.total_debt).min(transferable),
            loss: U256::ZERO,
            debt_payment,
        }
    } else {
        HarvestReport {
            profit: U256::ZERO,
            loss: snapshot.total_debt - total_assets,
            debt_payment,
        }
    }
}

/// Returns `true` if recovering only `available` out of `requested` misses by
/// more than `max_shortfall_bps` of the request.
pub fn exceeds_shortfall_tolerance(
    requested: U256,
    available: U256,
    max_shortfall_bps: u64,
) -> StrategyResult<bool> {
    if available >= requested {
        return Ok(false);
    }
    let shortfall = requested - available;
    let scaled_shortfall = shortfall
        .checked_mul(max_bps())
        .ok_or_else(|| arithmetic_err("Shortfall scaling overflowed."))?;
    let allowance = requested
        .checked_mul(U256::from(max_shortfall_bps))
        .ok_or_else(|| arithmetic_err("Shortfall allowance overflowed."))?;
    Ok(scaled_shortfall > allowance)
}
