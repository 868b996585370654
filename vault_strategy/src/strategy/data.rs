//! Mutable strategy data

use alloy_primitives::Address;

use crate::accounting::HarvestReport;

/// Lifecycle of a strategy instance.
///
/// ```plain
/// Uninitialized ──initialize──► Active ──migrate──► Migrated
///                               │    ▲
///                   setEmergencyExit (flag, stays Active)
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    Active,
    /// Terminal. Everything was handed over to `successor` at `at`.
    Migrated { successor: Address, at: u64 },
}

/// Struct containing all mutable data of a strategy
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StrategyData {
    pub lifecycle: Lifecycle,
    /// Once set, harvests only divest
    pub emergency_exit: bool,
    /// Timestamp of the last successful harvest, in seconds
    pub last_report: u64,
    /// Outcome of the last successful harvest
    pub last_harvest: Option<HarvestReport>,
    /// Number of clones created from this instance
    pub clone_nonce: u64,
}

impl StrategyData {
    pub fn lifecycle(&mut self, lifecycle: Lifecycle) -> &mut Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn emergency_exit(&mut self, emergency_exit: bool) -> &mut Self {
        self.emergency_exit = emergency_exit;
        self
    }

    pub fn last_report(&mut self, last_report: u64) -> &mut Self {
        self.last_report = last_report;
        self
    }

    pub fn last_harvest(&mut self, last_harvest: HarvestReport) -> &mut Self {
        self.last_harvest = Some(last_harvest);
        self
    }
}
