//! Strategy Constants
//! Defaults mirror the reference `BaseStrategy` parameters; governance can tune
//! every one of them per instance after initialization.

use alloy_primitives::U256;
use chrono::Duration;

/// Denominator for debt ratios and tolerances, expressed in basis points
pub const MAX_BPS: u64 = 10_000;
pub fn max_bps() -> U256 {
    U256::from(MAX_BPS)
}

/// Minimum number of seconds between two harvests
pub const DEFAULT_MIN_REPORT_DELAY: u64 = 0;

/// Maximum number of seconds between two harvests before the trigger forces one
pub fn default_max_report_delay() -> u64 {
    Duration::days(1).num_seconds() as u64
}

/// Multiple of the call cost the expected benefit must exceed before a trigger fires
pub const DEFAULT_PROFIT_FACTOR: u64 = 100;

/// Outstanding debt (or loss) below this amount does not trigger a harvest on its own
pub fn default_debt_threshold() -> U256 {
    U256::ZERO
}

/// Largest divest shortfall, in basis points of the requested amount, that is
/// absorbed instead of aborting the call
pub const DEFAULT_MAX_SHORTFALL_BPS: u64 = 100; // 1%

/// Number of journal entries kept per strategy instance
pub const JOURNAL_CAPACITY: usize = 500;
