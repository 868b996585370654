//! Authorization policy
//!
//! Every gated operation is checked through [`authorize`], a pure function of
//! the role snapshot, the caller and the operation.

use alloy_primitives::Address;

use crate::utils::error::{StrategyError, StrategyResult};

/// Role holders relevant to a strategy at the time of a call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Roles {
    pub vault: Address,
    pub governance: Address,
    pub management: Address,
    pub strategist: Address,
    pub keeper: Address,
}

/// Operations that require a role
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Initialize,
    Clone,
    Harvest,
    Tend,
    SetEmergencyExit,
    EmergencyWithdrawal,
    Migrate,
    Withdraw,
    MigrateTokenVault,
    Sweep,
    SetStrategist,
    SetKeeper,
    SetRewards,
    SetReportParams,
    SetMaxShortfall,
}

/// Returns `Err(StrategyError::Unauthorized)` if `caller` may not perform `operation`
pub fn authorize(roles: &Roles, caller: Address, operation: Operation) -> StrategyResult<()> {
    let is_governance = caller == roles.governance;
    let is_management = caller == roles.management;
    let is_strategist = caller == roles.strategist;

    let allowed = match operation {
        Operation::Initialize => is_governance || is_management || is_strategist,
        Operation::Clone => is_governance || is_strategist,
        Operation::Harvest | Operation::Tend => {
            is_governance || is_management || is_strategist || caller == roles.keeper
        }
        Operation::SetEmergencyExit => is_governance || is_management,
        Operation::Migrate => is_governance || caller == roles.vault,
        Operation::Withdraw => caller == roles.vault,
        Operation::EmergencyWithdrawal
        | Operation::MigrateTokenVault
        | Operation::Sweep
        | Operation::SetStrategist
        | Operation::SetMaxShortfall => is_governance,
        Operation::SetKeeper | Operation::SetRewards | Operation::SetReportParams => {
            is_governance || is_strategist
        }
    };

    if !allowed {
        // only the listed role holders should be able to call this function
        return Err(StrategyError::Unauthorized);
    }
    Ok(())
}
