use alloy_primitives::Address;
use alloy_sol_types::{sol, SolCall};
use candid::CandidType;
use serde::Deserialize;

use crate::{
    accounting::HarvestReport,
    adapter::ExternalDeposit,
    utils::{
        common::string_to_address,
        error::{StrategyError, StrategyResult},
    },
};

/// Arguments shared by `initialize` and `clone_strategy`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InitArgs {
    pub vault: Address,
    pub strategist: Address,
    pub rewards: Address,
    pub keeper: Address,
    pub external_deposit: ExternalDeposit,
}

/// Candid representation of [`InitArgs`]
#[derive(CandidType, Clone, Debug, Deserialize)]
pub struct StrategyInput {
    pub vault: String,
    pub strategist: String,
    pub rewards: String,
    pub keeper: String,
    pub token_vault: String,
    pub token_vault_registry: String,
    pub liquidity_mining: Option<String>,
    pub reward_token: String,
}

impl TryFrom<StrategyInput> for InitArgs {
    type Error = StrategyError;

    fn try_from(value: StrategyInput) -> Result<Self, Self::Error> {
        let liquidity_mining = value
            .liquidity_mining
            .as_deref()
            .map(string_to_address)
            .transpose()?;

        Ok(Self {
            vault: string_to_address(&value.vault)?,
            strategist: string_to_address(&value.strategist)?,
            rewards: string_to_address(&value.rewards)?,
            keeper: string_to_address(&value.keeper)?,
            external_deposit: ExternalDeposit {
                token_vault: string_to_address(&value.token_vault)?,
                registry: string_to_address(&value.token_vault_registry)?,
                liquidity_mining,
                reward_token: string_to_address(&value.reward_token)?,
            },
        })
    }
}

/// ABI-encoded call the strategy issues to a contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundCall {
    pub to: Address,
    pub data: Vec<u8>,
}

impl OutboundCall {
    pub fn report(vault: Address, report: &HarvestReport) -> Self {
        let payload = reportCall {
            _gain: report.profit,
            _loss: report.loss,
            _debtPayment: report.debt_payment,
        };
        Self {
            to: vault,
            data: payload.abi_encode(),
        }
    }

    pub fn revoke_strategy(vault: Address) -> Self {
        Self {
            to: vault,
            data: revokeStrategyCall {}.abi_encode(),
        }
    }

    /// `0x`-prefixed calldata
    pub fn data_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.data))
    }
}

/// Decodes report calldata previously produced by [`OutboundCall::report`]
pub fn decode_report_call(hex_data: &str) -> StrategyResult<HarvestReport> {
    let stripped_hex = hex_data.strip_prefix("0x").unwrap_or(hex_data);
    let bytes =
        hex::decode(stripped_hex).map_err(|err| StrategyError::DecodingError(err.to_string()))?;
    let call = reportCall::abi_decode(&bytes, true)
        .map_err(|err| StrategyError::DecodingError(err.to_string()))?;
    Ok(HarvestReport {
        profit: call._gain,
        loss: call._loss,
        debt_payment: call._debtPayment,
    })
}

sol!(
    // Vault calls issued by a strategy
    function report(uint256 _gain, uint256 _loss, uint256 _debtPayment) external returns (uint256);
    function revokeStrategy() external;
);
