//! Common conversion helpers used at the candid boundary

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use candid::Nat;
use num_bigint::BigUint;

use super::error::{StrategyError, StrategyResult};

/// Converts String to Address and returns StrategyError on failure
pub fn string_to_address(input: &str) -> StrategyResult<Address> {
    Address::from_str(input).map_err(|err| StrategyError::DecodingError(format!("{:#?}", err)))
}

/// Converts values of type `Nat` to `U256`
pub fn nat_to_u256(n: &Nat) -> StrategyResult<U256> {
    let be_bytes = n.0.to_bytes_be();
    if be_bytes.len() > 32 {
        return Err(StrategyError::DecodingError("The `Nat` input length exceedes 32 bytes when converted to big-endian bytes representation.".to_string()));
    }
    // Ensure the byte array is exactly 32 bytes long
    let mut padded_bytes = [0u8; 32];
    let start_pos = 32 - be_bytes.len();
    padded_bytes[start_pos..].copy_from_slice(&be_bytes);

    Ok(U256::from_be_bytes(padded_bytes))
}

/// Converts values of type `U256` to `Nat`
pub fn u256_to_nat(value: &U256) -> Nat {
    Nat(BigUint::from_bytes_be(&value.to_be_bytes::<32>()))
}
