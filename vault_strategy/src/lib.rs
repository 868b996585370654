pub mod accounting;
pub mod adapter;
pub mod auth;
pub mod constants;
pub mod context;
pub mod journal;
pub mod strategy;
pub mod token;
pub mod types;
pub mod vault;
mod utils;

pub use context::CallContext;
pub use strategy::{Lifecycle, Strategy, StrategySettingsQuery};
pub use utils::{
    common::{nat_to_u256, string_to_address, u256_to_nat},
    error::{StrategyError, StrategyResult},
};
