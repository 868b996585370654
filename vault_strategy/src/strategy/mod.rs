//! Strategy instance
//!
//! A [`Strategy`] is one deployment of the vault strategy. Its operations are
//! split by concern: the harvest cycle and capital movements live in
//! `controller`, role and parameter management in `admin`, cloning in
//! `factory` and the keeper advice in `triggers`.

mod admin;
mod controller;
mod data;
mod factory;
mod settings;
mod triggers;

pub use controller::Strategy;
pub use data::{Lifecycle, StrategyData};
pub use settings::{StrategySettings, StrategySettingsQuery};
