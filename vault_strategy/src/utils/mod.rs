//! Utility and helper functions needed for:
//! - Error handling
//! - Type casting between `alloy` and candid representations

pub(crate) mod common;
pub(crate) mod error;
