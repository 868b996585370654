use alloy_primitives::Address;

use crate::{adapter::Venue, token::TokenLedger, vault::VaultApi};

/// Everything a strategy call needs besides the strategy itself.
///
/// The collaborators are borrowed for the duration of one call only, so a
/// strategy never holds on to its vault or venue between calls.
pub struct CallContext<'a> {
    /// Sender of the call
    pub caller: Address,
    /// Block timestamp, in seconds
    pub now: u64,
    pub vault: &'a mut dyn VaultApi,
    pub venue: &'a mut dyn Venue,
    pub tokens: &'a mut dyn TokenLedger,
}

impl<'a> CallContext<'a> {
    pub fn new(
        caller: Address,
        now: u64,
        vault: &'a mut dyn VaultApi,
        venue: &'a mut dyn Venue,
        tokens: &'a mut dyn TokenLedger,
    ) -> Self {
        Self {
            caller,
            now,
            vault,
            venue,
            tokens,
        }
    }
}
