//! Clone factory

use crate::{
    auth::Operation, context::CallContext, journal::LogType, types::InitArgs, utils::error::*,
};

use super::controller::Strategy;

impl Strategy {
    /// Creates and initializes a new instance running this instance's logic.
    ///
    /// The clone's address is derived CREATE-style from this address and the
    /// clone nonce. Only configuration identifiers are shared; the clone starts
    /// with no assets, no debt and an empty journal. Clones cannot clone.
    /// Governance or the strategist only.
    pub fn clone_strategy(&mut self, ctx: &CallContext, args: InitArgs) -> StrategyResult<Strategy> {
        let result = self.spawn_clone(ctx, args);
        let note = match &result {
            Ok(clone) => format!("Cloned into {}.", clone.address()),
            Err(_) => "Clone rejected.".to_string(),
        };
        self.record(ctx.now, LogType::Clone, &result, note);
        result
    }

    fn spawn_clone(&mut self, ctx: &CallContext, args: InitArgs) -> StrategyResult<Strategy> {
        self.guard(ctx, Operation::Clone)?;
        if !self.is_original() {
            return Err(precondition_err("!clone"));
        }

        let address = self.address().create(self.data.clone_nonce);
        let mut clone = Strategy::with_implementation(address, self.implementation());
        clone.initialize(ctx, args)?;

        // the nonce is only consumed by a successful clone
        self.data.clone_nonce += 1;
        Ok(clone)
    }
}
