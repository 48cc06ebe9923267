//! Account-level operations: balances and fundraiser activation.

use crate::client::context::ContextHandle;
use crate::client::forger::Forger as _;
use crate::client::operation::PendingOperation;
use crate::error::Error;
use crate::types::{Address, Mutez, OperationContent};

/// Account utilities for `tz` addresses.
pub struct TzProvider {
    context: ContextHandle,
}

impl TzProvider {
    /// Create the provider over the given context.
    pub fn new(context: ContextHandle) -> Self {
        Self { context }
    }

    /// Spendable balance of an account.
    pub async fn balance(&self, address: &Address) -> Result<Mutez, Error> {
        let context = self.context.get()?;
        let balance = context.rpc().balance(address).await?;
        Ok(balance)
    }

    /// Activate a fundraiser account.
    ///
    /// Forges an `activate_account` operation against a recent branch and
    /// injects it. Activations are anonymous operations: the forged bytes
    /// are complete without a signature.
    pub async fn activate(&self, pkh: &Address, secret: &str) -> Result<PendingOperation, Error> {
        let context = self.context.get()?;
        let rpc = context.rpc();

        let branch = rpc.block_header("head~2").await?.hash;
        let contents = [OperationContent::ActivateAccount {
            pkh: pkh.clone(),
            secret: secret.to_string(),
        }];

        let forged = context.forger().forge(&branch, &contents).await?;
        let hash = rpc.inject_operation(&forged).await?;
        tracing::debug!(operation = %hash, pkh = %pkh, "activation injected");

        Ok(PendingOperation::new(hash, rpc, context.config()))
    }
}

impl std::fmt::Debug for TzProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TzProvider")
    }
}
