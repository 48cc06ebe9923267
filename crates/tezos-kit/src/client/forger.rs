//! Forger trait and the node-backed implementation.

use async_trait::async_trait;

use crate::client::context::ContextHandle;
use crate::error::Error;
use crate::types::{BlockHash, OperationContent};

/// Trait for turning an operation group into the raw bytes to sign and
/// inject.
#[async_trait]
pub trait Forger: Send + Sync {
    /// Forge `contents` against `branch`.
    async fn forge(
        &self,
        branch: &BlockHash,
        contents: &[OperationContent],
    ) -> Result<Vec<u8>, Error>;
}

/// Forger that delegates to the node of the toolkit's live RPC client.
///
/// Reads the client through the context on every call, so endpoint swaps
/// are picked up without reconstruction.
pub struct RpcForger {
    context: ContextHandle,
}

impl RpcForger {
    /// Create a forger over the given context.
    pub fn new(context: ContextHandle) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Forger for RpcForger {
    async fn forge(
        &self,
        branch: &BlockHash,
        contents: &[OperationContent],
    ) -> Result<Vec<u8>, Error> {
        let context = self.context.get()?;
        let bytes = context.rpc().forge_operations(branch, contents).await?;
        tracing::trace!(branch = %branch, bytes = bytes.len(), "forged operation group");
        Ok(bytes)
    }
}

impl std::fmt::Debug for RpcForger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RpcForger")
    }
}
