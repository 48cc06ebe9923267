//! Pending operations and confirmation waiting.

use std::sync::Arc;

use tokio::time::Instant;

use crate::client::context::OperationConfig;
use crate::client::rpc::RpcClient;
use crate::error::Error;
use crate::types::OperationHash;

/// An injected operation that has not been confirmed yet.
///
/// Holds its own client reference and a config snapshot taken at creation,
/// so an in-flight confirmation wait is unaffected by later toolkit
/// reconfiguration. Cancellation is the caller's: drop the future to stop
/// waiting.
pub struct PendingOperation {
    hash: OperationHash,
    rpc: Arc<RpcClient>,
    config: OperationConfig,
}

impl PendingOperation {
    pub(crate) fn new(hash: OperationHash, rpc: Arc<RpcClient>, config: OperationConfig) -> Self {
        Self { hash, rpc, config }
    }

    /// The operation hash.
    pub fn hash(&self) -> &OperationHash {
        &self.hash
    }

    /// Wait until the operation is included and has the configured number
    /// of confirmations, returning the inclusion level.
    ///
    /// Polls the chain head at the configured interval, scanning each new
    /// block for the operation hash. Fails with
    /// [`Error::ConfirmationTimeout`] when the configured timeout elapses
    /// first.
    pub async fn confirmation(&self) -> Result<u64, Error> {
        let interval = self.config.polling_interval();
        let timeout = self.config.polling_timeout();
        let confirmations = u64::from(self.config.confirmations());
        let deadline = Instant::now() + timeout;

        let needle = self.hash.to_string();
        let mut next_level_to_scan: Option<u64> = None;
        let mut included_at: Option<u64> = None;

        loop {
            let head = self.rpc.head_header().await?;

            if included_at.is_none() {
                // Scan every block we have not looked at yet, including the
                // current head on the first pass.
                let from = next_level_to_scan.unwrap_or(head.level);
                for level in from..=head.level {
                    let passes = self.rpc.block_operation_hashes(&level.to_string()).await?;
                    if passes.iter().flatten().any(|h| h == &needle) {
                        tracing::debug!(operation = %self.hash, level, "operation included");
                        included_at = Some(level);
                        break;
                    }
                }
                next_level_to_scan = Some(head.level + 1);
            }

            if let Some(level) = included_at {
                if head.level + 1 >= level + confirmations {
                    tracing::debug!(operation = %self.hash, level, "operation confirmed");
                    return Ok(level);
                }
            }

            if Instant::now() + interval > deadline {
                return Err(Error::ConfirmationTimeout {
                    operation: self.hash.clone(),
                    timeout,
                });
            }
            tokio::time::sleep(interval).await;
        }
    }
}

impl std::fmt::Debug for PendingOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingOperation")
            .field("hash", &self.hash)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::context::{
        DEFAULT_CONFIRMATION_COUNT, DEFAULT_CONFIRMATION_POLLING_TIMEOUT,
    };

    #[test]
    fn test_pending_operation_snapshot() {
        let rpc = Arc::new(RpcClient::new("http://localhost:8732").unwrap());
        let config = OperationConfig {
            confirmation_polling_timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        let op = PendingOperation::new(OperationHash::from([1u8; 32]), rpc, config);

        assert_eq!(op.hash(), &OperationHash::from([1u8; 32]));
        assert_eq!(
            op.config.polling_timeout(),
            Duration::from_secs(30)
        );
        assert_ne!(
            op.config.polling_timeout(),
            DEFAULT_CONFIRMATION_POLLING_TIMEOUT
        );
        assert_eq!(op.config.confirmations(), DEFAULT_CONFIRMATION_COUNT);
    }
}
