//! Chain-head subscriptions.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::context::{ContextHandle, DEFAULT_CONFIRMATION_POLLING_INTERVAL};
use crate::client::rpc::{BlockHeader, RpcClient};
use crate::error::Error;
use crate::types::BlockHash;

/// Trait for event-subscription backends.
#[async_trait]
pub trait SubscribeProvider: Send + Sync {
    /// Open a subscription to new chain heads.
    async fn subscribe_heads(&self) -> Result<Box<dyn HeadSubscription>, Error>;
}

/// An open head subscription. Pull-style: each call suspends until a new
/// head is available.
#[async_trait]
pub trait HeadSubscription: Send {
    /// The next head not yet yielded by this subscription.
    async fn next_head(&mut self) -> Result<BlockHeader, Error>;
}

enum HeadSource {
    /// Reads the toolkit's live client through the context on every poll.
    Context(ContextHandle),
    /// An independent client, detached from the toolkit's configuration.
    Client(Arc<RpcClient>),
}

impl HeadSource {
    fn rpc(&self) -> Result<Arc<RpcClient>, Error> {
        match self {
            HeadSource::Context(handle) => Ok(handle.get()?.rpc()),
            HeadSource::Client(rpc) => Ok(rpc.clone()),
        }
    }
}

/// Subscription backend that polls a node for new heads.
pub struct PollingSubscriber {
    source: HeadSource,
}

impl PollingSubscriber {
    /// Poll through the toolkit's live client.
    pub fn new(context: ContextHandle) -> Self {
        Self {
            source: HeadSource::Context(context),
        }
    }

    /// Poll an independent endpoint, unaffected by the owning toolkit's
    /// client configuration.
    pub fn for_endpoint(endpoint: impl AsRef<str>) -> Result<Self, Error> {
        Ok(Self {
            source: HeadSource::Client(Arc::new(RpcClient::new(endpoint)?)),
        })
    }

    fn interval(&self) -> std::time::Duration {
        match &self.source {
            HeadSource::Context(handle) => handle
                .get()
                .map(|ctx| ctx.config().polling_interval())
                .unwrap_or(DEFAULT_CONFIRMATION_POLLING_INTERVAL),
            HeadSource::Client(_) => DEFAULT_CONFIRMATION_POLLING_INTERVAL,
        }
    }
}

#[async_trait]
impl SubscribeProvider for PollingSubscriber {
    async fn subscribe_heads(&self) -> Result<Box<dyn HeadSubscription>, Error> {
        let source = match &self.source {
            HeadSource::Context(handle) => HeadSource::Context(handle.clone()),
            HeadSource::Client(rpc) => HeadSource::Client(rpc.clone()),
        };
        Ok(Box::new(PollingHeadSubscription {
            source,
            interval: self.interval(),
            last: None,
        }))
    }
}

impl std::fmt::Debug for PollingSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PollingSubscriber")
    }
}

struct PollingHeadSubscription {
    source: HeadSource,
    interval: std::time::Duration,
    last: Option<BlockHash>,
}

#[async_trait]
impl HeadSubscription for PollingHeadSubscription {
    async fn next_head(&mut self) -> Result<BlockHeader, Error> {
        loop {
            let header = self.source.rpc()?.head_header().await?;
            if self.last.as_ref() != Some(&header.hash) {
                tracing::trace!(hash = %header.hash, level = header.level, "new head");
                self.last = Some(header.hash.clone());
                return Ok(header);
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
