//! Shared execution context and provider-slot bookkeeping.
//!
//! One [`Context`] exists per toolkit. It is mutated in place whenever the
//! toolkit is reconfigured, so every derived component (forger, wallet,
//! account and contract APIs) observes provider swaps live instead of
//! holding a stale snapshot. Provider fields are private; reads go through
//! accessors and writes through `pub(crate)` setters driven by the slot
//! registry, keeping every mutation point in one file.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;

use crate::client::forger::{Forger, RpcForger};
use crate::client::rpc::RpcClient;
use crate::client::signer::{NoopSigner, Signer};
use crate::client::wallet::{ContextWallet, WalletProvider};
use crate::error::Error;

// ============================================================================
// OperationConfig
// ============================================================================

/// Default interval between confirmation polls.
pub const DEFAULT_CONFIRMATION_POLLING_INTERVAL: Duration = Duration::from_secs(5);
/// Default overall confirmation-polling timeout.
pub const DEFAULT_CONFIRMATION_POLLING_TIMEOUT: Duration = Duration::from_secs(180);
/// Default number of confirmations to wait for.
pub const DEFAULT_CONFIRMATION_COUNT: u32 = 1;

/// Tunables for operation confirmation.
///
/// Every entry is optional. Unset entries fall back to the system defaults
/// at the point of use, and reconfiguring overlays supplied entries over
/// previous ones instead of replacing the whole set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationConfig {
    pub confirmation_polling_interval: Option<Duration>,
    pub confirmation_polling_timeout: Option<Duration>,
    pub confirmation_count: Option<u32>,
}

impl OperationConfig {
    /// The polling interval, or the system default.
    pub fn polling_interval(&self) -> Duration {
        self.confirmation_polling_interval
            .unwrap_or(DEFAULT_CONFIRMATION_POLLING_INTERVAL)
    }

    /// The polling timeout, or the system default.
    pub fn polling_timeout(&self) -> Duration {
        self.confirmation_polling_timeout
            .unwrap_or(DEFAULT_CONFIRMATION_POLLING_TIMEOUT)
    }

    /// The confirmation count, or the system default.
    pub fn confirmations(&self) -> u32 {
        self.confirmation_count.unwrap_or(DEFAULT_CONFIRMATION_COUNT)
    }

    /// Overlay `update` onto this config: entries set in `update` win,
    /// entries left unset keep their previous value.
    pub fn overlay(&mut self, update: &OperationConfig) {
        if update.confirmation_polling_interval.is_some() {
            self.confirmation_polling_interval = update.confirmation_polling_interval;
        }
        if update.confirmation_polling_timeout.is_some() {
            self.confirmation_polling_timeout = update.confirmation_polling_timeout;
        }
        if update.confirmation_count.is_some() {
            self.confirmation_count = update.confirmation_count;
        }
    }
}

// ============================================================================
// Protocol
// ============================================================================

/// A Tezos economic protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Protocol {
    Nairobi,
    Oxford,
    Paris,
    /// Any protocol hash not covered by a named variant.
    Custom(String),
}

impl Protocol {
    /// The protocol hash.
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Nairobi => "PtNairobiyssHuh87hEhfVBGCVrK3WnS8Z2FT4ymB5tAa4r1nQf",
            Protocol::Oxford => "ProxfordYmVfjWnRcgjWH36fW6PArwqykTFzotUxRs6gmTcZDuH",
            Protocol::Paris => "PtParisBxoLz5gzMmn3d9WBQNoPSZakgnkMC2VNuQ3KXfUtUQeZ",
            Protocol::Custom(hash) => hash,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Provider slots
// ============================================================================

/// Override-persistence policy of a provider slot.
///
/// Sticky slots keep a caller-supplied instance across reconfigurations
/// that do not mention them: once a user pins an endpoint or identity, a
/// later no-op configure call must not silently reset it. Always-rebuild
/// slots are cheap to reconstruct and want the latest context wiring, so
/// they are re-resolved on every call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SlotPolicy {
    Sticky,
    AlwaysRebuild,
}

/// Bookkeeping for one pluggable capability.
#[derive(Debug)]
pub(crate) struct ProviderSlot {
    policy: SlotPolicy,
    overridden: bool,
}

impl ProviderSlot {
    fn new(policy: SlotPolicy) -> Self {
        Self {
            policy,
            overridden: false,
        }
    }

    /// Record that the caller supplied an instance for this slot outside
    /// of a full resolution (toolkit construction, key import).
    pub fn record_override(&mut self) {
        self.overridden = true;
    }

    /// Resolve this slot for one configure call.
    ///
    /// Returns the instance to install, or `None` when the current
    /// instance must be left untouched (sticky slot, previously
    /// overridden, nothing new supplied).
    pub fn resolve<T>(
        &mut self,
        override_value: Option<T>,
        default_factory: impl FnOnce() -> Result<T, Error>,
    ) -> Result<Option<T>, Error> {
        match override_value {
            Some(value) => {
                self.overridden = true;
                Ok(Some(value))
            }
            None => match self.policy {
                SlotPolicy::AlwaysRebuild => default_factory().map(Some),
                SlotPolicy::Sticky if !self.overridden => default_factory().map(Some),
                SlotPolicy::Sticky => Ok(None),
            },
        }
    }
}

/// One slot per pluggable capability.
#[derive(Debug)]
pub(crate) struct ProviderRegistry {
    pub rpc: ProviderSlot,
    pub stream: ProviderSlot,
    pub signer: ProviderSlot,
    pub forger: ProviderSlot,
    pub wallet: ProviderSlot,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            rpc: ProviderSlot::new(SlotPolicy::Sticky),
            stream: ProviderSlot::new(SlotPolicy::Sticky),
            signer: ProviderSlot::new(SlotPolicy::Sticky),
            forger: ProviderSlot::new(SlotPolicy::AlwaysRebuild),
            wallet: ProviderSlot::new(SlotPolicy::AlwaysRebuild),
        }
    }
}

// ============================================================================
// Context
// ============================================================================

/// The shared, in-place-mutated aggregate of active providers and
/// configuration.
///
/// Held behind an `Arc` by the toolkit; handed to derived components as a
/// [`ContextHandle`].
pub struct Context {
    rpc: RwLock<Arc<RpcClient>>,
    signer: RwLock<Arc<dyn Signer>>,
    forger: RwLock<Arc<dyn Forger>>,
    wallet: RwLock<Arc<dyn WalletProvider>>,
    protocol: RwLock<Option<Protocol>>,
    config: RwLock<OperationConfig>,
}

impl Context {
    /// Build a context with the full set of default providers: the given
    /// client, a no-op signer, and context-backed forger and wallet.
    ///
    /// Every field holds a valid instance before the `Arc` is ever
    /// visible; no slot is left unset.
    pub(crate) fn bootstrap(rpc: Arc<RpcClient>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Context>| {
            let handle = ContextHandle { inner: weak.clone() };
            Context {
                rpc: RwLock::new(rpc),
                signer: RwLock::new(Arc::new(NoopSigner)),
                forger: RwLock::new(Arc::new(RpcForger::new(handle.clone()))),
                wallet: RwLock::new(Arc::new(ContextWallet::new(handle))),
                protocol: RwLock::new(None),
                config: RwLock::new(OperationConfig::default()),
            }
        })
    }

    /// A weak handle for constructing derived components.
    pub fn handle(self: &Arc<Self>) -> ContextHandle {
        ContextHandle {
            inner: Arc::downgrade(self),
        }
    }

    /// The active RPC client.
    pub fn rpc(&self) -> Arc<RpcClient> {
        self.rpc.read().clone()
    }

    /// The active signer.
    pub fn signer(&self) -> Arc<dyn Signer> {
        self.signer.read().clone()
    }

    /// The active forger.
    pub fn forger(&self) -> Arc<dyn Forger> {
        self.forger.read().clone()
    }

    /// The active wallet backend.
    pub fn wallet(&self) -> Arc<dyn WalletProvider> {
        self.wallet.read().clone()
    }

    /// The active protocol, if one was configured.
    pub fn protocol(&self) -> Option<Protocol> {
        self.protocol.read().clone()
    }

    /// A snapshot of the operation config.
    pub fn config(&self) -> OperationConfig {
        self.config.read().clone()
    }

    pub(crate) fn set_rpc(&self, rpc: Arc<RpcClient>) {
        *self.rpc.write() = rpc;
    }

    pub(crate) fn set_signer(&self, signer: Arc<dyn Signer>) {
        *self.signer.write() = signer;
    }

    pub(crate) fn set_forger(&self, forger: Arc<dyn Forger>) {
        *self.forger.write() = forger;
    }

    pub(crate) fn set_wallet(&self, wallet: Arc<dyn WalletProvider>) {
        *self.wallet.write() = wallet;
    }

    pub(crate) fn set_protocol(&self, protocol: Protocol) {
        *self.protocol.write() = Some(protocol);
    }

    pub(crate) fn overlay_config(&self, update: &OperationConfig) {
        self.config.write().overlay(update);
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("rpc", &self.rpc.read().url())
            .field("protocol", &*self.protocol.read())
            .field("config", &*self.config.read())
            .finish()
    }
}

/// A cheap, cloneable reference to a toolkit's [`Context`].
///
/// Components owned by the context itself (the default forger and wallet)
/// hold one of these, so the ownership graph stays acyclic. Using a handle
/// after the owning toolkit was dropped is an error, not a panic.
#[derive(Clone)]
pub struct ContextHandle {
    inner: Weak<Context>,
}

impl ContextHandle {
    /// Upgrade to the live context.
    pub fn get(&self) -> Result<Arc<Context>, Error> {
        self.inner.upgrade().ok_or(Error::ToolkitDropped)
    }
}

impl std::fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ContextHandle")
    }
}

// ============================================================================
// Tests
// ============================================================================
