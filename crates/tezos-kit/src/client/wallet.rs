//! Wallet backend, operation factory, and batch building.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::context::{Context, ContextHandle};
use crate::client::forger::Forger as _;
use crate::client::operation::PendingOperation;
use crate::client::signer::{Signer as _, Watermark};
use crate::error::Error;
use crate::types::{Address, Mutez, OperationContent, OperationHash};

/// Default fee for a transfer, in mutez.
pub const DEFAULT_TRANSFER_FEE: Mutez = Mutez::from_mutez(10_000);
/// Default fee for a reveal, in mutez.
pub const DEFAULT_REVEAL_FEE: Mutez = Mutez::from_mutez(1_420);
/// Default gas limit for manager operations.
pub const DEFAULT_GAS_LIMIT: u64 = 10_600;
/// Default storage limit for transfers.
pub const DEFAULT_STORAGE_LIMIT: u64 = 257;

/// Trait for wallet backends: components that turn intents into injected
/// operations on behalf of the active account.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// The address the wallet operates as.
    async fn public_key_hash(&self) -> Result<Address, Error>;

    /// Transfer funds to `destination`.
    async fn transfer(&self, destination: &Address, amount: Mutez)
    -> Result<PendingOperation, Error>;
}

/// The default wallet backend: drives the context's own signer, forger,
/// and client.
pub struct ContextWallet {
    context: ContextHandle,
}

impl ContextWallet {
    /// Create a wallet over the given context.
    pub fn new(context: ContextHandle) -> Self {
        Self { context }
    }
}

#[async_trait]
impl WalletProvider for ContextWallet {
    async fn public_key_hash(&self) -> Result<Address, Error> {
        let context = self.context.get()?;
        let pkh = context.signer().public_key_hash().await?;
        Ok(pkh)
    }

    async fn transfer(
        &self,
        destination: &Address,
        amount: Mutez,
    ) -> Result<PendingOperation, Error> {
        let context = self.context.get()?;
        send_transfers(&context, &[(destination.clone(), amount)]).await
    }
}

impl std::fmt::Debug for ContextWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ContextWallet")
    }
}

/// Build, sign, and inject one operation group containing the given
/// transfers.
///
/// If the source account has not revealed its public key yet, a reveal is
/// prepended to the group. Counters are assigned sequentially from the
/// account's current counter.
pub(crate) async fn send_transfers(
    context: &Arc<Context>,
    transfers: &[(Address, Mutez)],
) -> Result<PendingOperation, Error> {
    let rpc = context.rpc();
    let signer = context.signer();

    let source = signer.public_key_hash().await?;
    let branch = rpc.block_header("head~2").await?.hash;
    let mut counter = rpc.counter(&source).await?;

    let mut contents = Vec::with_capacity(transfers.len() + 1);
    if rpc.manager_key(&source).await?.is_none() {
        counter += 1;
        contents.push(OperationContent::Reveal {
            source: source.clone(),
            fee: DEFAULT_REVEAL_FEE,
            counter,
            gas_limit: DEFAULT_GAS_LIMIT,
            storage_limit: 0,
            public_key: signer.public_key().await?,
        });
    }
    for (destination, amount) in transfers {
        counter += 1;
        contents.push(OperationContent::Transaction {
            source: source.clone(),
            fee: DEFAULT_TRANSFER_FEE,
            counter,
            gas_limit: DEFAULT_GAS_LIMIT,
            storage_limit: DEFAULT_STORAGE_LIMIT,
            amount: *amount,
            destination: destination.clone(),
        });
    }

    let forged = context.forger().forge(&branch, &contents).await?;
    let signature = signer.sign(&forged, Watermark::Operation).await?;

    let mut signed = forged;
    signed.extend_from_slice(signature.as_bytes());
    let hash = rpc.inject_operation(&signed).await?;
    tracing::debug!(operation = %hash, source = %source, count = transfers.len(), "injected transfer group");

    Ok(PendingOperation::new(hash, rpc, context.config()))
}

// ============================================================================
// OperationFactory
// ============================================================================

/// Rehydrates pending operations from known hashes, e.g. hashes persisted
/// by an application across restarts.
pub struct OperationFactory {
    context: ContextHandle,
}

impl OperationFactory {
    /// Create a factory over the given context.
    pub fn new(context: ContextHandle) -> Self {
        Self { context }
    }

    /// A [`PendingOperation`] for `hash`, bound to the live client and the
    /// current config snapshot.
    pub fn from_hash(&self, hash: OperationHash) -> Result<PendingOperation, Error> {
        let context = self.context.get()?;
        Ok(PendingOperation::new(hash, context.rpc(), context.config()))
    }
}

// ============================================================================
// BatchBuilder
// ============================================================================

/// Accumulates transfers and sends them as a single operation group.
///
/// Built through the live context on every [`Tezos::batch`] call, so it
/// always observes the current providers.
///
/// [`Tezos::batch`]: crate::Tezos::batch
///
/// # Example
///
/// ```rust,no_run
/// # async fn example(tezos: tezos_kit::Tezos) -> Result<(), tezos_kit::Error> {
/// let op = tezos
///     .batch()
///     .transfer("tz1…".parse()?, "1 tez".parse()?)
///     .transfer("tz1…".parse()?, "2 tez".parse()?)
///     .send()
///     .await?;
/// op.confirmation().await?;
/// # Ok(())
/// # }
/// ```
pub struct BatchBuilder {
    context: ContextHandle,
    transfers: Vec<(Address, Mutez)>,
}

impl BatchBuilder {
    /// Create an empty batch over the given context.
    pub fn new(context: ContextHandle) -> Self {
        Self {
            context,
            transfers: Vec::new(),
        }
    }

    /// Add a transfer to the batch.
    pub fn transfer(mut self, destination: Address, amount: Mutez) -> Self {
        self.transfers.push((destination, amount));
        self
    }

    /// Number of queued transfers.
    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    /// True when no transfers are queued.
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Sign and inject the batch as one operation group.
    pub async fn send(self) -> Result<PendingOperation, Error> {
        if self.transfers.is_empty() {
            return Err(Error::Config("cannot send an empty batch".to_string()));
        }
        let context = self.context.get()?;
        send_transfers(&context, &self.transfers).await
    }
}
