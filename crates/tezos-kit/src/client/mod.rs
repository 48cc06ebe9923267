//! Client module: the toolkit facade and its pluggable capabilities.
//!
//! - [`Tezos`] — The main client, the single entry point for all operations
//! - [`ConfigureOptions`] — Partial overrides for in-place reconfiguration
//! - [`Context`] / [`ContextHandle`] — Shared state observed live by every
//!   derived component
//! - [`RpcClient`] — REST client for the node RPC
//!
//! # Capabilities
//!
//! Each pluggable capability is a trait with a default implementation
//! wired to the toolkit's context:
//!
//! | Capability | Trait | Default |
//! |-----------|-------|---------|
//! | Signing | [`Signer`] | [`NoopSigner`] (declines loudly) |
//! | Forging | [`Forger`] | [`RpcForger`] |
//! | Wallet | [`WalletProvider`] | [`ContextWallet`] |
//! | Subscriptions | [`SubscribeProvider`] | [`PollingSubscriber`] |

mod context;
mod forger;
mod operation;
mod rpc;
mod signer;
mod subscribe;
mod toolkit;
mod tz;
mod wallet;

pub use context::{
    Context, ContextHandle, DEFAULT_CONFIRMATION_COUNT, DEFAULT_CONFIRMATION_POLLING_INTERVAL,
    DEFAULT_CONFIRMATION_POLLING_TIMEOUT, OperationConfig, Protocol,
};
pub use forger::{Forger, RpcForger};
pub use operation::PendingOperation;
pub use rpc::{BlockHeader, ChainConstants, GHOSTNET, MAINNET, NetworkConfig, RpcClient};
pub use signer::{InMemorySigner, NoopSigner, Signer, Watermark};
pub use subscribe::{HeadSubscription, PollingSubscriber, SubscribeProvider};
pub use toolkit::{ConfigureOptions, Tezos};
pub use tz::TzProvider;
pub use wallet::{
    BatchBuilder, ContextWallet, DEFAULT_GAS_LIMIT, DEFAULT_REVEAL_FEE, DEFAULT_STORAGE_LIMIT,
    DEFAULT_TRANSFER_FEE, OperationFactory, WalletProvider,
};
