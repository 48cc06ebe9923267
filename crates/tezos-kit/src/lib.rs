//! A clean, ergonomic Rust client toolkit for Tezos.
//!
//! **tezos-kit** assembles a coherent operating context from pluggable
//! collaborators — RPC client, signer, forger, wallet backend, and
//! subscription backend — behind a single facade, with a focus on
//! developer experience and type safety.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tezos_kit::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let tezos = Tezos::mainnet();
//!
//!     let address: Address = "tz1...".parse()?;
//!     let balance = tezos.tz().balance(&address).await?;
//!     println!("Balance: {}", balance);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Design Principles
//!
//! 1. **Single entry point**: Everything hangs off the [`Tezos`] client
//! 2. **Reconfigure in place**: [`Tezos::configure`] swaps providers on the
//!    live context; every derived component observes the change
//! 3. **Sticky where it matters**: a pinned endpoint, signer, or
//!    subscription backend survives configure calls that do not mention it
//! 4. **Loud defaults**: with no signer configured, signing fails with a
//!    distinct error instead of producing garbage
//!
//! # Core Types
//!
//! - [`Address`] - Validated `tz1`/`KT1` address
//! - [`Mutez`] - Tez amount with mutez precision
//! - [`PublicKey`], [`SecretKey`], [`Signature`] - Ed25519 key material
//! - [`OperationHash`], [`BlockHash`] - Chain object references
//!
//! # String Parsing
//!
//! Many types support parsing from the standard base58check or
//! human-readable string forms:
//!
//! ```
//! use tezos_kit::{Mutez, SecretKey};
//!
//! let amount: Mutez = "5 tez".parse().unwrap();
//! let key: SecretKey = SecretKey::generate().to_string().parse().unwrap();
//! ```
//!
//! # Importing Keys
//!
//! ```rust,no_run
//! use tezos_kit::Tezos;
//!
//! # async fn example() -> Result<(), tezos_kit::Error> {
//! let tezos = Tezos::ghostnet();
//!
//! // Direct import: parse the key, install the signer.
//! tezos.import_secret_key("edsk...", None)?;
//!
//! // Fundraiser import: derive, activate on chain, confirm; rolls the
//! // signer back if activation fails.
//! tezos
//!     .import_fundraiser("user@example.com", "password", "wheel hub upon ...", "secret")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod contract;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{
    Error, ParseAddressError, ParseAmountError, ParseKeyError, RpcError, SignerError,
};
pub use types::*;

// Re-export contract types
pub use contract::{Contract, ContractApi, Estimate, Estimator};

// Re-export client types
pub use client::{
    BatchBuilder, BlockHeader, ChainConstants, ConfigureOptions, Context, ContextHandle,
    ContextWallet, Forger, HeadSubscription, InMemorySigner, NetworkConfig, NoopSigner,
    OperationConfig, OperationFactory, PendingOperation, PollingSubscriber, Protocol, RpcClient,
    RpcForger, Signer, SubscribeProvider, Tezos, TzProvider, WalletProvider, Watermark,
};
