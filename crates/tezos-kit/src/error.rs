//! Error types for tezos-kit.
//!
//! # Error Hierarchy
//!
//! - [`Error`](enum@Error) — Main error type, returned by most operations
//!   - [`RpcError`] — Node RPC errors (transport, HTTP status, bad responses)
//!   - [`SignerError`] — Signing and key-derivation failures
//!   - [`ParseKeyError`] — Invalid key material
//!   - [`ParseAddressError`] — Invalid address or hash format
//!   - [`ParseAmountError`] — Invalid tez amount format
//!
//! # Error Handling Examples
//!
//! ```rust,no_run
//! use tezos_kit::*;
//!
//! # async fn example() -> Result<(), Error> {
//! let tezos = Tezos::mainnet();
//!
//! match tezos.signer().public_key_hash().await {
//!     Ok(pkh) => println!("Signing as {}", pkh),
//!     Err(SignerError::NoSignerConfigured) => {
//!         println!("Read-only toolkit, no signer installed");
//!     }
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::types::OperationHash;

/// Error parsing key material (secret keys, public keys, signatures).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseKeyError {
    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),

    #[error("Invalid base58check checksum")]
    BadChecksum,

    #[error("Unknown key prefix: expected one of 'edsk', 'edpk', 'edsig'")]
    UnknownPrefix,

    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid curve point: key bytes do not represent a valid point on the curve")]
    InvalidCurvePoint,

    #[error("Encrypted key material (edesk) is not supported; decrypt the key first")]
    EncryptedKeyUnsupported,
}

/// Error parsing an address, operation hash, or block hash.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseAddressError {
    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),

    #[error("Invalid base58check checksum")]
    BadChecksum,

    #[error("Unknown address prefix in '{0}'")]
    UnknownPrefix(String),

    #[error("Invalid payload length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Error parsing a tez amount.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseAmountError {
    #[error("Ambiguous amount '{0}'. Use explicit units like '5 tez' or '1000 mutez'")]
    AmbiguousAmount(String),

    #[error("Invalid amount format: '{0}'")]
    InvalidFormat(String),

    #[error("Invalid number in amount: '{0}'")]
    InvalidNumber(String),

    #[error("Amount overflow: value too large")]
    Overflow,
}

/// Error during signing operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerError {
    /// Produced by the no-op signer installed when no signing capability
    /// was ever configured. Every operation of that signer fails with this
    /// variant so a missing configuration is loud rather than silent.
    #[error("No signer configured. Install one with configure() or an import operation.")]
    NoSignerConfigured,

    #[error("Invalid mnemonic phrase")]
    InvalidMnemonic,

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

// ============================================================================
// RPC Errors
// ============================================================================

/// Node RPC errors.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the node. The body is kept verbatim: Tezos
    /// nodes report protocol-level failures as JSON error lists in the
    /// body, and callers match on it (see [`Error::is_already_activated`]).
    #[error("Node returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RpcError {
    /// The raw response body, for errors that carry one.
    pub fn body(&self) -> Option<&str> {
        match self {
            RpcError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// Main error type for tezos-kit operations.
#[derive(Debug, Error)]
pub enum Error {
    // ─── Configuration ───
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A derived provider outlived the toolkit that owned its context.
    #[error("Toolkit was dropped while a derived provider was still in use")]
    ToolkitDropped,

    // ─── Parsing ───
    #[error(transparent)]
    ParseKey(#[from] ParseKeyError),

    #[error(transparent)]
    ParseAddress(#[from] ParseAddressError),

    #[error(transparent)]
    ParseAmount(#[from] ParseAmountError),

    // ─── RPC ───
    #[error(transparent)]
    Rpc(#[from] RpcError),

    // ─── Signing ───
    #[error("Signing failed: {0}")]
    Signer(#[from] SignerError),

    // ─── Operations ───
    #[error("Confirmation polling timed out after {timeout:?} for operation {operation}")]
    ConfirmationTimeout {
        operation: OperationHash,
        timeout: Duration,
    },
}

impl Error {
    /// True when an activation request failed only because the account is
    /// already activated. The node rejects a second activation with its
    /// `invalid_activation` error class; both the error-id spelling and the
    /// human-readable message form are matched.
    pub fn is_already_activated(&self) -> bool {
        match self {
            Error::Rpc(RpcError::Status { body, .. }) => {
                body.contains("invalid_activation") || body.contains("Invalid activation")
            }
            _ => false,
        }
    }
}
