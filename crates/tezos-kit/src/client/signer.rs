//! Signer trait and implementations.
//!
//! A `Signer` produces the public key, the public-key hash, and watermarked
//! signatures for the account it controls.
//!
//! # Implementations
//!
//! - [`InMemorySigner`] - Single Ed25519 key held in memory
//! - [`NoopSigner`] - Installed when no signing capability was configured;
//!   deterministically fails instead of silently producing signatures
//!
//! # Example
//!
//! ```rust,no_run
//! use tezos_kit::{ConfigureOptions, InMemorySigner, Tezos};
//!
//! # fn example() -> Result<(), tezos_kit::Error> {
//! let signer = InMemorySigner::new("edsk...", None)?;
//!
//! let tezos = Tezos::mainnet();
//! tezos.configure(ConfigureOptions::new().signer(signer))?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::{Error, SignerError};
use crate::types::key::blake2b;
use crate::types::{Address, PublicKey, SecretKey, Signature};

/// Domain-separation byte prepended to payloads before hashing and signing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Watermark {
    Block = 0x01,
    Endorsement = 0x02,
    /// Manager operations (transfers, reveals, ...).
    Operation = 0x03,
}

/// Trait for signing operations.
///
/// Implementations may be backed by an in-memory key, a remote signer
/// daemon, or a hardware wallet; all methods are async to accommodate
/// backends that perform I/O.
#[async_trait]
pub trait Signer: Send + Sync {
    /// The public key of the controlled account.
    async fn public_key(&self) -> Result<PublicKey, SignerError>;

    /// The `tz1` hash of the public key.
    async fn public_key_hash(&self) -> Result<Address, SignerError>;

    /// Sign forged operation bytes under the given watermark.
    ///
    /// The payload is watermarked and BLAKE2b-hashed before signing, per
    /// the protocol's signing convention.
    async fn sign(&self, bytes: &[u8], watermark: Watermark) -> Result<Signature, SignerError>;
}

// ============================================================================
// NoopSigner
// ============================================================================

/// The signer installed when none was ever configured.
///
/// Every operation fails with [`SignerError::NoSignerConfigured`] so a
/// missing configuration surfaces as a distinct, recognizable error rather
/// than an invalid signature.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSigner;

#[async_trait]
impl Signer for NoopSigner {
    async fn public_key(&self) -> Result<PublicKey, SignerError> {
        Err(SignerError::NoSignerConfigured)
    }

    async fn public_key_hash(&self) -> Result<Address, SignerError> {
        Err(SignerError::NoSignerConfigured)
    }

    async fn sign(&self, _bytes: &[u8], _watermark: Watermark) -> Result<Signature, SignerError> {
        Err(SignerError::NoSignerConfigured)
    }
}

// ============================================================================
// InMemorySigner
// ============================================================================

/// A signer with a single Ed25519 key held in memory.
///
/// Suitable for scripts, bots, and testing.
///
/// # Example
///
/// ```rust
/// use tezos_kit::{InMemorySigner, SecretKey};
///
/// let signer = InMemorySigner::from_secret_key(SecretKey::generate());
/// println!("Signing as {}", signer.public_key_hash());
/// ```
#[derive(Clone)]
pub struct InMemorySigner {
    secret_key: SecretKey,
    public_key: PublicKey,
    public_key_hash: Address,
}

impl InMemorySigner {
    /// Create a signer from base58check key material (`edsk…`).
    ///
    /// Both the 32-byte seed and the 64-byte keypair form are accepted.
    /// Encrypted keys (`edesk…`) are rejected; a passphrase is only
    /// meaningful for those and is otherwise ignored.
    pub fn new(secret_key: impl AsRef<str>, _passphrase: Option<&str>) -> Result<Self, Error> {
        let secret_key: SecretKey = secret_key.as_ref().parse()?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Create a signer from an already-parsed secret key.
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = secret_key.public_key();
        let public_key_hash = public_key.hash();
        Self {
            secret_key,
            public_key,
            public_key_hash,
        }
    }

    /// Derive a signer from fundraiser recovery material.
    pub fn from_fundraiser(
        email: &str,
        password: &str,
        mnemonic: impl AsRef<str>,
    ) -> Result<Self, Error> {
        let secret_key = SecretKey::from_fundraiser(email, password, mnemonic)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// The public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The `tz1` address of this signer.
    pub fn public_key_hash(&self) -> &Address {
        &self.public_key_hash
    }
}

impl std::fmt::Debug for InMemorySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySigner")
            .field("public_key_hash", &self.public_key_hash)
            .finish()
    }
}

#[async_trait]
impl Signer for InMemorySigner {
    async fn public_key(&self) -> Result<PublicKey, SignerError> {
        Ok(self.public_key.clone())
    }

    async fn public_key_hash(&self) -> Result<Address, SignerError> {
        Ok(self.public_key_hash.clone())
    }

    async fn sign(&self, bytes: &[u8], watermark: Watermark) -> Result<Signature, SignerError> {
        let mut payload = Vec::with_capacity(bytes.len() + 1);
        payload.push(watermark as u8);
        payload.extend_from_slice(bytes);
        let digest = blake2b(&payload, 32);
        Ok(self.secret_key.sign(&digest))
    }
}

// ============================================================================
// Tests
// ============================================================================
