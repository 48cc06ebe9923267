//! Cryptographic key types for Tezos.
//!
//! Tezos encodes all key material as base58check strings with a type prefix
//! (`edsk…` secret keys, `edpk…` public keys, `edsig…` signatures). Only
//! Ed25519 (`tz1`) keys are in scope; the toolkit treats other curves as
//! externally supplied signer implementations.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use bip39::Mnemonic;
use blake2::digest::{Update, VariableOutput};
use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ParseKeyError, SignerError};
use crate::types::Address;

/// BLAKE2b digest with an arbitrary output length.
///
/// Tezos hashes public keys to 20 bytes for addresses and operation
/// payloads to 32 bytes for signing and identification.
pub(crate) fn blake2b(data: &[u8], out_len: usize) -> Vec<u8> {
    let mut hasher =
        blake2::Blake2bVar::new(out_len).expect("output length is within BLAKE2b bounds");
    hasher.update(data);
    hasher.finalize_boxed().into_vec()
}

// ============================================================================
// Base58check
// ============================================================================

/// Base58check prefixes from the Tezos specification.
///
/// Each encoded value is `base58(prefix || payload || checksum)` where the
/// checksum is the first 4 bytes of `sha256(sha256(prefix || payload))`.
pub(crate) mod prefix {
    pub const TZ1: &[u8] = &[6, 161, 159];
    pub const KT1: &[u8] = &[2, 90, 121];
    pub const EDPK: &[u8] = &[13, 15, 37, 217];
    /// 32-byte Ed25519 seed form of a secret key.
    pub const EDSK_SEED: &[u8] = &[13, 15, 58, 7];
    /// 64-byte Ed25519 keypair form of a secret key.
    pub const EDSK: &[u8] = &[43, 246, 78, 7];
    /// Encrypted secret key; recognized so it can be rejected loudly.
    pub const EDESK: &[u8] = &[7, 90, 60, 179, 41];
    pub const EDSIG: &[u8] = &[9, 245, 205, 134, 18];
    pub const OPERATION: &[u8] = &[5, 116];
    pub const BLOCK: &[u8] = &[1, 52];
}

pub(crate) mod b58 {
    use sha2::{Digest, Sha256};

    use crate::error::ParseKeyError;

    fn checksum(payload: &[u8]) -> [u8; 4] {
        let once = Sha256::digest(payload);
        let twice = Sha256::digest(once);
        let mut out = [0u8; 4];
        out.copy_from_slice(&twice[..4]);
        out
    }

    /// Encode `prefix || data` as base58check.
    pub fn encode(prefix: &[u8], data: &[u8]) -> String {
        let mut payload = Vec::with_capacity(prefix.len() + data.len() + 4);
        payload.extend_from_slice(prefix);
        payload.extend_from_slice(data);
        let check = checksum(&payload);
        payload.extend_from_slice(&check);
        bs58::encode(payload).into_string()
    }

    /// Decode a base58check string, strip the expected prefix, and verify
    /// the payload length.
    pub fn decode(prefix: &[u8], expected_len: usize, s: &str) -> Result<Vec<u8>, ParseKeyError> {
        let raw = bs58::decode(s)
            .into_vec()
            .map_err(|e| ParseKeyError::InvalidBase58(e.to_string()))?;
        if raw.len() < prefix.len() + 4 || !raw.starts_with(prefix) {
            return Err(ParseKeyError::UnknownPrefix);
        }
        let (payload, check) = raw.split_at(raw.len() - 4);
        if checksum(payload) != check {
            return Err(ParseKeyError::BadChecksum);
        }
        let data = &payload[prefix.len()..];
        if data.len() != expected_len {
            return Err(ParseKeyError::InvalidLength {
                expected: expected_len,
                actual: data.len(),
            });
        }
        Ok(data.to_vec())
    }

    /// True when the string decodes to base58check data carrying `prefix`.
    pub fn has_prefix(prefix: &[u8], s: &str) -> bool {
        bs58::decode(s)
            .into_vec()
            .map(|raw| raw.starts_with(prefix))
            .unwrap_or(false)
    }
}

// ============================================================================
// PublicKey
// ============================================================================

/// An Ed25519 public key (`edpk…`).
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    key: VerifyingKey,
}

impl PublicKey {
    /// Create a public key from raw 32 bytes, validating the curve point.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, ParseKeyError> {
        let key = VerifyingKey::from_bytes(bytes).map_err(|_| ParseKeyError::InvalidCurvePoint)?;
        Ok(Self { key })
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.key.as_bytes()
    }

    /// The `tz1` address of this key: base58check over its 20-byte
    /// BLAKE2b hash.
    pub fn hash(&self) -> Address {
        let digest = blake2b(self.key.as_bytes(), 20);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        Address::tz1(bytes)
    }

    /// Verify a signature over a message digest.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let sig = ed25519_dalek::Signature::from_bytes(&signature.data);
        self.key.verify_strict(message, &sig).is_ok()
    }
}

impl FromStr for PublicKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data = b58::decode(prefix::EDPK, 32, s)?;
        let bytes: [u8; 32] = data
            .as_slice()
            .try_into()
            .map_err(|_| ParseKeyError::InvalidCurvePoint)?;
        Self::from_bytes(&bytes)
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", b58::encode(prefix::EDPK, self.key.as_bytes()))
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s: String = serde::Deserialize::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SecretKey
// ============================================================================

/// An Ed25519 secret key.
///
/// Parses both the 32-byte seed form (`edsk…`, 54 characters) and the
/// 64-byte keypair form (`edsk…`, 98 characters). Encrypted keys
/// (`edesk…`) are rejected with a distinct error.
#[derive(Clone)]
pub struct SecretKey {
    key: SigningKey,
}

impl SecretKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Create a secret key from a raw 32-byte Ed25519 seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }

    /// Derive a secret key from fundraiser recovery material.
    ///
    /// The fundraiser scheme is BIP-39 seed derivation with the
    /// concatenated email and password as the passphrase; the first 32
    /// bytes of the seed are the Ed25519 seed.
    pub fn from_fundraiser(
        email: &str,
        password: &str,
        mnemonic: impl AsRef<str>,
    ) -> Result<Self, SignerError> {
        let normalized = mnemonic
            .as_ref()
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let mnemonic: Mnemonic = normalized.parse().map_err(|_| SignerError::InvalidMnemonic)?;

        let seed = mnemonic.to_seed(&format!("{email}{password}"));
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&seed[..32]);
        Ok(Self::from_seed(bytes))
    }

    /// The raw 32-byte seed.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.key.as_bytes()
    }

    /// Derive the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            key: self.key.verifying_key(),
        }
    }

    /// Sign a message digest. Callers are expected to hash and watermark
    /// the payload first; see the signer module.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            data: self.key.sign(message).to_bytes(),
        }
    }
}

impl FromStr for SecretKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if b58::has_prefix(prefix::EDESK, s) {
            return Err(ParseKeyError::EncryptedKeyUnsupported);
        }
        if b58::has_prefix(prefix::EDSK_SEED, s) {
            let data = b58::decode(prefix::EDSK_SEED, 32, s)?;
            let seed: [u8; 32] = data
                .as_slice()
                .try_into()
                .map_err(|_| ParseKeyError::InvalidCurvePoint)?;
            return Ok(Self::from_seed(seed));
        }
        if b58::has_prefix(prefix::EDSK, s) {
            // Keypair form: 32-byte seed followed by the public key. The
            // embedded public key must match the one derived from the seed.
            let data = b58::decode(prefix::EDSK, 64, s)?;
            let bytes: [u8; 64] = data
                .as_slice()
                .try_into()
                .map_err(|_| ParseKeyError::InvalidCurvePoint)?;
            let key = SigningKey::from_keypair_bytes(&bytes)
                .map_err(|_| ParseKeyError::InvalidCurvePoint)?;
            return Ok(Self { key });
        }
        Err(ParseKeyError::UnknownPrefix)
    }
}

impl TryFrom<&str> for SecretKey {
    type Error = ParseKeyError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", b58::encode(prefix::EDSK_SEED, self.key.as_bytes()))
    }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the key material.
        f.debug_struct("SecretKey")
            .field("public_key", &self.public_key())
            .finish()
    }
}

// ============================================================================
// Signature
// ============================================================================

/// An Ed25519 signature (`edsig…`).
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    data: [u8; 64],
}

impl Signature {
    /// Raw signature bytes, as appended to forged operation bytes for
    /// injection.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.data
    }
}

impl FromStr for Signature {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data = b58::decode(prefix::EDSIG, 64, s)?;
        let bytes: [u8; 64] = data.as_slice().try_into().map_err(|_| {
            ParseKeyError::InvalidLength {
                expected: 64,
                actual: data.len(),
            }
        })?;
        Ok(Self { data: bytes })
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", b58::encode(prefix::EDSIG, &self.data))
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

// ============================================================================
// Tests
// ============================================================================
