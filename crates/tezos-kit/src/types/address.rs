//! Address and hash types.
//!
//! All of these are base58check strings on the wire; the types keep the
//! decoded payload and re-encode on display so malformed values are
//! rejected at the edges.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ParseAddressError, ParseKeyError};
use crate::types::key::{b58, prefix};

fn map_b58_error(e: ParseKeyError, input: &str) -> ParseAddressError {
    match e {
        ParseKeyError::InvalidBase58(msg) => ParseAddressError::InvalidBase58(msg),
        ParseKeyError::BadChecksum => ParseAddressError::BadChecksum,
        ParseKeyError::InvalidLength { expected, actual } => {
            ParseAddressError::InvalidLength { expected, actual }
        }
        _ => ParseAddressError::UnknownPrefix(input.to_string()),
    }
}

// ============================================================================
// Address
// ============================================================================

/// The kind of an address: an implicit account or an originated contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressKind {
    /// Implicit Ed25519 account (`tz1…`).
    Tz1,
    /// Originated contract (`KT1…`).
    Kt1,
}

/// A Tezos address: a 20-byte hash with a kind prefix.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Address {
    kind: AddressKind,
    hash: [u8; 20],
}

impl Address {
    /// Implicit account address from a public-key hash.
    pub fn tz1(hash: [u8; 20]) -> Self {
        Self {
            kind: AddressKind::Tz1,
            hash,
        }
    }

    /// Originated contract address.
    pub fn kt1(hash: [u8; 20]) -> Self {
        Self {
            kind: AddressKind::Kt1,
            hash,
        }
    }

    /// The address kind.
    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    /// True for implicit (`tz1`) accounts.
    pub fn is_implicit(&self) -> bool {
        self.kind == AddressKind::Tz1
    }

    /// The raw 20-byte hash.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.hash
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, pfx) = if s.starts_with("tz1") {
            (AddressKind::Tz1, prefix::TZ1)
        } else if s.starts_with("KT1") {
            (AddressKind::Kt1, prefix::KT1)
        } else {
            return Err(ParseAddressError::UnknownPrefix(s.to_string()));
        };

        let data = b58::decode(pfx, 20, s).map_err(|e| map_b58_error(e, s))?;
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&data);
        Ok(Self { kind, hash })
    }
}

impl TryFrom<&str> for Address {
    type Error = ParseAddressError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pfx = match self.kind {
            AddressKind::Tz1 => prefix::TZ1,
            AddressKind::Kt1 => prefix::KT1,
        };
        write!(f, "{}", b58::encode(pfx, &self.hash))
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s: String = serde::Deserialize::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Operation and block hashes
// ============================================================================

macro_rules! hash_type {
    ($(#[$doc:meta])* $name:ident, $prefix:path) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $name([u8; 32]);

        impl $name {
            /// The raw 32-byte hash.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl FromStr for $name {
            type Err = ParseAddressError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let data = b58::decode($prefix, 32, s).map_err(|e| map_b58_error(e, s))?;
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(&data);
                Ok(Self(bytes))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", b58::encode($prefix, &self.0))
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s: String = serde::Deserialize::deserialize(d)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hash_type!(
    /// An operation hash (`o…`), as returned by injection.
    OperationHash,
    prefix::OPERATION
);

hash_type!(
    /// A block hash (`B…`), used as the branch of forged operations.
    BlockHash,
    prefix::BLOCK
);

// ============================================================================
// Tests
// ============================================================================
