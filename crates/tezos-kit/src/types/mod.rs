//! Core types: keys, addresses, hashes, amounts, and operation contents.

pub(crate) mod key;

mod address;
mod mutez;
mod operation;

pub use address::{Address, AddressKind, BlockHash, OperationHash};
pub use key::{PublicKey, SecretKey, Signature};
pub use mutez::{MUTEZ_PER_TEZ, Mutez};
pub use operation::OperationContent;
