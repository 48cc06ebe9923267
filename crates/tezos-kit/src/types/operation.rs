//! Operation contents in the node's JSON shape.
//!
//! Only the contents this toolkit emits are modeled. Numeric fields are
//! serialized as decimal strings, per the node's JSON convention.

use serde::Serialize;
use serde_with::{DisplayFromStr, serde_as};

use crate::types::{Address, Mutez, PublicKey};

/// One entry in an operation group.
#[serde_as]
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationContent {
    /// Transfer of funds between accounts.
    Transaction {
        source: Address,
        fee: Mutez,
        #[serde_as(as = "DisplayFromStr")]
        counter: u64,
        #[serde_as(as = "DisplayFromStr")]
        gas_limit: u64,
        #[serde_as(as = "DisplayFromStr")]
        storage_limit: u64,
        amount: Mutez,
        destination: Address,
    },

    /// Publication of a source account's public key. Required once per
    /// account, before its first signed operation.
    Reveal {
        source: Address,
        fee: Mutez,
        #[serde_as(as = "DisplayFromStr")]
        counter: u64,
        #[serde_as(as = "DisplayFromStr")]
        gas_limit: u64,
        #[serde_as(as = "DisplayFromStr")]
        storage_limit: u64,
        public_key: PublicKey,
    },

    /// Activation of a fundraiser account. Anonymous: carries no fee,
    /// counter, or signature.
    ActivateAccount { pkh: Address, secret: String },
}
