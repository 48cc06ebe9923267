//! Contract access and operation estimation.
//!
//! Michelson stays opaque here: storage is surfaced as untyped JSON, and
//! typed views are left to application code.

use crate::client::{ContextHandle, Forger as _, Signer as _};
use crate::error::Error;
use crate::types::{Address, Mutez, OperationContent};

/// Entry point for contract utilities.
pub struct ContractApi {
    context: ContextHandle,
}

impl ContractApi {
    /// Create the API over the given context.
    pub fn new(context: ContextHandle) -> Self {
        Self { context }
    }

    /// A handle to the contract at `address`.
    ///
    /// Verifies the account exists on chain before returning.
    pub async fn at(&self, address: Address) -> Result<Contract, Error> {
        let context = self.context.get()?;
        // Any existing account answers the balance query; a missing one is
        // a 404 from the node.
        context.rpc().balance(&address).await?;
        Ok(Contract {
            address,
            context: self.context.clone(),
        })
    }
}

impl std::fmt::Debug for ContractApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ContractApi")
    }
}

/// A handle to one on-chain contract.
pub struct Contract {
    address: Address,
    context: ContextHandle,
}

impl Contract {
    /// The contract address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Raw Michelson storage as untyped JSON.
    pub async fn storage(&self) -> Result<serde_json::Value, Error> {
        let context = self.context.get()?;
        let storage = context.rpc().contract_storage(&self.address).await?;
        Ok(storage)
    }

    /// Current balance of the contract.
    pub async fn balance(&self) -> Result<Mutez, Error> {
        let context = self.context.get()?;
        let balance = context.rpc().balance(&self.address).await?;
        Ok(balance)
    }
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("address", &self.address)
            .finish()
    }
}

// ============================================================================
// Estimation
// ============================================================================

/// Baseline fee charged per operation, in mutez.
const BASE_FEE_MUTEZ: u64 = 100;
/// Ed25519 signature appended to forged bytes before injection.
const SIGNATURE_LEN: usize = 64;

/// Cost estimate for an operation group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Estimate {
    gas_limit: u64,
    storage_limit: u64,
    op_size: usize,
}

impl Estimate {
    /// Gas limit to attach to the operation.
    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// Storage limit to attach to the operation.
    pub fn storage_limit(&self) -> u64 {
        self.storage_limit
    }

    /// Size of the signed operation, in bytes.
    pub fn op_size(&self) -> usize {
        self.op_size
    }

    /// Suggested fee: the baker-default pricing of base fee plus one mutez
    /// per byte plus 0.1 mutez per gas unit.
    pub fn suggested_fee(&self) -> Mutez {
        Mutez::from_mutez(BASE_FEE_MUTEZ + self.op_size as u64 + self.gas_limit.div_ceil(10))
    }
}

/// Produces cost estimates by forging candidate operations against the
/// live node.
pub struct Estimator {
    context: ContextHandle,
}

impl Estimator {
    /// Create the estimator over the given context.
    pub fn new(context: ContextHandle) -> Self {
        Self { context }
    }

    /// Estimate a plain transfer from the active signer's account.
    pub async fn transfer(&self, destination: &Address, amount: Mutez) -> Result<Estimate, Error> {
        let context = self.context.get()?;
        let rpc = context.rpc();

        let source = context.signer().public_key_hash().await?;
        let constants = rpc.constants().await?;
        let branch = rpc.block_header("head~2").await?.hash;
        let counter = rpc.counter(&source).await? + 1;

        let gas_limit = crate::client::DEFAULT_GAS_LIMIT.min(constants.hard_gas_limit_per_operation);
        let storage_limit =
            crate::client::DEFAULT_STORAGE_LIMIT.min(constants.hard_storage_limit_per_operation);

        let contents = [OperationContent::Transaction {
            source,
            fee: Mutez::ZERO,
            counter,
            gas_limit,
            storage_limit,
            amount,
            destination: destination.clone(),
        }];
        let forged = context.forger().forge(&branch, &contents).await?;

        Ok(Estimate {
            gas_limit,
            storage_limit,
            op_size: forged.len() + SIGNATURE_LEN,
        })
    }
}

impl std::fmt::Debug for Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Estimator")
    }
}
