//! Low-level REST client for the Tezos node RPC.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_with::{DisplayFromStr, serde_as};

use crate::error::{Error, RpcError};
use crate::types::{Address, BlockHash, Mutez, OperationContent, OperationHash, PublicKey};

/// Network configuration presets.
pub struct NetworkConfig {
    /// A public RPC endpoint for this network.
    pub rpc_url: &'static str,
    /// The network identifier.
    pub network_id: &'static str,
}

/// Mainnet configuration.
pub const MAINNET: NetworkConfig = NetworkConfig {
    rpc_url: "https://mainnet.ecadinfra.com",
    network_id: "mainnet",
};

/// Ghostnet (long-running testnet) configuration.
pub const GHOSTNET: NetworkConfig = NetworkConfig {
    rpc_url: "https://ghostnet.ecadinfra.com",
    network_id: "ghostnet",
};

/// A block header, as returned by `/chains/main/blocks/<id>/header`.
#[derive(Clone, Debug, Deserialize)]
pub struct BlockHeader {
    pub protocol: String,
    pub chain_id: String,
    pub hash: BlockHash,
    pub level: u64,
}

/// The subset of chain constants the toolkit consumes for estimation.
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct ChainConstants {
    #[serde_as(as = "DisplayFromStr")]
    pub hard_gas_limit_per_operation: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub hard_storage_limit_per_operation: u64,
    pub cost_per_byte: Mutez,
}

#[derive(Serialize)]
struct ForgeRequest<'a> {
    branch: &'a BlockHash,
    contents: &'a [OperationContent],
}

/// REST client bound to a single node endpoint.
///
/// All chain state lives on the node; this client only shapes requests and
/// maps failures. Non-2xx responses keep the response body verbatim because
/// protocol-level failures (including the tolerated already-activated
/// class) are reported there.
pub struct RpcClient {
    endpoint: String,
    client: reqwest::Client,
}

impl RpcClient {
    /// Create a client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the endpoint is not a valid URL.
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self, Error> {
        let endpoint = endpoint.as_ref();
        let parsed: url::Url = endpoint
            .parse()
            .map_err(|e| Error::Config(format!("Invalid RPC endpoint '{}': {}", endpoint, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Invalid RPC endpoint '{}': expected an http(s) URL",
                endpoint
            )));
        }
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// The endpoint URL this client is bound to.
    pub fn url(&self) -> &str {
        &self.endpoint
    }

    async fn read_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, RpcError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RpcError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(RpcError::Json)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RpcError> {
        tracing::trace!(path, "rpc get");
        let response = self
            .client
            .get(format!("{}/{}", self.endpoint, path))
            .send()
            .await?;
        self.read_response(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RpcError> {
        tracing::trace!(path, "rpc post");
        let response = self
            .client
            .post(format!("{}/{}", self.endpoint, path))
            .json(body)
            .send()
            .await?;
        self.read_response(response).await
    }

    /// Spendable balance of an account, in mutez.
    pub async fn balance(&self, address: &Address) -> Result<Mutez, RpcError> {
        self.get(&format!(
            "chains/main/blocks/head/context/contracts/{}/balance",
            address
        ))
        .await
    }

    /// Current counter of an account. The next operation from the account
    /// must carry `counter + 1`.
    pub async fn counter(&self, address: &Address) -> Result<u64, RpcError> {
        let counter: String = self
            .get(&format!(
                "chains/main/blocks/head/context/contracts/{}/counter",
                address
            ))
            .await?;
        counter
            .parse()
            .map_err(|_| RpcError::InvalidResponse(format!("non-numeric counter '{counter}'")))
    }

    /// The revealed public key of an account, or `None` if the account has
    /// not published one yet.
    pub async fn manager_key(&self, address: &Address) -> Result<Option<PublicKey>, RpcError> {
        self.get(&format!(
            "chains/main/blocks/head/context/contracts/{}/manager_key",
            address
        ))
        .await
    }

    /// Header of the chain head.
    pub async fn head_header(&self) -> Result<BlockHeader, RpcError> {
        self.block_header("head").await
    }

    /// Header of an arbitrary block. Accepts any node block id: a hash, a
    /// level, or a relative reference such as `head~2`.
    pub async fn block_header(&self, block: &str) -> Result<BlockHeader, RpcError> {
        self.get(&format!("chains/main/blocks/{}/header", block)).await
    }

    /// Operation hashes of a block, grouped by validation pass.
    pub async fn block_operation_hashes(&self, block: &str) -> Result<Vec<Vec<String>>, RpcError> {
        self.get(&format!("chains/main/blocks/{}/operation_hashes", block))
            .await
    }

    /// Chain constants at the head.
    pub async fn constants(&self) -> Result<ChainConstants, RpcError> {
        self.get("chains/main/blocks/head/context/constants").await
    }

    /// Raw Michelson storage of a contract, as untyped JSON.
    pub async fn contract_storage(&self, address: &Address) -> Result<serde_json::Value, RpcError> {
        self.get(&format!(
            "chains/main/blocks/head/context/contracts/{}/storage",
            address
        ))
        .await
    }

    /// Forge an operation group on the node, returning the raw bytes to
    /// sign and inject.
    pub async fn forge_operations(
        &self,
        branch: &BlockHash,
        contents: &[OperationContent],
    ) -> Result<Vec<u8>, RpcError> {
        let forged: String = self
            .post(
                "chains/main/blocks/head/helpers/forge/operations",
                &ForgeRequest { branch, contents },
            )
            .await?;
        hex::decode(&forged)
            .map_err(|e| RpcError::InvalidResponse(format!("non-hex forge result: {e}")))
    }

    /// Inject a signed (or anonymous) operation, returning its hash.
    pub async fn inject_operation(&self, signed_bytes: &[u8]) -> Result<OperationHash, RpcError> {
        let hash: String = self
            .post("injection/operation?chain=main", &hex::encode(signed_bytes))
            .await?;
        hash.parse()
            .map_err(|e| RpcError::InvalidResponse(format!("bad operation hash '{hash}': {e}")))
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
