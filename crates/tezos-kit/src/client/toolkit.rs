//! The main Tezos client facade.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::client::context::{
    Context, ContextHandle, OperationConfig, Protocol, ProviderRegistry,
};
use crate::client::forger::{Forger, RpcForger};
use crate::client::rpc::{GHOSTNET, MAINNET, RpcClient};
use crate::client::signer::{InMemorySigner, NoopSigner, Signer};
use crate::client::subscribe::{PollingSubscriber, SubscribeProvider};
use crate::client::tz::TzProvider;
use crate::client::wallet::{BatchBuilder, ContextWallet, OperationFactory, WalletProvider};
use crate::contract::{ContractApi, Estimator};
use crate::error::Error;
use crate::types::Address;

enum RpcOverride {
    Endpoint(String),
    Client(Arc<RpcClient>),
}

enum StreamOverride {
    Endpoint(String),
    Provider(Arc<dyn SubscribeProvider>),
}

/// Partial overrides for [`Tezos::configure`].
///
/// Every field is optional; a field left unset means "no opinion" for that
/// slot, which is distinct from supplying a default. Sticky slots (client,
/// stream, signer) keep a previously supplied instance across calls that
/// leave them unset, while the forger and wallet are rebuilt against the
/// latest wiring on every call.
///
/// # Example
///
/// ```rust,no_run
/// use tezos_kit::{ConfigureOptions, InMemorySigner, SecretKey, Tezos};
///
/// # fn example() -> Result<(), tezos_kit::Error> {
/// let tezos = Tezos::mainnet();
/// tezos.configure(
///     ConfigureOptions::new()
///         .rpc_url("https://ghostnet.ecadinfra.com")
///         .signer(InMemorySigner::from_secret_key(SecretKey::generate())),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ConfigureOptions {
    rpc: Option<RpcOverride>,
    stream: Option<StreamOverride>,
    signer: Option<Arc<dyn Signer>>,
    forger: Option<Arc<dyn Forger>>,
    wallet: Option<Arc<dyn WalletProvider>>,
    protocol: Option<Protocol>,
    config: Option<OperationConfig>,
}

impl ConfigureOptions {
    /// Options with every slot unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the toolkit to a new client for this endpoint.
    pub fn rpc_url(mut self, endpoint: impl Into<String>) -> Self {
        self.rpc = Some(RpcOverride::Endpoint(endpoint.into()));
        self
    }

    /// Adopt a pre-built RPC client.
    pub fn rpc_client(mut self, client: Arc<RpcClient>) -> Self {
        self.rpc = Some(RpcOverride::Client(client));
        self
    }

    /// Subscribe through a polling provider over a new, independent client
    /// bound to this endpoint.
    pub fn stream_url(mut self, endpoint: impl Into<String>) -> Self {
        self.stream = Some(StreamOverride::Endpoint(endpoint.into()));
        self
    }

    /// Adopt a subscription backend.
    pub fn stream_provider(mut self, provider: impl SubscribeProvider + 'static) -> Self {
        self.stream = Some(StreamOverride::Provider(Arc::new(provider)));
        self
    }

    /// Install a signer.
    pub fn signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Install a forger.
    pub fn forger(mut self, forger: impl Forger + 'static) -> Self {
        self.forger = Some(Arc::new(forger));
        self
    }

    /// Install a wallet backend.
    pub fn wallet(mut self, wallet: impl WalletProvider + 'static) -> Self {
        self.wallet = Some(Arc::new(wallet));
        self
    }

    /// Set the active protocol.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Overlay operation-config entries. Entries left unset in `config`
    /// keep their previously configured values.
    pub fn config(mut self, config: OperationConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// The main client for interacting with Tezos.
///
/// `Tezos` is the single entry point: it owns the execution context shared
/// by every derived component, exposes accessors for each capability, and
/// is reconfigured in place through [`configure`](Tezos::configure).
///
/// Instances are independent of each other; concurrent use of distinct
/// instances is safe. A single instance serializes its own configuration
/// changes, but interleaving `configure` with in-flight operations is the
/// application's responsibility.
///
/// # Example
///
/// ```rust,no_run
/// use tezos_kit::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     let tezos = Tezos::ghostnet();
///     tezos.import_secret_key("edsk...", None)?;
///
///     let dest: Address = "tz1...".parse()?;
///     let op = tezos.wallet().transfer(&dest, "1 tez".parse()?).await?;
///     op.confirmation().await?;
///     Ok(())
/// }
/// ```
pub struct Tezos {
    context: Arc<Context>,
    registry: Mutex<ProviderRegistry>,
    stream: RwLock<Arc<dyn SubscribeProvider>>,
}

impl Tezos {
    /// A toolkit bound to a public mainnet endpoint.
    pub fn mainnet() -> Self {
        let client = RpcClient::new(MAINNET.rpc_url).expect("mainnet endpoint is a valid URL");
        Self::with_client(Arc::new(client))
    }

    /// A toolkit bound to a public ghostnet endpoint.
    pub fn ghostnet() -> Self {
        let client = RpcClient::new(GHOSTNET.rpc_url).expect("ghostnet endpoint is a valid URL");
        Self::with_client(Arc::new(client))
    }

    /// A toolkit bound to a custom endpoint.
    pub fn custom(endpoint: impl AsRef<str>) -> Result<Self, Error> {
        Ok(Self::with_client(Arc::new(RpcClient::new(endpoint)?)))
    }

    /// A toolkit adopting a pre-built client.
    pub fn with_client(rpc: Arc<RpcClient>) -> Self {
        let context = Context::bootstrap(rpc);
        let stream: Arc<dyn SubscribeProvider> =
            Arc::new(PollingSubscriber::new(context.handle()));

        let mut registry = ProviderRegistry::new();
        // The caller chose this client; later configure calls that leave
        // the slot unset must not reset it to the default endpoint.
        registry.rpc.record_override();

        Tezos {
            context,
            registry: Mutex::new(registry),
            stream: RwLock::new(stream),
        }
    }

    /// Reconfigure the toolkit in place.
    ///
    /// Slots resolve in a fixed order: client, stream, signer, forger,
    /// wallet, then protocol and config. A failure constructing an
    /// override or default propagates immediately and leaves the remaining
    /// slots unresolved for this call.
    pub fn configure(&self, options: ConfigureOptions) -> Result<(), Error> {
        let mut registry = self.registry.lock();
        let handle = self.context.handle();

        let rpc_override = match options.rpc {
            Some(RpcOverride::Endpoint(endpoint)) => Some(Arc::new(RpcClient::new(&endpoint)?)),
            Some(RpcOverride::Client(client)) => Some(client),
            None => None,
        };
        if let Some(client) = registry.rpc.resolve(rpc_override, || {
            Ok(Arc::new(RpcClient::new(MAINNET.rpc_url)?))
        })? {
            tracing::debug!(endpoint = client.url(), "rpc client installed");
            self.context.set_rpc(client);
        }

        let stream_override: Option<Arc<dyn SubscribeProvider>> = match options.stream {
            Some(StreamOverride::Endpoint(endpoint)) => {
                Some(Arc::new(PollingSubscriber::for_endpoint(&endpoint)?))
            }
            Some(StreamOverride::Provider(provider)) => Some(provider),
            None => None,
        };
        if let Some(stream) = registry.stream.resolve(stream_override, || {
            Ok(Arc::new(PollingSubscriber::new(handle.clone())) as Arc<dyn SubscribeProvider>)
        })? {
            *self.stream.write() = stream;
        }

        if let Some(signer) = registry.signer.resolve(options.signer, || {
            Ok(Arc::new(NoopSigner) as Arc<dyn Signer>)
        })? {
            self.context.set_signer(signer);
        }

        if let Some(forger) = registry.forger.resolve(options.forger, || {
            Ok(Arc::new(RpcForger::new(handle.clone())) as Arc<dyn Forger>)
        })? {
            self.context.set_forger(forger);
        }

        if let Some(wallet) = registry.wallet.resolve(options.wallet, || {
            Ok(Arc::new(ContextWallet::new(handle.clone())) as Arc<dyn WalletProvider>)
        })? {
            self.context.set_wallet(wallet);
        }

        if let Some(protocol) = options.protocol {
            self.context.set_protocol(protocol);
        }
        if let Some(config) = options.config {
            self.context.overlay_config(&config);
        }
        Ok(())
    }

    /// Install `signer` through the signer slot's override path.
    fn install_signer(&self, signer: Arc<dyn Signer>) {
        let mut registry = self.registry.lock();
        registry.signer.record_override();
        self.context.set_signer(signer);
    }

    // ========================================================================
    // Key import
    // ========================================================================

    /// Import a secret key (`edsk…`) and sign with it from now on.
    ///
    /// No on-chain interaction happens: the key is parsed, a signer is
    /// built from it, and the signer slot is overridden.
    pub fn import_secret_key(
        &self,
        secret_key: impl AsRef<str>,
        passphrase: Option<&str>,
    ) -> Result<(), Error> {
        let signer = InMemorySigner::new(secret_key, passphrase)?;
        tracing::debug!(pkh = %signer.public_key_hash(), "secret key imported");
        self.install_signer(Arc::new(signer));
        Ok(())
    }

    /// Import a fundraiser account: derive a signer from the recovery
    /// material, activate the account on chain, and wait for the
    /// activation to be confirmed.
    ///
    /// Runs as one logical transaction. The derived signer is installed
    /// before the activation request is sent; if activation or its
    /// confirmation fails, the previously active signer is reinstalled and
    /// the original error is returned unchanged. An activation rejected
    /// because the account is already active is treated as success and the
    /// derived signer stays installed.
    pub async fn import_fundraiser(
        &self,
        email: &str,
        password: &str,
        mnemonic: &str,
        secret: &str,
    ) -> Result<(), Error> {
        let signer = InMemorySigner::from_fundraiser(email, password, mnemonic)?;
        let pkh = signer.public_key_hash().clone();

        let previous = self.context.signer();
        self.install_signer(Arc::new(signer));
        tracing::debug!(pkh = %pkh, "fundraiser signer installed, requesting activation");

        if let Err(error) = self.activate_and_confirm(&pkh, secret).await {
            tracing::debug!(pkh = %pkh, %error, "activation failed, restoring previous signer");
            self.install_signer(previous);
            return Err(error);
        }
        Ok(())
    }

    async fn activate_and_confirm(&self, pkh: &Address, secret: &str) -> Result<(), Error> {
        let operation = match self.tz().activate(pkh, secret).await {
            Ok(operation) => Some(operation),
            Err(error) if error.is_already_activated() => {
                tracing::debug!(pkh = %pkh, "account is already activated");
                None
            }
            Err(error) => return Err(error),
        };

        if let Some(operation) = operation {
            operation.confirmation().await?;
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Account utilities.
    pub fn tz(&self) -> TzProvider {
        TzProvider::new(self.context.handle())
    }

    /// Contract utilities.
    pub fn contract(&self) -> ContractApi {
        ContractApi::new(self.context.handle())
    }

    /// Operation estimation utilities.
    pub fn estimate(&self) -> Estimator {
        Estimator::new(self.context.handle())
    }

    /// The active wallet backend.
    pub fn wallet(&self) -> Arc<dyn WalletProvider> {
        self.context.wallet()
    }

    /// Factory for rehydrating pending operations from hashes.
    pub fn operation_factory(&self) -> OperationFactory {
        OperationFactory::new(self.context.handle())
    }

    /// A fresh batch builder over the live context.
    pub fn batch(&self) -> BatchBuilder {
        BatchBuilder::new(self.context.handle())
    }

    /// The active subscription backend.
    pub fn stream(&self) -> Arc<dyn SubscribeProvider> {
        self.stream.read().clone()
    }

    /// The active RPC client.
    pub fn rpc(&self) -> Arc<RpcClient> {
        self.context.rpc()
    }

    /// The active signer.
    pub fn signer(&self) -> Arc<dyn Signer> {
        self.context.signer()
    }

    /// The active forger.
    pub fn forger(&self) -> Arc<dyn Forger> {
        self.context.forger()
    }

    /// The active protocol, if one was configured.
    pub fn protocol(&self) -> Option<Protocol> {
        self.context.protocol()
    }

    /// A snapshot of the operation config.
    pub fn config(&self) -> OperationConfig {
        self.context.config()
    }

    /// A context handle for constructing custom providers against this
    /// toolkit.
    pub fn context_handle(&self) -> ContextHandle {
        self.context.handle()
    }
}

impl std::fmt::Debug for Tezos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tezos")
            .field("rpc", &self.context.rpc().url())
            .field("protocol", &self.context.protocol())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignerError;
    use crate::types::SecretKey;
    use std::time::Duration;

    fn toolkit() -> Tezos {
        Tezos::custom("http://localhost:8732").unwrap()
    }

    fn test_signer() -> InMemorySigner {
        InMemorySigner::from_secret_key(SecretKey::generate())
    }

    #[tokio::test]
    async fn test_fresh_toolkit_defaults() {
        let tezos = toolkit();

        assert_eq!(tezos.rpc().url(), "http://localhost:8732");
        assert!(tezos.protocol().is_none());
        assert_eq!(tezos.config(), OperationConfig::default());

        // No signer configured: the installed default declines loudly.
        let result = tezos.signer().public_key_hash().await;
        assert_eq!(result.unwrap_err(), SignerError::NoSignerConfigured);
    }

    #[test]
    fn test_empty_configure_keeps_chosen_endpoint() {
        let tezos = toolkit();
        let before = tezos.rpc();

        tezos.configure(ConfigureOptions::new()).unwrap();
        tezos.configure(ConfigureOptions::new()).unwrap();

        // The endpoint chosen at construction is sticky.
        assert!(Arc::ptr_eq(&before, &tezos.rpc()));
    }

    #[test]
    fn test_rpc_url_override_builds_new_client() {
        let tezos = toolkit();

        tezos
            .configure(ConfigureOptions::new().rpc_url("http://localhost:9732"))
            .unwrap();
        assert_eq!(tezos.rpc().url(), "http://localhost:9732");

        // And stays across an unexpressed call.
        tezos.configure(ConfigureOptions::new()).unwrap();
        assert_eq!(tezos.rpc().url(), "http://localhost:9732");
    }

    #[test]
    fn test_rpc_client_override_adopted_directly() {
        let tezos = toolkit();
        let client = Arc::new(RpcClient::new("http://localhost:9732").unwrap());

        tezos
            .configure(ConfigureOptions::new().rpc_client(client.clone()))
            .unwrap();
        assert!(Arc::ptr_eq(&client, &tezos.rpc()));
    }

    #[test]
    fn test_signer_slot_is_sticky() {
        let tezos = toolkit();

        tezos
            .configure(ConfigureOptions::new().signer(test_signer()))
            .unwrap();
        let installed = tezos.signer();

        tezos.configure(ConfigureOptions::new()).unwrap();
        tezos.configure(ConfigureOptions::new()).unwrap();
        assert!(Arc::ptr_eq(&installed, &tezos.signer()));
    }

    #[test]
    fn test_stream_slot_is_sticky() {
        let tezos = toolkit();

        tezos
            .configure(
                ConfigureOptions::new()
                    .stream_provider(PollingSubscriber::for_endpoint("http://localhost:9732").unwrap()),
            )
            .unwrap();
        let installed = tezos.stream();

        tezos.configure(ConfigureOptions::new()).unwrap();
        assert!(Arc::ptr_eq(&installed, &tezos.stream()));
    }

    #[test]
    fn test_forger_and_wallet_rebuilt_every_call() {
        let tezos = toolkit();
        let forger = tezos.forger();
        let wallet = tezos.wallet();

        tezos.configure(ConfigureOptions::new()).unwrap();

        // Non-sticky slots are re-resolved even with unexpressed overrides.
        assert!(!Arc::ptr_eq(&forger, &tezos.forger()));
        assert!(!Arc::ptr_eq(&wallet, &tezos.wallet()));
    }

    #[test]
    fn test_config_overlays_across_calls() {
        let tezos = toolkit();

        tezos
            .configure(ConfigureOptions::new().config(OperationConfig {
                confirmation_polling_timeout: Some(Duration::from_secs(60)),
                ..Default::default()
            }))
            .unwrap();
        tezos
            .configure(ConfigureOptions::new().config(OperationConfig {
                confirmation_count: Some(3),
                ..Default::default()
            }))
            .unwrap();

        let config = tezos.config();
        assert_eq!(
            config.confirmation_polling_timeout,
            Some(Duration::from_secs(60))
        );
        assert_eq!(config.confirmation_count, Some(3));
    }

    #[test]
    fn test_protocol_kept_when_unexpressed() {
        let tezos = toolkit();

        tezos
            .configure(ConfigureOptions::new().protocol(Protocol::Paris))
            .unwrap();
        tezos.configure(ConfigureOptions::new()).unwrap();
        assert_eq!(tezos.protocol(), Some(Protocol::Paris));

        tezos
            .configure(ConfigureOptions::new().protocol(Protocol::Nairobi))
            .unwrap();
        assert_eq!(tezos.protocol(), Some(Protocol::Nairobi));
    }

    #[test]
    fn test_malformed_endpoint_is_config_error() {
        let tezos = toolkit();
        let result = tezos.configure(ConfigureOptions::new().rpc_url("not a url"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_failed_slot_leaves_later_slots_unresolved() {
        let tezos = toolkit();
        let before = tezos.signer();

        // Stream resolves before signer; its failure aborts the call.
        let result = tezos.configure(
            ConfigureOptions::new()
                .stream_url("not a url")
                .signer(test_signer()),
        );
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(Arc::ptr_eq(&before, &tezos.signer()));
    }

    #[tokio::test]
    async fn test_import_secret_key_installs_signer() {
        let tezos = toolkit();
        let sk = SecretKey::generate();

        tezos.import_secret_key(sk.to_string(), None).unwrap();

        let pkh = tezos.signer().public_key_hash().await.unwrap();
        assert_eq!(pkh, sk.public_key().hash());

        // Imported signer is sticky like any explicit override.
        tezos.configure(ConfigureOptions::new()).unwrap();
        let pkh_after = tezos.signer().public_key_hash().await.unwrap();
        assert_eq!(pkh_after, pkh);
    }

    #[test]
    fn test_import_secret_key_rejects_garbage() {
        let tezos = toolkit();
        let result = tezos.import_secret_key("definitely-not-a-key", None);
        assert!(matches!(result, Err(Error::ParseKey(_))));
    }

    #[tokio::test]
    async fn test_import_fundraiser_rolls_back_on_activation_failure() {
        // Port 9 is unroutable: the activation request fails with a
        // transport error, which is not in the tolerated class.
        let tezos = Tezos::custom("http://127.0.0.1:9").unwrap();
        tezos
            .configure(ConfigureOptions::new().signer(test_signer()))
            .unwrap();
        let installed_before = tezos.signer();

        let mnemonic = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let result = tezos
            .import_fundraiser("alice@example.com", "hunter2", mnemonic, "secret")
            .await;

        assert!(matches!(result, Err(Error::Rpc(_))));
        // The signer active before the import is restored exactly.
        assert!(Arc::ptr_eq(&installed_before, &tezos.signer()));
    }

    #[tokio::test]
    async fn test_import_fundraiser_rejects_bad_mnemonic_without_touching_state() {
        let tezos = toolkit();
        let before = tezos.signer();

        let result = tezos
            .import_fundraiser("a@b.c", "pw", "not a mnemonic", "secret")
            .await;

        assert!(matches!(result, Err(Error::Signer(SignerError::InvalidMnemonic))));
        assert!(Arc::ptr_eq(&before, &tezos.signer()));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = toolkit();
        let b = Tezos::custom("http://localhost:9732").unwrap();

        a.configure(ConfigureOptions::new().signer(test_signer()))
            .unwrap();

        // b's registry and context are untouched by a's configuration.
        assert!(!Arc::ptr_eq(&a.signer(), &b.signer()));
        assert_eq!(b.rpc().url(), "http://localhost:9732");
    }

    #[test]
    fn test_batch_rebinds_through_live_context() {
        let tezos = toolkit();
        let batch = tezos.batch();
        assert!(batch.is_empty());

        // Swapping the client after building a batch is still observed at
        // send time, because the builder reads through the context handle.
        tezos
            .configure(ConfigureOptions::new().rpc_url("http://localhost:9732"))
            .unwrap();
        assert_eq!(tezos.rpc().url(), "http://localhost:9732");
    }
}
