//! End-to-end tests against a canned-response node.
//!
//! A minimal HTTP responder stands in for the Tezos node RPC: each test
//! declares the routes it expects the toolkit to hit and the bodies the
//! node would answer with. Hashes in the canned responses are generated
//! through the crate's own types so they carry valid base58check encodings.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use tezos_kit::{
    Address, BlockHash, ConfigureOptions, Error, InMemorySigner, Mutez, OperationHash, RpcError,
    SecretKey, Signer, Tezos, WalletProvider,
};

const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// One canned route: method, full path (including query), status, body.
#[derive(Clone)]
struct Route {
    method: &'static str,
    path: String,
    status: u16,
    body: String,
}

fn route(method: &'static str, path: impl Into<String>, status: u16, body: impl Into<String>) -> Route {
    Route {
        method,
        path: path.into(),
        status,
        body: body.into(),
    }
}

/// Serve the given routes on an ephemeral port, returning the endpoint URL.
/// Unmatched requests get a 404 so a failing test names the missing route.
async fn spawn_node(routes: Vec<Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                // Read the full request: headers, then content-length bytes.
                loop {
                    let mut chunk = [0u8; 1024];
                    let n = match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => n,
                    };
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(header_end) = find_header_end(&buf) {
                        let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
                        let content_length = headers
                            .lines()
                            .find_map(|l| {
                                let (name, value) = l.split_once(':')?;
                                name.eq_ignore_ascii_case("content-length")
                                    .then(|| value.trim().parse::<usize>().ok())?
                            })
                            .unwrap_or(0);
                        if buf.len() >= header_end + 4 + content_length {
                            let mut lines = headers.lines();
                            let request_line = lines.next().unwrap_or_default();
                            let mut parts = request_line.split_whitespace();
                            let method = parts.next().unwrap_or_default();
                            let path = parts.next().unwrap_or_default();

                            let (status, body) = routes
                                .iter()
                                .find(|r| r.method == method && r.path == path)
                                .map(|r| (r.status, r.body.clone()))
                                .unwrap_or((404, format!("\"no canned route for {method} {path}\"")));

                            let reason = if status < 400 { "OK" } else { "Error" };
                            let response = format!(
                                "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                                body.len()
                            );
                            let _ = socket.write_all(response.as_bytes()).await;
                            let _ = socket.shutdown().await;
                            return;
                        }
                    }
                }
            });
        }
    });

    format!("http://{addr}")
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn header_json(hash: &BlockHash, level: u64) -> String {
    format!(
        r#"{{"protocol":"PtNairobiyssHuh87hEhfVBGCVrK3WnS8Z2FT4ymB5tAa4r1nQf","chain_id":"NetXdQprcVkpaWU","hash":"{hash}","level":{level}}}"#
    )
}

/// Routes for a successful activate-and-confirm round trip.
fn activation_routes(op_hash: &OperationHash) -> Vec<Route> {
    let branch = BlockHash::from([1u8; 32]);
    let head = BlockHash::from([2u8; 32]);
    vec![
        route(
            "GET",
            "/chains/main/blocks/head~2/header",
            200,
            header_json(&branch, 98),
        ),
        route(
            "POST",
            "/chains/main/blocks/head/helpers/forge/operations",
            200,
            "\"0a0b0c0d\"",
        ),
        route(
            "POST",
            "/injection/operation?chain=main",
            200,
            format!("\"{op_hash}\""),
        ),
        route(
            "GET",
            "/chains/main/blocks/head/header",
            200,
            header_json(&head, 100),
        ),
        route(
            "GET",
            "/chains/main/blocks/100/operation_hashes",
            200,
            format!(r#"[[],[],[],["{op_hash}"]]"#),
        ),
    ]
}

#[tokio::test]
async fn fundraiser_import_activates_and_confirms() {
    let op_hash = OperationHash::from([7u8; 32]);
    let endpoint = spawn_node(activation_routes(&op_hash)).await;
    let tezos = Tezos::custom(&endpoint).unwrap();

    tezos
        .import_fundraiser("alice@example.com", "hunter2", MNEMONIC, "secret")
        .await
        .unwrap();

    // The derived signer is installed and answers with the expected hash.
    let expected = InMemorySigner::from_fundraiser("alice@example.com", "hunter2", MNEMONIC)
        .unwrap()
        .public_key_hash()
        .clone();
    let active = tezos.signer().public_key_hash().await.unwrap();
    assert_eq!(active, expected);
}

#[tokio::test]
async fn fundraiser_import_tolerates_already_activated() {
    let branch = BlockHash::from([1u8; 32]);
    let routes = vec![
        route(
            "GET",
            "/chains/main/blocks/head~2/header",
            200,
            header_json(&branch, 98),
        ),
        route(
            "POST",
            "/chains/main/blocks/head/helpers/forge/operations",
            200,
            "\"0a0b0c0d\"",
        ),
        route(
            "POST",
            "/injection/operation?chain=main",
            500,
            r#"[{"kind":"permanent","id":"proto.020-PsParisB.operation.invalid_activation"}]"#,
        ),
    ];
    let endpoint = spawn_node(routes).await;
    let tezos = Tezos::custom(&endpoint).unwrap();

    // Tolerated failure class: the import succeeds with no confirmation
    // wait and the derived signer stays installed.
    tezos
        .import_fundraiser("alice@example.com", "hunter2", MNEMONIC, "secret")
        .await
        .unwrap();

    let expected = InMemorySigner::from_fundraiser("alice@example.com", "hunter2", MNEMONIC)
        .unwrap()
        .public_key_hash()
        .clone();
    let active = tezos.signer().public_key_hash().await.unwrap();
    assert_eq!(active, expected);
}

#[tokio::test]
async fn fundraiser_import_rolls_back_on_activation_failure() {
    let branch = BlockHash::from([1u8; 32]);
    let routes = vec![
        route(
            "GET",
            "/chains/main/blocks/head~2/header",
            200,
            header_json(&branch, 98),
        ),
        route(
            "POST",
            "/chains/main/blocks/head/helpers/forge/operations",
            200,
            "\"0a0b0c0d\"",
        ),
        route(
            "POST",
            "/injection/operation?chain=main",
            500,
            r#"[{"kind":"temporary","id":"proto.020-PsParisB.counter_in_the_past"}]"#,
        ),
    ];
    let endpoint = spawn_node(routes).await;
    let tezos = Tezos::custom(&endpoint).unwrap();

    let previous = InMemorySigner::from_secret_key(SecretKey::generate());
    tezos
        .configure(ConfigureOptions::new().signer(previous.clone()))
        .unwrap();
    let installed_before = tezos.signer();

    let result = tezos
        .import_fundraiser("alice@example.com", "hunter2", MNEMONIC, "secret")
        .await;

    // The original error surfaces unchanged.
    match result {
        Err(Error::Rpc(RpcError::Status { status, body })) => {
            assert_eq!(status, 500);
            assert!(body.contains("counter_in_the_past"));
        }
        other => panic!("expected the activation error, got {other:?}"),
    }

    // The signer active before the call is restored exactly.
    assert!(Arc::ptr_eq(&installed_before, &tezos.signer()));
    let active = tezos.signer().public_key_hash().await.unwrap();
    assert_eq!(&active, previous.public_key_hash());
}

#[tokio::test]
async fn fundraiser_import_rolls_back_on_confirmation_failure() {
    let op_hash = OperationHash::from([7u8; 32]);
    let branch = BlockHash::from([1u8; 32]);
    let routes = vec![
        route(
            "GET",
            "/chains/main/blocks/head~2/header",
            200,
            header_json(&branch, 98),
        ),
        route(
            "POST",
            "/chains/main/blocks/head/helpers/forge/operations",
            200,
            "\"0a0b0c0d\"",
        ),
        route(
            "POST",
            "/injection/operation?chain=main",
            200,
            format!("\"{op_hash}\""),
        ),
        // Confirmation polling starts with the head header and fails there.
        route(
            "GET",
            "/chains/main/blocks/head/header",
            500,
            "\"node is misbehaving\"",
        ),
    ];
    let endpoint = spawn_node(routes).await;
    let tezos = Tezos::custom(&endpoint).unwrap();

    let installed_before = tezos.signer();
    let result = tezos
        .import_fundraiser("alice@example.com", "hunter2", MNEMONIC, "secret")
        .await;

    assert!(matches!(
        result,
        Err(Error::Rpc(RpcError::Status { status: 500, .. }))
    ));
    assert!(Arc::ptr_eq(&installed_before, &tezos.signer()));
}

#[tokio::test]
async fn wallet_transfer_forges_signs_and_confirms() {
    let signer_key = SecretKey::generate();
    let signer = InMemorySigner::from_secret_key(signer_key.clone());
    let source = signer.public_key_hash().clone();
    let destination: Address = SecretKey::generate().public_key().hash();

    let op_hash = OperationHash::from([9u8; 32]);
    let branch = BlockHash::from([3u8; 32]);
    let head = BlockHash::from([4u8; 32]);

    let routes = vec![
        route(
            "GET",
            "/chains/main/blocks/head~2/header",
            200,
            header_json(&branch, 200),
        ),
        route(
            "GET",
            format!("/chains/main/blocks/head/context/contracts/{source}/counter"),
            200,
            "\"5\"",
        ),
        // The source already revealed its key: no reveal gets prepended.
        route(
            "GET",
            format!("/chains/main/blocks/head/context/contracts/{source}/manager_key"),
            200,
            format!("\"{}\"", signer_key.public_key()),
        ),
        route(
            "POST",
            "/chains/main/blocks/head/helpers/forge/operations",
            200,
            "\"00112233445566\"",
        ),
        route(
            "POST",
            "/injection/operation?chain=main",
            200,
            format!("\"{op_hash}\""),
        ),
        route(
            "GET",
            "/chains/main/blocks/head/header",
            200,
            header_json(&head, 202),
        ),
        route(
            "GET",
            "/chains/main/blocks/202/operation_hashes",
            200,
            format!(r#"[[],[],[],["{op_hash}"]]"#),
        ),
    ];
    let endpoint = spawn_node(routes).await;
    let tezos = Tezos::custom(&endpoint).unwrap();
    tezos.configure(ConfigureOptions::new().signer(signer)).unwrap();

    let operation = tezos
        .wallet()
        .transfer(&destination, Mutez::from_tez(1))
        .await
        .unwrap();
    assert_eq!(operation.hash(), &op_hash);

    let level = operation.confirmation().await.unwrap();
    assert_eq!(level, 202);
}

#[tokio::test]
async fn balance_query_parses_mutez_string() {
    let address: Address = SecretKey::generate().public_key().hash();
    let routes = vec![route(
        "GET",
        format!("/chains/main/blocks/head/context/contracts/{address}/balance"),
        200,
        "\"2500000\"",
    )];
    let endpoint = spawn_node(routes).await;
    let tezos = Tezos::custom(&endpoint).unwrap();

    let balance = tezos.tz().balance(&address).await.unwrap();
    assert_eq!(balance, Mutez::from_mutez(2_500_000));
}

#[tokio::test]
async fn operation_factory_confirmation_times_out() {
    use std::time::Duration;
    use tezos_kit::OperationConfig;

    let head = BlockHash::from([5u8; 32]);
    let op_hash = OperationHash::from([6u8; 32]);
    let routes = vec![
        route(
            "GET",
            "/chains/main/blocks/head/header",
            200,
            header_json(&head, 300),
        ),
        // The operation never shows up in a block.
        route(
            "GET",
            "/chains/main/blocks/300/operation_hashes",
            200,
            "[[],[],[],[]]",
        ),
    ];
    let endpoint = spawn_node(routes).await;
    let tezos = Tezos::custom(&endpoint).unwrap();
    tezos
        .configure(ConfigureOptions::new().config(OperationConfig {
            confirmation_polling_interval: Some(Duration::from_millis(10)),
            confirmation_polling_timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        }))
        .unwrap();

    let operation = tezos.operation_factory().from_hash(op_hash.clone()).unwrap();
    let result = operation.confirmation().await;

    match result {
        Err(Error::ConfirmationTimeout { operation, .. }) => assert_eq!(operation, op_hash),
        other => panic!("expected a confirmation timeout, got {other:?}"),
    }
}
