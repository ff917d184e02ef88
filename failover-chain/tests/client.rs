use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use failover_chain::keys::decode_signature;
use failover_chain::signer::signing_digest;
use failover_chain::{ChainClient, ClientConfig, PrivateKey, TransactionSigner};
use failover_monitor::{
    BackupKeyQueue, ChainGateway, FailoverAction, FailoverController, GatewayError, KeyChangeRequest,
    MonitorError, ProducerRegistration,
};

const DEV_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";
const DEV_LEGACY: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";
const DEV_PUB_K1: &str = "PUB_K1_6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5BoDq63";
const CHAIN_ID: &str = "aca376f206b8fc25a6ed44dbdc66547c36c6c33e3a119ffbeaef943642f0e906";

#[derive(Default)]
struct MockNode {
    pushed: Mutex<Vec<Value>>,
    block_requests: Mutex<Vec<Value>>,
    reject_push: bool,
    /// Delay before every endpoint answers
    latency: Option<Duration>,
}

async fn slow_down(State(node): State<Arc<MockNode>>, request: Request, next: Next) -> Response {
    if let Some(latency) = node.latency {
        tokio::time::sleep(latency).await;
    }
    next.run(request).await
}

async fn get_info() -> Json<Value> {
    Json(json!({
        "server_version": "d133c641",
        "chain_id": CHAIN_ID,
        "head_block_num": 1003,
        "last_irreversible_block_num": 700,
        "head_block_producer": "otherprod"
    }))
}

async fn get_producers(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["json"], json!(true));
    assert_eq!(body["lower_bound"], json!(""));
    Json(json!({
        "rows": [
            { "owner": "otherprod", "is_active": 1, "unpaid_blocks": 7, "url": "" },
            { "owner": "producer1", "is_active": 1, "unpaid_blocks": "1200", "url": "https://producer1.example" }
        ],
        "total_producer_vote_weight": "1.0",
        "more": ""
    }))
}

async fn get_producer_schedule() -> Json<Value> {
    Json(json!({
        "active": {
            "version": 4,
            "producers": [{
                "producer_name": "producer1",
                "authority": [
                    "block_signing_authority_v0",
                    { "threshold": 1, "keys": [{ "key": DEV_LEGACY, "weight": 1 }] }
                ]
            }]
        },
        "pending": null,
        "proposed": { "version": 5, "producers": [{ "producer_name": "producer1", "block_signing_key": "PUB_K1_NEXT" }] }
    }))
}

async fn get_block(State(node): State<Arc<MockNode>>, Json(body): Json<Value>) -> Json<Value> {
    node.block_requests.lock().unwrap().push(body);
    Json(json!({
        "id": "000003e8f1c1e0b2e9d8b7c6a5f4e3d2c1b0a9f8e7d6c5b4a3f2e1d0c9b8a7f6",
        "block_num": 1000,
        "timestamp": "2023-11-14T22:13:20.000",
        "ref_block_prefix": 123456789
    }))
}

async fn push_transaction(
    State(node): State<Arc<MockNode>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let packed = hex::decode(body["packed_trx"].as_str().unwrap_or_default()).unwrap_or_default();
    node.pushed.lock().unwrap().push(body);
    if node.reject_push {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "code": 500,
                "message": "Internal Service Error",
                "error": {
                    "name": "eosio_assert_message_exception",
                    "what": "eosio_assert_message assertion failure",
                    "details": [{ "message": "assertion failure with message: producer not found" }]
                }
            })),
        );
    }
    let transaction_id = hex::encode(Sha256::digest(&packed));
    (StatusCode::ACCEPTED, Json(json!({ "transaction_id": transaction_id, "processed": {} })))
}

async fn spawn_node(node: Arc<MockNode>) -> SocketAddr {
    let app = Router::new()
        .route("/v1/chain/get_info", post(get_info))
        .route("/v1/chain/get_producers", post(get_producers))
        .route("/v1/chain/get_producer_schedule", post(get_producer_schedule))
        .route("/v1/chain/get_block", post(get_block))
        .route("/v1/chain/push_transaction", post(push_transaction))
        .layer(middleware::from_fn_with_state(node.clone(), slow_down))
        .with_state(node);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> ChainClient {
    let key: PrivateKey = DEV_WIF.parse().unwrap();
    ChainClient::new(ClientConfig::new(format!("http://{}/", addr)))
        .unwrap()
        .with_signer(TransactionSigner::new(key))
}

#[tokio::test]
async fn test_reads_map_to_monitor_types() {
    let addr = spawn_node(Arc::new(MockNode::default())).await;
    let client = client(addr);

    let chain = client.get_chain_state().await.unwrap();
    assert_eq!(chain.head_block_num, 1003);
    assert_eq!(chain.head_block_producer, "otherprod");

    let producers = client.get_active_producers(21).await.unwrap();
    assert_eq!(producers.len(), 2);
    assert_eq!(producers[1].owner, "producer1");
    assert_eq!(producers[1].unpaid_blocks, 1200);
    assert!(producers[1].is_active);

    let schedule = ChainGateway::get_producer_schedule(&client).await.unwrap();
    assert_eq!(schedule.active[0].block_signing_key, DEV_PUB_K1);
    assert!(schedule.pending.is_empty());
    assert_eq!(schedule.proposed[0].block_signing_key, "PUB_K1_NEXT");
}

#[tokio::test]
async fn test_deregister_pushes_signed_transaction() {
    let node = Arc::new(MockNode::default());
    let addr = spawn_node(node.clone()).await;
    let client = client(addr);

    let tx = client.submit_deregister("producer1", "active").await.unwrap();
    assert_eq!(tx, "07f3ef0ade50071e84bb04772890257b29aa0f0b2d22502eaa394d3e0dc56d53");

    let blocks = node.block_requests.lock().unwrap().clone();
    assert_eq!(blocks, vec![json!({ "block_num_or_id": "1000" })]);

    let pushed = node.pushed.lock().unwrap().clone();
    assert_eq!(pushed.len(), 1);
    let body = &pushed[0];
    assert_eq!(body["compression"], json!(0));
    assert_eq!(body["packed_context_free_data"], json!(""));

    let packed_trx = body["packed_trx"].as_str().unwrap();
    assert_eq!(
        packed_trx,
        "3cf15365e80315cd5b0700000000010000000000ea3055000048f456a6eed40100000857219de8ad00000000a8ed32320800000857219de8ad00"
    );

    let signature = body["signatures"][0].as_str().unwrap();
    let (recovery_id, compact) = decode_signature(signature).unwrap();
    let recoverable =
        RecoverableSignature::from_compact(&compact, RecoveryId::from_i32(recovery_id).unwrap()).unwrap();
    let digest = signing_digest(&hex::decode(CHAIN_ID).unwrap(), &hex::decode(packed_trx).unwrap());
    let message = Message::from_digest_slice(&digest).unwrap();
    let recovered = Secp256k1::new().recover_ecdsa(&message, &recoverable).unwrap();
    assert_eq!(
        hex::encode(recovered.serialize()),
        "02c0ded2bc1f1305fb0faac5e6c03ee3a1924234985427b6167ca569d13df435cf"
    );
}

#[tokio::test]
async fn test_key_change_packs_regproducer() {
    let node = Arc::new(MockNode::default());
    let addr = spawn_node(node.clone()).await;
    let client = client(addr);

    let request = KeyChangeRequest {
        account: "producer1".to_string(),
        permission: "active".to_string(),
        location: 840,
        website: "https://producer1.example".to_string(),
        new_key: DEV_LEGACY.to_string(),
    };
    client.submit_key_change(&request).await.unwrap();

    let pushed = node.pushed.lock().unwrap().clone();
    let packed_trx = pushed[0]["packed_trx"].as_str().unwrap();
    let packed = hex::decode(packed_trx).unwrap();
    assert_eq!(
        hex::encode(Sha256::digest(&packed)),
        "839be500d9cd8d99d6ed38e2266d3187a0c421d317c7f240786fdc827438e328"
    );
}

#[tokio::test]
async fn test_rejected_push_surfaces_rpc_error() {
    let node = Arc::new(MockNode {
        reject_push: true,
        ..Default::default()
    });
    let addr = spawn_node(node).await;
    let client = client(addr);

    let err = client.submit_deregister("producer1", "active").await.unwrap_err();
    assert_eq!(
        err,
        GatewayError::Rpc {
            code: 500,
            message: "assertion failure with message: producer not found".to_string(),
        }
    );
}

#[tokio::test]
async fn test_invalid_key_is_not_submitted() {
    let node = Arc::new(MockNode::default());
    let addr = spawn_node(node.clone()).await;
    let client = client(addr);

    let request = KeyChangeRequest {
        account: "producer1".to_string(),
        permission: "active".to_string(),
        location: 0,
        website: String::new(),
        new_key: "PUB_K1_garbage".to_string(),
    };
    let err = client.submit_key_change(&request).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidRequest(_)), "{:?}", err);
    assert!(node.pushed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_node_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr).get_chain_state().await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
}

fn registration() -> ProducerRegistration {
    ProducerRegistration {
        account: "producer1".to_string(),
        permission: "active".to_string(),
        location: 0,
        website: String::new(),
    }
}

#[tokio::test]
async fn test_submission_spans_three_calls_on_a_slow_node() {
    let node = Arc::new(MockNode {
        latency: Some(Duration::from_millis(500)),
        ..Default::default()
    });
    let addr = spawn_node(node.clone()).await;
    let client = client(addr);
    let request_timeout = Duration::from_secs(1);

    // every single read fits the request timeout
    client.get_chain_state().await.unwrap();

    // get_info, get_block and push_transaction together do not
    let mut controller = FailoverController::new(registration(), request_timeout);
    let err = controller
        .execute(&client, &mut BackupKeyQueue::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MonitorError::Deregistration(GatewayError::Timeout { .. })));

    let mut controller = FailoverController::new(registration(), request_timeout * 3);
    let action = controller
        .execute(&client, &mut BackupKeyQueue::default())
        .await
        .unwrap();
    assert!(matches!(action, FailoverAction::Deregistered { abandoned_key: None, .. }));
    assert_eq!(node.pushed.lock().unwrap().len(), 1);
}
