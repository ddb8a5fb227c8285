// crates/policy-flow-server/src/server/tests.rs
// ============================================================================
// Module: Policy Server Unit Tests
// Description: Unit tests for routing, handlers, and server construction.
// Purpose: Validate the HTTP layer with in-memory fixtures.
// Dependencies: policy-flow-server, tokio
// ============================================================================

//! ## Overview
//! Drives the axum handlers directly and over a loopback socket, and checks
//! how configuration selects the store and audit sink.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only handler assertions."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use policy_flow_config::PolicyFlowConfig;
use policy_flow_core::ExecutionLimits;
use policy_flow_core::InMemoryPolicyStore;
use policy_flow_core::PolicyControlPlane;
use policy_flow_core::SharedPolicyStore;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;

use super::PolicyServer;
use super::ServerError;
use super::create_policy;
use super::delete_policy;
use super::execute_policy;
use super::get_policy;
use super::list_policies;
use crate::api::PolicyApi;
use crate::audit::NoopAuditSink;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn api_state() -> State<Arc<PolicyApi>> {
    let control_plane = PolicyControlPlane::new(
        SharedPolicyStore::from_store(InMemoryPolicyStore::new()),
        ExecutionLimits::default(),
    );
    State(Arc::new(PolicyApi::new(control_plane, Arc::new(NoopAuditSink), 1024 * 1024)))
}

fn age_gate_body() -> Bytes {
    Bytes::from(
        json!({
            "name": "age gate",
            "variables": ["age"],
            "blocks": {
                "1": {"block_type": "StartBlock", "next_block": "2"},
                "2": {"block_type": "ConditionalBlock", "variable": "age", "operator": ">=",
                      "cmp_value": "18", "true_branch": "3", "false_branch": "4"},
                "3": {"block_type": "EndBlock", "decision_value": "Approved"},
                "4": {"block_type": "EndBlock", "decision_value": "Denied"}
            }
        })
        .to_string(),
    )
}

async fn read_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn config_from(toml_str: &str) -> PolicyFlowConfig {
    PolicyFlowConfig::from_bytes(toml_str.as_bytes()).unwrap()
}

// ============================================================================
// SECTION: Handler Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn handlers_cover_policy_lifecycle() {
    let state = api_state();
    let (status, created) = read_json(create_policy(state.clone(), Ok(age_gate_body())).await).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "Successfully created policy");
    let id = created["policy_id"].as_str().unwrap().to_string();

    let (status, listed) = read_json(list_policies(state.clone()).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!({ "policies": [id.clone()] }));

    let (status, fetched) = read_json(get_policy(state.clone(), Path(id.clone())).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id.as_str());
    assert_eq!(fetched["blocks"]["3"]["decision_value"], "Approved");

    let pairs = vec![("age".to_string(), "30".to_string())];
    let (status, decision) =
        read_json(execute_policy(state.clone(), Path(id.clone()), Ok(Query(pairs))).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decision, json!({ "decision": "Approved" }));

    let (status, deleted) = read_json(delete_policy(state.clone(), Path(id.clone())).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["message"], format!("Policy {id} deleted successfully"));

    let (status, missing) = read_json(get_policy(state, Path(id)).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"], "Policy not found");
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_body_is_bad_request() {
    let state = api_state();
    let (status, body) =
        read_json(create_policy(state, Ok(Bytes::from_static(b"{not json"))).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid policy format");
    assert_eq!(body["kind"], "invalid_policy_format");
}

#[tokio::test(flavor = "multi_thread")]
async fn routes_serve_over_loopback() {
    let server = PolicyServer::from_config(config_from("[audit]\nsink = \"none\"\n")).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(server.serve_listener(listener));

    let body = String::from_utf8(age_gate_body().to_vec()).unwrap();
    let (status, created) = send(addr, "POST", "/policies", &body).await;
    assert_eq!(status, 201);
    let id = created["policy_id"].as_str().unwrap().to_string();

    let (status, decision) = send(addr, "POST", &format!("/execute/{id}?age=12"), "").await;
    assert_eq!(status, 200);
    assert_eq!(decision["decision"], "Denied");

    let (status, error) = send(addr, "POST", &format!("/execute/{id}"), "").await;
    assert_eq!(status, 400);
    assert_eq!(error["kind"], "missing_variable");

    handle.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_body_gets_json_error_and_audit_event() {
    let temp = TempDir::new().unwrap();
    let audit = temp.path().join("audit.jsonl");
    let config = config_from(&format!(
        "[server]\nmax_body_bytes = 64\n\n[audit]\nsink = \"file\"\npath = {audit:?}\n"
    ));
    let server = PolicyServer::from_config(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(server.serve_listener(listener));

    let body = format!("{{\"name\": \"{}\"}}", "x".repeat(200));
    let (head, payload) = send_raw(addr, "POST", "/policies", &body).await;
    assert!(head.starts_with("HTTP/1.1 413"), "{head}");
    assert!(head.to_ascii_lowercase().contains("content-type: application/json"), "{head}");
    let payload: Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(
        payload,
        json!({ "error": "request body too large", "kind": "payload_too_large" })
    );
    handle.abort();

    let lines = std::fs::read_to_string(&audit).unwrap();
    let event: Value = serde_json::from_str(lines.lines().last().unwrap()).unwrap();
    assert_eq!(event["action"], "create");
    assert_eq!(event["status"], 413);
    assert_eq!(event["error_kind"], "payload_too_large");
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_query_variable_is_rejected() {
    let server = PolicyServer::from_config(config_from("[audit]\nsink = \"none\"\n")).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(server.serve_listener(listener));

    let body = String::from_utf8(age_gate_body().to_vec()).unwrap();
    let (_, created) = send(addr, "POST", "/policies", &body).await;
    let id = created["policy_id"].as_str().unwrap().to_string();

    let (status, error) = send(addr, "POST", &format!("/execute/{id}?age=30&age=12"), "").await;
    assert_eq!(status, 400);
    assert_eq!(error["kind"], "duplicate_variable");
    assert_eq!(error["error"], "variable(s) 'age' supplied more than once");

    handle.abort();
}

async fn send(addr: std::net::SocketAddr, method: &str, path: &str, body: &str) -> (u16, Value) {
    let (head, payload) = send_raw(addr, method, path, body).await;
    let status = head.split_whitespace().nth(1).unwrap().parse().unwrap();
    (status, serde_json::from_str(&payload).unwrap())
}

async fn send_raw(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    body: &str,
) -> (String, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8(raw).unwrap();
    let (head, payload) = text.split_once("\r\n\r\n").unwrap();
    (head.to_string(), payload.to_string())
}

// ============================================================================
// SECTION: Construction Tests
// ============================================================================

#[test]
fn sqlite_store_and_file_audit_are_built_from_config() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("policies.db");
    let audit = temp.path().join("audit.jsonl");
    let config = config_from(&format!(
        "[store]\ntype = \"sqlite\"\npath = {db:?}\n\n[audit]\nsink = \"file\"\npath = {audit:?}\n"
    ));
    let server = PolicyServer::from_config(config).unwrap();
    assert_eq!(server.bind_addr().unwrap().port(), 8080);
    assert!(db.exists());
    assert!(audit.exists());
}

#[test]
fn unopenable_audit_log_fails_init() {
    let temp = TempDir::new().unwrap();
    let audit = temp.path().join("missing").join("audit.jsonl");
    let config = config_from(&format!("[audit]\nsink = \"file\"\npath = {audit:?}\n"));
    let result = PolicyServer::from_config(config);
    assert!(matches!(result, Err(ServerError::Init(message)) if message.contains("audit")));
}
