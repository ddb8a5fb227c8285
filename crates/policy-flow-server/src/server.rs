// crates/policy-flow-server/src/server.rs
// ============================================================================
// Module: Policy HTTP Server
// Description: axum routes over the policy API.
// Purpose: Serve policy lifecycle and execution over HTTP.
// Dependencies: policy-flow-config, policy-flow-store-sqlite, axum, tokio
// ============================================================================

//! ## Overview
//! [`PolicyServer`] builds the store, audit sink, and [`PolicyApi`] from a
//! validated [`PolicyFlowConfig`] and serves them with axum. Handlers extract
//! path, query, and body inputs and run the synchronous API call on the
//! blocking pool so store I/O never stalls the async runtime. Extraction
//! failures, including bodies over the configured limit, are rendered and
//! audited by the API like any other failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::Path as FsPath;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use policy_flow_config::AuditConfig;
use policy_flow_config::AuditSinkKind;
use policy_flow_config::PolicyFlowConfig;
use policy_flow_config::StoreConfig;
use policy_flow_config::StoreType;
use policy_flow_core::InMemoryPolicyStore;
use policy_flow_core::PolicyControlPlane;
use policy_flow_core::SharedPolicyStore;
use policy_flow_store_sqlite::SqlitePolicyStore;
use tokio::net::TcpListener;

use crate::api::ApiResponse;
use crate::api::PolicyApi;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::PolicyAction;
use crate::audit::PolicyAuditSink;
use crate::audit::StderrAuditSink;

// ============================================================================
// SECTION: Policy Server
// ============================================================================

/// HTTP server instance.
pub struct PolicyServer {
    /// Validated configuration.
    config: PolicyFlowConfig,
    /// Shared API handling every route.
    api: Arc<PolicyApi>,
}

impl PolicyServer {
    /// Builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when validation or initialization fails.
    pub fn from_config(config: PolicyFlowConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let store = build_policy_store(&config.store)?;
        let audit = build_audit_sink(&config.audit)?;
        let control_plane = PolicyControlPlane::new(store, config.execution.limits());
        let api = PolicyApi::new(control_plane, audit, config.server.max_body_bytes);
        Ok(Self {
            config,
            api: Arc::new(api),
        })
    }

    /// Returns the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ServerError> {
        self.config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))
    }

    /// Builds the axum router for the policy API.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.api))
    }

    /// Binds the configured address and serves until the task is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr = self.bind_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        self.serve_listener(listener).await
    }

    /// Serves on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when the server fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let app = self.router();
        axum::serve(listener, app)
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the policy store selected by configuration.
fn build_policy_store(config: &StoreConfig) -> Result<SharedPolicyStore, ServerError> {
    let store = match config.store_type {
        StoreType::Memory => SharedPolicyStore::from_store(InMemoryPolicyStore::new()),
        StoreType::Sqlite => {
            let sqlite_config = config
                .sqlite_config()
                .ok_or_else(|| ServerError::Config("sqlite store requires path".to_string()))?;
            let store = SqlitePolicyStore::new(&sqlite_config)
                .map_err(|err| ServerError::Init(err.to_string()))?;
            SharedPolicyStore::from_store(store)
        }
    };
    Ok(store)
}

/// Builds the audit sink selected by configuration.
fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn PolicyAuditSink>, ServerError> {
    match config.sink {
        AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
        AuditSinkKind::None => Ok(Arc::new(NoopAuditSink)),
        AuditSinkKind::File => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| ServerError::Config("file audit sink requires path".to_string()))?;
            let sink = FileAuditSink::new(FsPath::new(path))
                .map_err(|err| ServerError::Init(format!("audit log open failed: {err}")))?;
            Ok(Arc::new(sink))
        }
    }
}

// ============================================================================
// SECTION: Routing
// ============================================================================

/// Builds the router over a shared API.
fn build_router(api: Arc<PolicyApi>) -> Router {
    let body_limit = api.max_body_bytes();
    Router::new()
        .route("/policies", get(list_policies).post(create_policy))
        .route("/policies/{id}", get(get_policy).delete(delete_policy))
        .route("/execute/{id}", post(execute_policy))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(api)
}

/// Handles `GET /policies`.
async fn list_policies(State(api): State<Arc<PolicyApi>>) -> Response {
    run_blocking(api, PolicyApi::list_policies).await
}

/// Handles `POST /policies`.
async fn create_policy(
    State(api): State<Arc<PolicyApi>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match body {
        Ok(body) => run_blocking(api, move |api| api.create_policy(&body)).await,
        Err(rejection) => {
            let (status, message, kind) = body_failure(&rejection);
            run_blocking(api, move |api| {
                api.reject(PolicyAction::Create, None, status, message, kind)
            })
            .await
        }
    }
}

/// Handles `GET /policies/{id}`.
async fn get_policy(State(api): State<Arc<PolicyApi>>, Path(id): Path<String>) -> Response {
    run_blocking(api, move |api| api.get_policy(&id)).await
}

/// Handles `DELETE /policies/{id}`.
async fn delete_policy(State(api): State<Arc<PolicyApi>>, Path(id): Path<String>) -> Response {
    run_blocking(api, move |api| api.delete_policy(&id)).await
}

/// Handles `POST /execute/{id}?name=value&...`.
async fn execute_policy(
    State(api): State<Arc<PolicyApi>>,
    Path(id): Path<String>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(pairs)) => {
            run_blocking(api, move |api| api.execute_policy_pairs(&id, pairs)).await
        }
        Err(_) => {
            run_blocking(api, move |api| {
                api.reject(
                    PolicyAction::Execute,
                    Some(id),
                    StatusCode::BAD_REQUEST,
                    "query string could not be decoded",
                    "invalid_query",
                )
            })
            .await
        }
    }
}

/// Maps a body extraction failure onto the standard error fields.
fn body_failure(rejection: &BytesRejection) -> (StatusCode, &'static str, &'static str) {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        (StatusCode::PAYLOAD_TOO_LARGE, "request body too large", "payload_too_large")
    } else {
        (StatusCode::BAD_REQUEST, "request body could not be read", "invalid_request_body")
    }
}

/// Runs an API call on the blocking pool and renders the result.
async fn run_blocking<F>(api: Arc<PolicyApi>, call: F) -> Response
where
    F: FnOnce(&PolicyApi) -> ApiResponse + Send + 'static,
{
    let response = tokio::task::spawn_blocking(move || call(&api)).await.unwrap_or_else(|_| {
        ApiResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "request task failed", "internal")
    });
    (response.status, axum::Json(response.body)).into_response()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests;
