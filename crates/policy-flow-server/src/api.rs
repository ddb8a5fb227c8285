// crates/policy-flow-server/src/api.rs
// ============================================================================
// Module: Policy API
// Description: Transport-independent request handling for the policy API.
// Purpose: Map control-plane results onto HTTP status codes and JSON bodies.
// Dependencies: policy-flow-core, axum (status codes), serde_json
// ============================================================================

//! ## Overview
//! [`PolicyApi`] owns the control plane and the audit sink. Each method
//! handles one route synchronously and returns an [`ApiResponse`]; the axum
//! layer only extracts inputs and moves the call onto a blocking thread.
//! Every call records exactly one audit event.
//!
//! Failures map onto status codes by category: malformed or invalid
//! documents and binding mismatches are `400`, unknown policies `404`,
//! oversized bodies `413`, execution failures `422`, and store failures
//! `500`. Error bodies always
//! have the shape `{"error": message, "kind": label}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::http::StatusCode;
use policy_flow_core::ControlPlaneError;
use policy_flow_core::PolicyControlPlane;
use policy_flow_core::PolicyDraft;
use policy_flow_core::PolicyId;
use policy_flow_core::RawBindings;
use policy_flow_core::SharedPolicyStore;
use policy_flow_core::collect_bindings;
use serde_json::Value;
use serde_json::json;

use crate::audit::PolicyAction;
use crate::audit::PolicyAuditEvent;
use crate::audit::PolicyAuditEventParams;
use crate::audit::PolicyAuditSink;

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Status code and JSON body produced by an API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// JSON response body.
    pub body: Value,
}

impl ApiResponse {
    /// Builds a success response.
    const fn ok(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
        }
    }

    /// Builds an error response with the standard error body.
    #[must_use]
    pub fn error(status: StatusCode, message: &str, kind: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message, "kind": kind }),
        }
    }
}

/// Failure carried through a handler before it is rendered.
struct ApiFailure {
    /// Status code for the failure.
    status: StatusCode,
    /// Caller-facing message.
    message: String,
    /// Stable error kind label.
    kind: &'static str,
}

impl ApiFailure {
    /// Builds a failure from its parts.
    fn new(status: StatusCode, message: impl Into<String>, kind: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            kind,
        }
    }
}

impl From<ControlPlaneError> for ApiFailure {
    fn from(err: ControlPlaneError) -> Self {
        let kind = err.kind();
        match err {
            ControlPlaneError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "Policy not found", kind)
            }
            ControlPlaneError::Validation(_) | ControlPlaneError::Binding(_) => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string(), kind)
            }
            ControlPlaneError::Execution(_) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string(), kind)
            }
            ControlPlaneError::Store(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), kind)
            }
        }
    }
}

/// Successful handler result plus the step count for execution audits.
struct ApiSuccess {
    /// Response to return.
    response: ApiResponse,
    /// Transitions taken, for execute requests.
    steps: Option<usize>,
}

impl From<ApiResponse> for ApiSuccess {
    fn from(response: ApiResponse) -> Self {
        Self {
            response,
            steps: None,
        }
    }
}

// ============================================================================
// SECTION: Policy API
// ============================================================================

/// Synchronous policy API over a shared store.
pub struct PolicyApi {
    /// Control plane handling policy lifecycle and execution.
    control_plane: PolicyControlPlane<SharedPolicyStore>,
    /// Audit sink receiving one event per request.
    audit: Arc<dyn PolicyAuditSink>,
    /// Maximum accepted request body size in bytes.
    max_body_bytes: usize,
}

impl PolicyApi {
    /// Creates an API over the control plane.
    #[must_use]
    pub fn new(
        control_plane: PolicyControlPlane<SharedPolicyStore>,
        audit: Arc<dyn PolicyAuditSink>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            control_plane,
            audit,
            max_body_bytes,
        }
    }

    /// Returns the maximum accepted request body size.
    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Handles `GET /policies`.
    #[must_use]
    pub fn list_policies(&self) -> ApiResponse {
        let result = self.control_plane.list().map_err(ApiFailure::from).map(|ids| {
            let ids: Vec<&str> = ids.iter().map(PolicyId::as_str).collect();
            ApiSuccess::from(ApiResponse::ok(StatusCode::OK, json!({ "policies": ids })))
        });
        self.finish(PolicyAction::List, None, result)
    }

    /// Handles `POST /policies` with a raw JSON body.
    #[must_use]
    pub fn create_policy(&self, body: &[u8]) -> ApiResponse {
        let result = self.create_inner(body);
        let policy_id = match &result {
            Ok(success) => success.response.body["policy_id"].as_str().map(str::to_string),
            Err(_) => None,
        };
        self.finish(PolicyAction::Create, policy_id, result)
    }

    /// Handles `GET /policies/{id}`.
    #[must_use]
    pub fn get_policy(&self, id: &str) -> ApiResponse {
        let result = self.get_inner(&PolicyId::new(id));
        self.finish(PolicyAction::Get, Some(id.to_string()), result)
    }

    /// Handles `DELETE /policies/{id}`.
    #[must_use]
    pub fn delete_policy(&self, id: &str) -> ApiResponse {
        let result = self.control_plane.delete(&PolicyId::new(id)).map_err(ApiFailure::from).map(
            |()| {
                let message = format!("Policy {id} deleted successfully");
                ApiSuccess::from(ApiResponse::ok(StatusCode::OK, json!({ "message": message })))
            },
        );
        self.finish(PolicyAction::Delete, Some(id.to_string()), result)
    }

    /// Handles `POST /execute/{id}` with query-string bindings.
    #[must_use]
    pub fn execute_policy(&self, id: &str, bindings: &RawBindings) -> ApiResponse {
        let result = self.execute_inner(id, bindings);
        self.finish(PolicyAction::Execute, Some(id.to_string()), result)
    }

    /// Handles `POST /execute/{id}` with query pairs in request order.
    ///
    /// A variable named more than once is a binding error, never last-wins.
    #[must_use]
    pub fn execute_policy_pairs(&self, id: &str, pairs: Vec<(String, String)>) -> ApiResponse {
        let result = collect_bindings(pairs)
            .map_err(|err| ApiFailure::from(ControlPlaneError::from(err)))
            .and_then(|bindings| self.execute_inner(id, &bindings));
        self.finish(PolicyAction::Execute, Some(id.to_string()), result)
    }

    /// Renders and audits a request rejected before its inputs were read.
    #[must_use]
    pub fn reject(
        &self,
        action: PolicyAction,
        policy_id: Option<String>,
        status: StatusCode,
        message: &str,
        kind: &'static str,
    ) -> ApiResponse {
        self.finish(action, policy_id, Err(ApiFailure::new(status, message, kind)))
    }

    /// Executes a stored policy and keeps the step count for auditing.
    fn execute_inner(&self, id: &str, bindings: &RawBindings) -> Result<ApiSuccess, ApiFailure> {
        let outcome = self.control_plane.execute(&PolicyId::new(id), bindings)?;
        Ok(ApiSuccess {
            response: ApiResponse::ok(
                StatusCode::OK,
                json!({ "decision": outcome.decision.as_str() }),
            ),
            steps: Some(outcome.steps),
        })
    }

    /// Parses and stores a candidate policy.
    fn create_inner(&self, body: &[u8]) -> Result<ApiSuccess, ApiFailure> {
        if body.len() > self.max_body_bytes {
            return Err(ApiFailure::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "request body too large",
                "payload_too_large",
            ));
        }
        let draft: PolicyDraft = serde_json::from_slice(body).map_err(|_| {
            ApiFailure::new(StatusCode::BAD_REQUEST, "Invalid policy format", "invalid_policy_format")
        })?;
        let policy = self.control_plane.create(draft)?;
        let body = json!({
            "message": "Successfully created policy",
            "policy_id": policy.id.as_str(),
        });
        Ok(ApiResponse::ok(StatusCode::CREATED, body).into())
    }

    /// Loads a policy and renders it as JSON.
    fn get_inner(&self, id: &PolicyId) -> Result<ApiSuccess, ApiFailure> {
        let policy = self.control_plane.get(id)?;
        let body = serde_json::to_value(&policy).map_err(|_| {
            ApiFailure::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "policy serialization failed",
                "serialization",
            )
        })?;
        Ok(ApiResponse::ok(StatusCode::OK, body).into())
    }

    /// Records the audit event and renders the final response.
    fn finish(
        &self,
        action: PolicyAction,
        policy_id: Option<String>,
        result: Result<ApiSuccess, ApiFailure>,
    ) -> ApiResponse {
        let (response, error_kind, steps) = match result {
            Ok(success) => (success.response, None, success.steps),
            Err(failure) => (
                ApiResponse::error(failure.status, &failure.message, failure.kind),
                Some(failure.kind),
                None,
            ),
        };
        self.audit.record(&PolicyAuditEvent::new(PolicyAuditEventParams {
            action,
            policy_id,
            status: response.status.as_u16(),
            error_kind,
            steps,
        }));
        response
    }
}
