// crates/policy-flow-server/src/audit.rs
// ============================================================================
// Module: Policy Audit Logging
// Description: Structured audit events for policy HTTP requests.
// Purpose: Emit JSON-lines audit records without logging variable values.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every API request produces one [`PolicyAuditEvent`]. Sinks serialize the
//! event as a single JSON line. Events carry identifiers, status codes, and
//! error kinds only; supplied variable values never reach a sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// API action recorded by an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    /// `POST /policies`.
    Create,
    /// `GET /policies`.
    List,
    /// `GET /policies/{id}`.
    Get,
    /// `DELETE /policies/{id}`.
    Delete,
    /// `POST /execute/{id}`.
    Execute,
}

/// Request outcome recorded by an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The request succeeded.
    Success,
    /// The request failed.
    Error,
}

/// Audit event for a policy API request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyAuditEvent {
    /// Event type identifier.
    pub event: &'static str,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u128,
    /// Requested action.
    pub action: PolicyAction,
    /// Policy identifier when the request targets one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    /// Success or failure.
    pub outcome: AuditOutcome,
    /// HTTP status code returned to the caller.
    pub status: u16,
    /// Stable error kind label on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    /// Transitions taken by a successful execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<usize>,
}

/// Inputs used to build a [`PolicyAuditEvent`].
#[derive(Debug, Clone)]
pub struct PolicyAuditEventParams {
    /// Requested action.
    pub action: PolicyAction,
    /// Policy identifier when the request targets one.
    pub policy_id: Option<String>,
    /// HTTP status code returned to the caller.
    pub status: u16,
    /// Stable error kind label on failure.
    pub error_kind: Option<&'static str>,
    /// Transitions taken by a successful execution.
    pub steps: Option<usize>,
}

impl PolicyAuditEvent {
    /// Builds an audit event stamped with the current time.
    ///
    /// The outcome is `error` exactly when an error kind is present.
    #[must_use]
    pub fn new(params: PolicyAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        let outcome =
            if params.error_kind.is_some() { AuditOutcome::Error } else { AuditOutcome::Success };
        Self {
            event: "policy_request",
            timestamp_ms,
            action: params.action,
            policy_id: params.policy_id,
            outcome,
            status: params.status,
            error_kind: params.error_kind,
            steps: params.steps,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for policy API events.
pub trait PolicyAuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: &PolicyAuditEvent);
}

/// Audit sink that writes JSON lines to stderr.
pub struct StderrAuditSink;

impl PolicyAuditSink for StderrAuditSink {
    fn record(&self, event: &PolicyAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// Append-mode file handle.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens (or creates) the audit log in append mode.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl PolicyAuditSink for FileAuditSink {
    fn record(&self, event: &PolicyAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Audit sink that drops events.
pub struct NoopAuditSink;

impl PolicyAuditSink for NoopAuditSink {
    fn record(&self, _event: &PolicyAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
