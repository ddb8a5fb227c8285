// crates/policy-flow-server/src/lib.rs
// ============================================================================
// Module: Policy Flow Server
// Description: HTTP surface for policy lifecycle and execution.
// Purpose: Expose the Policy Flow control plane over axum.
// Dependencies: policy-flow-core, policy-flow-config, axum, tokio
// ============================================================================

//! ## Overview
//! The server crate exposes [`policy_flow_core::PolicyControlPlane`] over
//! HTTP. [`PolicyApi`] holds the transport-independent request handling and
//! [`PolicyServer`] wires it into axum routes. Every request is recorded by a
//! [`PolicyAuditSink`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod api;
pub mod audit;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use api::ApiResponse;
pub use api::PolicyApi;
pub use audit::AuditOutcome;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::PolicyAction;
pub use audit::PolicyAuditEvent;
pub use audit::PolicyAuditEventParams;
pub use audit::PolicyAuditSink;
pub use audit::StderrAuditSink;
pub use server::PolicyServer;
pub use server::ServerError;
