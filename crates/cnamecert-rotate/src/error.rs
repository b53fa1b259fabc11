//! Error types for the rotation pipeline

use thiserror::Error;

/// Errors surfaced by the storage control plane
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// Network-level failure: connect, timeout, TLS, malformed response
    #[error("control plane request failed: {0}")]
    Transport(String),

    /// Error reported by the service itself
    #[error("control plane rejected request: {code}: {message} (status {status})")]
    Service {
        status: u16,
        code: String,
        message: String,
    },
}

/// Errors from the rotation decision and execution path
///
/// Every variant is fatal for the run: a missing binding or empty
/// certificate material is a correctness problem, not a condition to
/// skip over.
#[derive(Debug, Error)]
pub enum RotationError {
    /// No binding in the bucket's list matches the configured domain exactly
    #[error("no binding found for domain '{0}'")]
    BindingNotFound(String),

    /// Private key or certificate content is empty
    #[error("empty {material} material for domain '{domain}'")]
    EmptyMaterial {
        domain: String,
        material: &'static str,
    },

    /// The expiry reported by the control plane does not match the
    /// expected "Mon DD HH:MM:SS YYYY GMT" format. Never treated as
    /// either expired or valid.
    #[error("unparseable certificate expiry '{value}'")]
    ExpiryParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error(transparent)]
    ControlPlane(#[from] ControlPlaneError),
}
