//! Minimal OSS control-plane client for bucket CNAME operations
//!
//! Covers exactly what certificate rotation needs: listing a bucket's
//! custom-domain bindings and submitting a certificate update for one of
//! them, with OSS V4 request signing. Implements
//! [`cnamecert_rotate::ControlPlane`] so the rotation driver stays
//! independent of the wire details.

pub mod auth;
pub mod client;
pub mod types;

pub use auth::Credentials;
pub use client::{OssClient, OssConfig, OssError};
pub use types::{
    BucketCnameConfiguration, CertificateConfiguration, CnameCertificate, CnameConfiguration,
    CnameRecord, ListCnameResult,
};
