//! Certificate rotation logic for custom-domain bucket bindings
//!
//! Decides, per domain, whether the certificate currently bound to a
//! bucket CNAME needs to be replaced, and drives the single update call
//! against the storage control plane through the [`ControlPlane`] trait.

pub mod binding;
pub mod error;
pub mod expiry;
pub mod rotation;
pub mod runner;

pub use binding::{find_binding, CertificateInfo, DomainBinding};
pub use error::{ControlPlaneError, RotationError};
pub use expiry::needs_new_certificate;
pub use rotation::{plan_rotation, RotationRequest};
pub use runner::{rotate_domain, ControlPlane, RotationOutcome};
