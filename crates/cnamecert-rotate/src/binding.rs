//! Domain binding snapshot types and lookup

use chrono::{DateTime, Utc};

/// One custom-domain-to-bucket binding as reported by the control plane
///
/// Read-only snapshot, fetched fresh each run. Changes are expressed as
/// update requests sent back to the service, never by mutating this.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainBinding {
    /// The bound custom domain, e.g. "static.example.com"
    pub domain: String,

    /// Certificate currently attached to the binding, if any
    pub certificate: Option<CertificateInfo>,

    /// When the binding was last modified. Display-only metadata.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Certificate metadata embedded in a binding
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateInfo {
    /// Provider-assigned certificate id, e.g. "493****-cn-hangzhou"
    pub cert_id: String,

    /// Expiry in the provider's fixed textual format,
    /// e.g. "Jan 01 00:00:00 2000 GMT". Parsed lazily; see [`crate::expiry`].
    pub valid_end_date: String,

    /// Certificate status as reported by the provider
    pub status: Option<String>,

    /// Certificate fingerprint as reported by the provider
    pub fingerprint: Option<String>,
}

/// Find the binding whose domain equals `target` exactly
///
/// Case-sensitive full-string match, no wildcard or suffix matching.
/// Scans the entire list and returns the first match; `None` only after
/// every entry has been inspected.
pub fn find_binding<'a>(bindings: &'a [DomainBinding], target: &str) -> Option<&'a DomainBinding> {
    bindings.iter().find(|binding| binding.domain == target)
}
