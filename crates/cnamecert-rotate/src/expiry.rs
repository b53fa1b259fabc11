//! Certificate freshness decision
//!
//! The control plane reports certificate expiry as a fixed textual
//! timestamp like "Jan 01 00:00:00 2000 GMT", always UTC. Both sides of
//! the comparison are `DateTime<Utc>` so a naive-vs-aware mixup cannot
//! compile.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::binding::DomainBinding;
use crate::error::RotationError;

/// Expiry format used by the control plane, e.g. "Jan 01 00:00:00 2000 GMT"
const VALID_END_DATE_FORMAT: &str = "%b %d %H:%M:%S %Y GMT";

/// Parse a control-plane expiry string as a UTC instant
///
/// A string that doesn't match the format is an error, never a default
/// answer in either direction.
pub fn parse_valid_end_date(value: &str) -> Result<DateTime<Utc>, RotationError> {
    NaiveDateTime::parse_from_str(value, VALID_END_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| RotationError::ExpiryParse {
            value: value.to_string(),
            source,
        })
}

/// Decide whether the binding needs a new certificate at instant `now`
///
/// - No certificate attached: a new one must be created.
/// - Certificate expired at or before `now`: a new one must be created.
/// - Certificate expires strictly after `now`: still valid, rotate in
///   place with a lineage reference instead.
pub fn needs_new_certificate(
    binding: &DomainBinding,
    now: DateTime<Utc>,
) -> Result<bool, RotationError> {
    let Some(certificate) = &binding.certificate else {
        return Ok(true);
    };

    let valid_end = parse_valid_end_date(&certificate.valid_end_date)?;
    Ok(valid_end <= now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::CertificateInfo;
    use chrono::TimeZone;

    fn binding_with_expiry(valid_end_date: &str) -> DomainBinding {
        DomainBinding {
            domain: "cdn.example.com".to_string(),
            certificate: Some(CertificateInfo {
                cert_id: "cert-1".to_string(),
                valid_end_date: valid_end_date.to_string(),
                status: None,
                fingerprint: None,
            }),
            last_modified: None,
        }
    }

    fn now_2024() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_valid_end_date() {
        let parsed = parse_valid_end_date("Jan 01 00:00:00 2000 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap());

        let parsed = parse_valid_end_date("Dec 31 23:59:59 2030 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2030, 12, 31, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_parse_rejects_malformed_strings() {
        for value in [
            "",
            "not a date",
            "2024-01-01T00:00:00Z",
            "Jan 01 00:00:00 2000",
            "Jan 01 00:00:00 2000 UTC",
            "Foo 01 00:00:00 2000 GMT",
        ] {
            let err = parse_valid_end_date(value).unwrap_err();
            assert!(
                matches!(err, RotationError::ExpiryParse { .. }),
                "expected parse error for {value:?}"
            );
        }
    }

    #[test]
    fn test_no_certificate_needs_new() {
        let binding = DomainBinding {
            domain: "cdn.example.com".to_string(),
            certificate: None,
            last_modified: None,
        };
        assert!(needs_new_certificate(&binding, now_2024()).unwrap());
    }

    #[test]
    fn test_expired_certificate_needs_new() {
        let binding = binding_with_expiry("Jan 01 00:00:00 2000 GMT");
        assert!(needs_new_certificate(&binding, now_2024()).unwrap());
    }

    #[test]
    fn test_valid_certificate_does_not_need_new() {
        let binding = binding_with_expiry("Jan 01 00:00:00 2999 GMT");
        assert!(!needs_new_certificate(&binding, now_2024()).unwrap());
    }

    #[test]
    fn test_expiry_exactly_at_now_needs_new() {
        // Expiry at `now` counts as expired, only a strictly later
        // expiry keeps the certificate.
        let binding = binding_with_expiry("Jan 01 00:00:00 2024 GMT");
        assert!(needs_new_certificate(&binding, now_2024()).unwrap());

        let binding = binding_with_expiry("Jan 01 00:00:01 2024 GMT");
        assert!(!needs_new_certificate(&binding, now_2024()).unwrap());
    }

    #[test]
    fn test_malformed_expiry_is_an_error_not_a_default() {
        let binding = binding_with_expiry("garbage");
        let err = needs_new_certificate(&binding, now_2024()).unwrap_err();
        assert!(matches!(err, RotationError::ExpiryParse { .. }));
    }
}
