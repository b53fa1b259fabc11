//! XML wire types for the bucket CNAME operations
//!
//! Shapes follow the OSS control-plane API: `ListCnameResult` comes back
//! from `GET ?cname`, `BucketCnameConfiguration` goes out with
//! `POST ?cname&comp=add`, and failures arrive as an `<Error>` body.

use chrono::{DateTime, Utc};
use cnamecert_rotate::{CertificateInfo, DomainBinding, RotationRequest};
use serde::{Deserialize, Serialize};

/// Response body of the list-cname operation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "ListCnameResult", rename_all = "PascalCase")]
pub struct ListCnameResult {
    pub bucket: Option<String>,
    pub owner: Option<String>,
    #[serde(default)]
    pub cname: Vec<CnameRecord>,
}

/// One custom-domain binding entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CnameRecord {
    pub domain: String,
    pub last_modified: Option<String>,
    pub status: Option<String>,
    pub certificate: Option<CnameCertificate>,
}

/// Certificate metadata attached to a binding
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CnameCertificate {
    #[serde(rename = "Type")]
    pub cert_type: Option<String>,
    pub cert_id: String,
    pub status: Option<String>,
    pub creation_date: Option<String>,
    pub fingerprint: Option<String>,
    pub valid_start_date: Option<String>,
    pub valid_end_date: Option<String>,
}

/// Request body of the put-cname operation
#[derive(Debug, Clone, Serialize)]
#[serde(rename = "BucketCnameConfiguration", rename_all = "PascalCase")]
pub struct BucketCnameConfiguration {
    pub cname: CnameConfiguration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CnameConfiguration {
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_configuration: Option<CertificateConfiguration>,
}

/// Certificate upload carried by a put-cname request
///
/// Always carries fresh material. `previous_cert_id` is the advisory
/// lineage reference; there is intentionally no direct `CertId` field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CertificateConfiguration {
    pub certificate: String,
    pub private_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_cert_id: Option<String>,
    pub force: bool,
}

/// Error body returned by the service on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "Error", rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

impl From<CnameRecord> for DomainBinding {
    fn from(record: CnameRecord) -> Self {
        // last_modified is display-only metadata, parsed leniently;
        // valid_end_date stays textual and gets the fail-loud parse in
        // the rotation core.
        let last_modified = record
            .last_modified
            .as_deref()
            .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
            .map(|value| value.with_timezone(&Utc));

        DomainBinding {
            domain: record.domain,
            certificate: record.certificate.map(|certificate| CertificateInfo {
                cert_id: certificate.cert_id,
                valid_end_date: certificate.valid_end_date.unwrap_or_default(),
                status: certificate.status,
                fingerprint: certificate.fingerprint,
            }),
            last_modified,
        }
    }
}

impl From<RotationRequest> for BucketCnameConfiguration {
    fn from(request: RotationRequest) -> Self {
        BucketCnameConfiguration {
            cname: CnameConfiguration {
                domain: request.domain,
                certificate_configuration: Some(CertificateConfiguration {
                    certificate: request.certificate_pem,
                    private_key: request.private_key_pem,
                    previous_cert_id: request.previous_cert_id,
                    force: request.force,
                }),
            },
        }
    }
}
