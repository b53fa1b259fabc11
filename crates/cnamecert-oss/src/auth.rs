//! OSS V4 request signing (OSS4-HMAC-SHA256)
//!
//! Builds the `Authorization` header for control-plane calls: canonical
//! request over method, resource, query and signed headers, a scoped
//! signing key derived from the access-key secret, and a hex-encoded
//! HMAC-SHA256 signature. The payload is signed as UNSIGNED-PAYLOAD.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Signature algorithm identifier in the Authorization header
const ALGORITHM: &str = "OSS4-HMAC-SHA256";

/// Terminator of the credential scope
const REQUEST_SUFFIX: &str = "aliyun_v4_request";

/// Value signed in place of the request body hash
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Shared access-key credentials, read-only for the duration of a run
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

/// The parts of a bucket-level request that take part in signing
pub(crate) struct SignableRequest<'a> {
    pub method: &'a str,
    pub bucket: &'a str,
    /// Query parameters; an empty value means a bare subresource key
    pub query: &'a [(String, String)],
    /// Lowercased header name to value. Every x-oss-* header that will
    /// be sent must be present here.
    pub headers: &'a BTreeMap<String, String>,
}

/// Compute the Authorization header value for a request at instant `time`
pub(crate) fn authorization(
    credentials: &Credentials,
    region: &str,
    time: DateTime<Utc>,
    request: &SignableRequest<'_>,
) -> String {
    let date = time.format("%Y%m%d").to_string();
    let date_time = time.format("%Y%m%dT%H%M%SZ").to_string();
    let scope = format!("{date}/{region}/oss/{REQUEST_SUFFIX}");

    let canonical = canonical_request(request);
    let string_to_sign = format!(
        "{ALGORITHM}\n{date_time}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical.as_bytes()))
    );

    let signature = hex::encode(hmac_sha256(
        &signing_key(&credentials.access_key_secret, &date, region),
        string_to_sign.as_bytes(),
    ));

    format!(
        "{ALGORITHM} Credential={}/{scope},Signature={signature}",
        credentials.access_key_id
    )
}

/// Derive the scoped signing key: secret -> date -> region -> "oss" -> terminator
fn signing_key(secret: &str, date: &str, region: &str) -> Vec<u8> {
    let key = hmac_sha256(format!("aliyun_v4{secret}").as_bytes(), date.as_bytes());
    let key = hmac_sha256(&key, region.as_bytes());
    let key = hmac_sha256(&key, b"oss");
    hmac_sha256(&key, REQUEST_SUFFIX.as_bytes())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

pub(crate) fn canonical_request(request: &SignableRequest<'_>) -> String {
    // Bucket-level operation, virtual-host addressing
    let canonical_uri = format!("/{}/", request.bucket);

    let canonical_headers: String = request
        .headers
        .iter()
        .filter(|(name, _)| is_signed_header(name))
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();

    let payload = request
        .headers
        .get("x-oss-content-sha256")
        .map(String::as_str)
        .unwrap_or(UNSIGNED_PAYLOAD);

    // No additional signed headers, hence the empty section
    format!(
        "{}\n{}\n{}\n{}\n\n{}",
        request.method,
        canonical_uri,
        canonical_query(request.query),
        canonical_headers,
        payload
    )
}

fn is_signed_header(name: &str) -> bool {
    name == "content-type" || name == "content-md5" || name.starts_with("x-oss-")
}

/// Sorted, percent-encoded query string; subresources without a value
/// appear as the bare key
pub(crate) fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs: Vec<_> = query.iter().collect();
    pairs.sort();

    pairs
        .iter()
        .map(|(key, value)| {
            if value.is_empty() {
                urlencoding::encode(key).into_owned()
            } else {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credentials() -> Credentials {
        Credentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            access_key_secret: "secret".to_string(),
        }
    }

    fn signing_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn base_headers() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("x-oss-date".to_string(), "20240101T000000Z".to_string()),
            (
                "x-oss-content-sha256".to_string(),
                UNSIGNED_PAYLOAD.to_string(),
            ),
        ])
    }

    #[test]
    fn test_canonical_query_sorts_and_encodes() {
        let query = vec![
            ("comp".to_string(), "add".to_string()),
            ("cname".to_string(), String::new()),
        ];
        assert_eq!(canonical_query(&query), "cname&comp=add");

        let query = vec![("key".to_string(), "a b/c".to_string())];
        assert_eq!(canonical_query(&query), "key=a%20b%2Fc");

        assert_eq!(canonical_query(&[]), "");
    }

    #[test]
    fn test_canonical_request_shape() {
        let headers = base_headers();
        let query = vec![("cname".to_string(), String::new())];
        let request = SignableRequest {
            method: "GET",
            bucket: "my-bucket",
            query: &query,
            headers: &headers,
        };

        let expected = "GET\n\
                        /my-bucket/\n\
                        cname\n\
                        x-oss-content-sha256:UNSIGNED-PAYLOAD\n\
                        x-oss-date:20240101T000000Z\n\
                        \n\
                        UNSIGNED-PAYLOAD";
        assert_eq!(canonical_request(&request), expected);
    }

    #[test]
    fn test_canonical_request_ignores_unsigned_headers() {
        let mut headers = base_headers();
        headers.insert("user-agent".to_string(), "cnamecert".to_string());
        let query = vec![];
        let request = SignableRequest {
            method: "GET",
            bucket: "b",
            query: &query,
            headers: &headers,
        };

        assert!(!canonical_request(&request).contains("user-agent"));
    }

    #[test]
    fn test_authorization_shape() {
        let headers = base_headers();
        let query = vec![("cname".to_string(), String::new())];
        let request = SignableRequest {
            method: "GET",
            bucket: "my-bucket",
            query: &query,
            headers: &headers,
        };

        let value = authorization(&credentials(), "cn-hangzhou", signing_time(), &request);

        let prefix =
            "OSS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240101/cn-hangzhou/oss/aliyun_v4_request,Signature=";
        assert!(value.starts_with(prefix), "unexpected header: {value}");

        let signature = &value[prefix.len()..];
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_is_deterministic_and_scoped() {
        let headers = base_headers();
        let query = vec![("cname".to_string(), String::new())];
        let request = SignableRequest {
            method: "GET",
            bucket: "my-bucket",
            query: &query,
            headers: &headers,
        };

        let a = authorization(&credentials(), "cn-hangzhou", signing_time(), &request);
        let b = authorization(&credentials(), "cn-hangzhou", signing_time(), &request);
        assert_eq!(a, b);

        let other_region = authorization(&credentials(), "cn-beijing", signing_time(), &request);
        assert_ne!(a, other_region);
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            access_key_secret: "kSJeKx91Ab".to_string(),
        };

        let formatted = format!("{creds:?}");
        assert!(formatted.contains("AKIDEXAMPLE"));
        assert!(!formatted.contains("kSJeKx91Ab"));
        assert!(formatted.contains("<redacted>"));
    }
}
