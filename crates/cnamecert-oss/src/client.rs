//! OSS control-plane client bound to a single bucket

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cnamecert_rotate::{ControlPlane, ControlPlaneError, DomainBinding, RotationRequest};
use reqwest::{Method, Url};
use thiserror::Error;
use tracing::debug;

use crate::auth::{self, Credentials, SignableRequest, UNSIGNED_PAYLOAD};
use crate::types::{BucketCnameConfiguration, ErrorResponse, ListCnameResult};

/// Client errors
#[derive(Debug, Error)]
pub enum OssError {
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Error reported by the service, parsed from its XML error body
    #[error("{code}: {message} (status {status}, request id {request_id:?})")]
    Service {
        status: u16,
        code: String,
        message: String,
        request_id: Option<String>,
    },

    #[error("xml error: {0}")]
    Xml(String),
}

/// Connection settings for one bucket
#[derive(Debug, Clone)]
pub struct OssConfig {
    /// Control-plane endpoint, e.g. "https://oss-cn-hangzhou.aliyuncs.com"
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub credentials: Credentials,
}

/// Control-plane client for one bucket's CNAME operations
///
/// Addresses the bucket virtual-host style and signs every request with
/// the shared credentials. Holds no state beyond the connection settings.
#[derive(Debug)]
pub struct OssClient {
    http: reqwest::Client,
    scheme: String,
    host: String,
    bucket: String,
    region: String,
    credentials: Credentials,
}

impl OssClient {
    pub fn new(config: OssConfig) -> Result<Self, OssError> {
        // Accept endpoints with or without an explicit scheme
        let endpoint = config.endpoint.trim();
        let endpoint = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("https://{endpoint}")
        };

        let url = Url::parse(&endpoint)
            .map_err(|_| OssError::InvalidEndpoint(config.endpoint.clone()))?;
        let endpoint_host = url
            .host_str()
            .ok_or_else(|| OssError::InvalidEndpoint(config.endpoint.clone()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            scheme: url.scheme().to_string(),
            host: format!("{}.{}", config.bucket, endpoint_host),
            bucket: config.bucket,
            region: config.region,
            credentials: config.credentials,
        })
    }

    /// Fetch the bucket's custom-domain bindings (`GET ?cname`)
    pub async fn list_bucket_cname(&self) -> Result<ListCnameResult, OssError> {
        let query = vec![("cname".to_string(), String::new())];
        let body = self.send(Method::GET, &query, None).await?;

        let result: ListCnameResult =
            quick_xml::de::from_str(&body).map_err(|e| OssError::Xml(e.to_string()))?;
        debug!(
            bucket = %self.bucket,
            bindings = result.cname.len(),
            "listed bucket cname bindings"
        );
        Ok(result)
    }

    /// Submit a certificate update for a bound domain (`POST ?cname&comp=add`)
    pub async fn put_bucket_cname(
        &self,
        configuration: &BucketCnameConfiguration,
    ) -> Result<(), OssError> {
        let query = vec![
            ("cname".to_string(), String::new()),
            ("comp".to_string(), "add".to_string()),
        ];
        let body =
            quick_xml::se::to_string(configuration).map_err(|e| OssError::Xml(e.to_string()))?;

        self.send(Method::POST, &query, Some(body)).await?;
        debug!(
            bucket = %self.bucket,
            domain = %configuration.cname.domain,
            "put bucket cname accepted"
        );
        Ok(())
    }

    /// Sign and send one request, returning the response body on success
    /// and the parsed service error otherwise
    async fn send(
        &self,
        method: Method,
        query: &[(String, String)],
        body: Option<String>,
    ) -> Result<String, OssError> {
        let now = Utc::now();

        let mut headers = BTreeMap::new();
        headers.insert(
            "x-oss-date".to_string(),
            now.format("%Y%m%dT%H%M%SZ").to_string(),
        );
        headers.insert(
            "x-oss-content-sha256".to_string(),
            UNSIGNED_PAYLOAD.to_string(),
        );
        if body.is_some() {
            headers.insert("content-type".to_string(), "application/xml".to_string());
        }

        let authorization = auth::authorization(
            &self.credentials,
            &self.region,
            now,
            &SignableRequest {
                method: method.as_str(),
                bucket: &self.bucket,
                query,
                headers: &headers,
            },
        );

        let mut url = format!("{}://{}/", self.scheme, self.host);
        let query_string = auth::canonical_query(query);
        if !query_string.is_empty() {
            url.push('?');
            url.push_str(&query_string);
        }

        let mut request = self.http.request(method, url.as_str());
        for (name, value) in &headers {
            request = request.header(name.as_str(), value);
        }
        request = request.header("authorization", authorization);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(text);
        }

        match quick_xml::de::from_str::<ErrorResponse>(&text) {
            Ok(error) => Err(OssError::Service {
                status: status.as_u16(),
                code: error.code,
                message: error.message,
                request_id: error.request_id,
            }),
            Err(_) => Err(OssError::Service {
                status: status.as_u16(),
                code: "Unknown".to_string(),
                message: text.chars().take(200).collect(),
                request_id: None,
            }),
        }
    }
}

impl From<OssError> for ControlPlaneError {
    fn from(error: OssError) -> Self {
        match error {
            OssError::Service {
                status,
                code,
                message,
                request_id,
            } => ControlPlaneError::Service {
                status,
                code,
                message: match request_id {
                    Some(id) => format!("{message} (request id {id})"),
                    None => message,
                },
            },
            other => ControlPlaneError::Transport(other.to_string()),
        }
    }
}

#[async_trait]
impl ControlPlane for OssClient {
    async fn list_domain_bindings(&self) -> Result<Vec<DomainBinding>, ControlPlaneError> {
        let result = self.list_bucket_cname().await.map_err(ControlPlaneError::from)?;
        Ok(result.cname.into_iter().map(DomainBinding::from).collect())
    }

    async fn update_domain_binding(
        &self,
        request: RotationRequest,
    ) -> Result<(), ControlPlaneError> {
        let configuration = BucketCnameConfiguration::from(request);
        self.put_bucket_cname(&configuration)
            .await
            .map_err(ControlPlaneError::from)
    }
}
