//! Signed request transport
//!
//! The rest of the crate talks to the gateway only through [`Transport`].
//! [`HttpTransport`] is the production implementation: it presigns each
//! request, applies the configured default headers and the per-call overlay,
//! and returns whatever status the gateway answered with.

use crate::signer::{encode_path, Presigner};
use crate::{ClientError, Config, HeaderOverlay, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use tracing::debug;

/// A request before signing
#[derive(Clone, Debug)]
pub struct GatewayRequest {
    pub method: Method,
    /// Unencoded resource path, e.g. `/bucket/key`
    pub path: String,
    /// Unencoded query parameters; an empty value renders as `name=`
    pub query: Vec<(String, String)>,
    /// Headers for this call only
    pub headers: HeaderOverlay,
    pub body: Option<Bytes>,
}

impl GatewayRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderOverlay::new(),
            body: None,
        }
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: &HeaderOverlay) -> Self {
        self.headers = self.headers.layered(headers);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Value of a query parameter
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw gateway response; any status
#[derive(Clone, Debug)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl GatewayResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Header value as text, if present and valid
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a non-2xx response into [`ClientError::S3Error`]
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::from_s3_xml(&self.text(), self.status.as_u16()))
        }
    }
}

/// Executes gateway requests
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sign and send a request.
    ///
    /// Non-2xx statuses are returned as responses; only failures to build or
    /// deliver the request are errors.
    async fn execute(&self, request: GatewayRequest) -> Result<GatewayResponse>;
}

/// reqwest-backed transport with SigV4 presigning
#[derive(Debug)]
pub struct HttpTransport {
    http: Client,
    /// scheme://authority
    origin: String,
    /// Value of the signed `host` header
    host: String,
    /// Path prefix of the endpoint, without trailing slash
    prefix: String,
    presigner: Presigner,
    default_headers: HeaderOverlay,
}

impl HttpTransport {
    /// Create a transport for the configured endpoint
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let endpoint = url::Url::parse(&config.endpoint)?;
        let host = endpoint
            .host_str()
            .ok_or_else(|| ClientError::Config(format!("endpoint has no host: {}", config.endpoint)))?;
        let host = match endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let origin = format!("{}://{}", endpoint.scheme(), host);
        let prefix = endpoint.path().trim_end_matches('/').to_string();

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ClientError::Http)?;

        let presigner = Presigner::new(
            config.access_key_id.clone(),
            &config.secret_access_key,
            config.region.clone(),
            config.signature_ttl,
        );

        Ok(Self {
            http,
            origin,
            host,
            prefix,
            presigner,
            default_headers: config.default_headers.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: GatewayRequest) -> Result<GatewayResponse> {
        let canonical_uri = format!("{}{}", self.prefix, encode_path(&request.path));
        let query = self.presigner.presign(
            request.method.as_str(),
            &self.host,
            &canonical_uri,
            &request.query,
            chrono::Utc::now(),
        );
        let url = format!("{}{}?{}", self.origin, canonical_uri, query);

        let mut req = self
            .http
            .request(request.method.clone(), &url)
            .headers(self.default_headers.layered(&request.headers).into_header_map());
        if let Some(body) = request.body {
            req = req.body(body);
        }

        debug!(method = %request.method, path = %request.path, "sending gateway request");
        let response = req.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), len = body.len(), "gateway response");

        Ok(GatewayResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let overlay = HeaderOverlay::new().with("X-Trace", "1").unwrap();
        let req = GatewayRequest::new(Method::PUT, "/b/k")
            .query("partNumber", "3")
            .query("uploadId", "abc")
            .headers(&overlay)
            .body(Bytes::from_static(b"data"));

        assert_eq!(req.query_value("partNumber"), Some("3"));
        assert_eq!(req.query_value("uploadId"), Some("abc"));
        assert_eq!(req.headers.get("x-trace"), Some("1"));
        assert_eq!(req.body.as_deref(), Some(&b"data"[..]));
    }

    #[test]
    fn test_typed_header_overrides_overlay() {
        let overlay = HeaderOverlay::new().with("Content-Type", "text/plain").unwrap();
        let req = GatewayRequest::new(Method::POST, "/b/k")
            .headers(&overlay)
            .header(reqwest::header::CONTENT_TYPE, HeaderValue::from_static("application/xml"));

        assert_eq!(req.headers.get_all("content-type"), vec!["application/xml"]);
    }

    #[test]
    fn test_error_for_status() {
        let ok = GatewayResponse::new(StatusCode::OK, HeaderMap::new(), "fine");
        assert!(ok.error_for_status().is_ok());

        let denied = GatewayResponse::new(
            StatusCode::FORBIDDEN,
            HeaderMap::new(),
            "<Error><Code>AccessDenied</Code></Error>",
        );
        let err = denied.error_for_status().unwrap_err();
        assert!(err.is_access_denied());
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_transport_requires_credentials() {
        assert!(HttpTransport::new(&Config::new("http://localhost:7480")).is_err());

        let config = Config::new("http://localhost:7480/rgw/").with_credentials("ak", "sk");
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.host, "localhost:7480");
        assert_eq!(transport.origin, "http://localhost:7480");
        assert_eq!(transport.prefix, "/rgw");
    }
}
