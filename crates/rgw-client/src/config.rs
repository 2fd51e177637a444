//! Client configuration

use crate::{ClientError, HeaderOverlay, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT_ENCODING};
use std::time::Duration;

/// Default multipart part size (5 MiB)
pub const DEFAULT_PART_SIZE: usize = 5 << 20;

/// Largest part size the gateway accepts (5 GiB)
pub const MAX_PART_SIZE: usize = 5 << 30;

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Gateway endpoint URL, e.g. `http://rgw.local:7480`
    pub endpoint: String,
    /// Access key id used for signing
    pub access_key_id: String,
    /// Secret access key used for signing
    pub secret_access_key: String,
    /// Signing region
    pub region: String,
    /// Per-request deadline
    pub timeout: Duration,
    /// Validity window of each request signature
    pub signature_ttl: Duration,
    /// User agent string
    pub user_agent: String,
    /// Multipart part size (bytes)
    pub part_size: usize,
    /// Headers sent with every request, beneath any per-call overlay
    pub default_headers: HeaderOverlay,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:7480".to_string(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: "us-east-1".to_string(),
            timeout: Duration::from_secs(30),
            signature_ttl: Duration::from_secs(60),
            user_agent: format!("rgw-client/{}", env!("CARGO_PKG_VERSION")),
            part_size: DEFAULT_PART_SIZE,
            default_headers: default_headers(),
        }
    }
}

impl Config {
    /// Create a new config with the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the signing credentials
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = access_key_id.into();
        self.secret_access_key = secret_access_key.into();
        self
    }

    /// Set the signing region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the multipart part size
    pub fn with_part_size(mut self, part_size: usize) -> Self {
        self.part_size = part_size;
        self
    }

    /// Add a header sent with every request
    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.set(name, value);
        self
    }

    /// Check the settings the transport and uploader rely on
    pub fn validate(&self) -> Result<()> {
        if self.access_key_id.is_empty() || self.secret_access_key.is_empty() {
            return Err(ClientError::Config("credentials are not set".to_string()));
        }
        validate_part_size(self.part_size)?;
        if self.signature_ttl.is_zero() {
            return Err(ClientError::Config("signature_ttl must be positive".to_string()));
        }
        url::Url::parse(&self.endpoint)?;
        Ok(())
    }
}

fn default_headers() -> HeaderOverlay {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    HeaderOverlay::from(headers)
}

pub(crate) fn validate_part_size(part_size: usize) -> Result<()> {
    if part_size == 0 || part_size > MAX_PART_SIZE {
        return Err(ClientError::Config(format!(
            "part size must be between 1 and {} bytes",
            MAX_PART_SIZE
        )));
    }
    Ok(())
}
