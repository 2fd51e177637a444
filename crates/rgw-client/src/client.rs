//! Main client implementation

use crate::multipart::{self, UploadOptions};
use crate::transport::{GatewayRequest, GatewayResponse, HttpTransport, Transport};
use crate::{CompletedUpload, Config, HeaderOverlay, Result, UploadError, UploadTarget};
use bytes::Bytes;
use reqwest::Method;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::instrument;

/// Gateway client.
///
/// Bucket, user and single-shot object calls return the raw
/// [`GatewayResponse`] whatever its status; use
/// [`GatewayResponse::error_for_status`] to turn refusals into errors.
/// Every call takes a header overlay applied to that call only.
pub struct GatewayClient {
    config: Config,
    transport: Arc<dyn Transport>,
}

impl GatewayClient {
    /// Create a client talking HTTP to the configured endpoint
    pub fn new(config: Config) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self { config, transport })
    }

    /// Create a client over an existing transport
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Upload options using the configured part size
    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions::new(self.config.part_size)
    }

    // ==================== Bucket Operations ====================

    /// List all buckets owned by the caller
    #[instrument(skip(self, headers))]
    pub async fn list_buckets(&self, headers: &HeaderOverlay) -> Result<GatewayResponse> {
        self.send(Method::GET, "/", headers).await
    }

    /// List the contents of a bucket
    #[instrument(skip(self, headers))]
    pub async fn get_bucket(&self, bucket: &str, headers: &HeaderOverlay) -> Result<GatewayResponse> {
        self.send(Method::GET, &format!("/{}", bucket), headers).await
    }

    /// Create a bucket
    #[instrument(skip(self, headers))]
    pub async fn create_bucket(&self, bucket: &str, headers: &HeaderOverlay) -> Result<GatewayResponse> {
        self.send(Method::PUT, &format!("/{}", bucket), headers).await
    }

    /// Delete a bucket
    #[instrument(skip(self, headers))]
    pub async fn delete_bucket(&self, bucket: &str, headers: &HeaderOverlay) -> Result<GatewayResponse> {
        self.send(Method::DELETE, &format!("/{}", bucket), headers).await
    }

    // ==================== User Operations ====================

    /// Fetch user info through the admin API
    #[instrument(skip(self, headers))]
    pub async fn get_user(&self, uid: &str, headers: &HeaderOverlay) -> Result<GatewayResponse> {
        let request = GatewayRequest::new(Method::GET, "/admin/user")
            .query("uid", uid)
            .headers(headers);
        self.transport.execute(request).await
    }

    // ==================== Object Operations ====================

    /// Store an object with a single PUT
    #[instrument(skip(self, body, headers), fields(target = %target))]
    pub async fn put_object(
        &self,
        target: &UploadTarget,
        body: impl Into<Bytes>,
        headers: &HeaderOverlay,
    ) -> Result<GatewayResponse> {
        let request = GatewayRequest::new(Method::PUT, target.path())
            .headers(headers)
            .body(body);
        self.transport.execute(request).await
    }

    /// Store everything `source` yields with a multipart upload
    pub async fn put_object_multipart<R>(
        &self,
        target: UploadTarget,
        source: R,
        options: UploadOptions,
    ) -> std::result::Result<CompletedUpload, UploadError>
    where
        R: AsyncRead + Unpin + Send,
    {
        multipart::upload_stream(self.transport(), target, source, options).await
    }

    /// Discard an unfinished multipart upload and the parts stored under it
    #[instrument(skip(self, headers), fields(target = %target))]
    pub async fn abort_multipart_upload(
        &self,
        target: &UploadTarget,
        upload_id: &str,
        headers: &HeaderOverlay,
    ) -> Result<()> {
        multipart::abort_upload(self.transport.as_ref(), target, upload_id, headers).await
    }

    // ==================== Helper Methods ====================

    async fn send(&self, method: Method, path: &str, headers: &HeaderOverlay) -> Result<GatewayResponse> {
        let request = GatewayRequest::new(method, path).headers(headers);
        self.transport.execute(request).await
    }
}
