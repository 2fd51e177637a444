//! Multipart upload of streamed objects
//!
//! The protocol runs strictly in sequence: initiate, then one part at a time
//! as chunks come off the source, then a single finalize call carrying the
//! manifest. Only one request is in flight per upload.
//!
//! Two entry points:
//! - [`upload_stream`] drives the whole thing from an [`AsyncRead`] source.
//! - [`MultipartUpload`] exposes the individual steps for callers that want
//!   to handle a missing `ETag` themselves or feed parts from elsewhere.
//!
//! A failed upload is not cleaned up. Parts already stored stay on the
//! gateway under the upload id until someone completes or aborts it; the id
//! is available from [`UploadError::upload_id`].

pub mod manifest;
pub mod reader;
pub mod uploader;

pub use reader::PartReader;
pub use uploader::{PartFailure, PartOutcome};

use crate::config::DEFAULT_PART_SIZE;
use crate::transport::{GatewayRequest, Transport};
use crate::{
    ClientError, CompletedUpload, HeaderOverlay, PartResult, Result, UploadError, UploadTarget,
};
use bytes::Bytes;
use quick_xml::events::Event;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::{debug, info, instrument, warn};

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(UploadProgress) + Send + Sync>;

/// Upload progress information
#[derive(Clone, Debug)]
pub struct UploadProgress {
    /// Bytes stored so far
    pub bytes_uploaded: u64,
    /// Part that just finished
    pub current_part: u32,
}

/// Lifecycle of a multipart upload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadState {
    NotStarted,
    Initiated,
    Uploading,
    Finalizing,
    Completed,
    Aborted,
}

/// Options for a streamed upload
pub struct UploadOptions {
    /// Bytes per part; the last part may be shorter
    pub part_size: usize,
    /// Headers added to every call of the upload
    pub headers: HeaderOverlay,
    /// Called after each stored part
    pub progress: Option<ProgressCallback>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            headers: HeaderOverlay::new(),
            progress: None,
        }
    }
}

impl UploadOptions {
    pub fn new(part_size: usize) -> Self {
        Self {
            part_size,
            ..Default::default()
        }
    }

    pub fn with_headers(mut self, headers: HeaderOverlay) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl std::fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOptions")
            .field("part_size", &self.part_size)
            .field("headers", &self.headers)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Server-side identity of one upload attempt and the parts stored under it
#[derive(Clone, Debug)]
pub struct UploadSession {
    upload_id: String,
    target: UploadTarget,
    headers: HeaderOverlay,
    parts: Vec<PartResult>,
}

impl UploadSession {
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn target(&self) -> &UploadTarget {
        &self.target
    }

    pub fn headers(&self) -> &HeaderOverlay {
        &self.headers
    }

    /// Stored parts, ascending
    pub fn parts(&self) -> &[PartResult] {
        &self.parts
    }
}

#[derive(Debug, Deserialize)]
struct InitiateMultipartUploadResult {
    #[serde(rename = "UploadId")]
    upload_id: String,
}

/// Step-wise handle on one multipart upload
pub struct MultipartUpload {
    transport: Arc<dyn Transport>,
    session: UploadSession,
    state: UploadState,
    bytes_uploaded: u64,
}

impl MultipartUpload {
    /// `POST /{bucket}/{key}?uploads` and read the issued upload id
    #[instrument(skip(transport, headers), fields(target = %target))]
    pub async fn initiate(
        transport: Arc<dyn Transport>,
        target: UploadTarget,
        headers: HeaderOverlay,
    ) -> Result<Self> {
        let request = GatewayRequest::new(Method::POST, target.path())
            .query("uploads", "")
            .headers(&headers);
        let response = transport.execute(request).await?.error_for_status()?;

        let text = response.text();
        let result: InitiateMultipartUploadResult = quick_xml::de::from_str(&text)
            .map_err(|e| ClientError::XmlParse(format!("initiate response: {}", e)))?;
        let upload_id = result.upload_id.trim().to_string();
        if upload_id.is_empty() {
            return Err(ClientError::InvalidResponse("empty UploadId".to_string()));
        }

        info!(upload_id = %upload_id, "multipart upload initiated");
        Ok(Self {
            transport,
            session: UploadSession {
                upload_id,
                target,
                headers,
                parts: Vec::new(),
            },
            state: UploadState::Initiated,
            bytes_uploaded: 0,
        })
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn session(&self) -> &UploadSession {
        &self.session
    }

    pub fn upload_id(&self) -> &str {
        self.session.upload_id()
    }

    /// Stored parts, ascending
    pub fn parts(&self) -> &[PartResult] {
        self.session.parts()
    }

    /// Number the next chunk will be sent under
    pub fn next_part_number(&self) -> u32 {
        self.session.parts.len() as u32 + 1
    }

    pub fn bytes_uploaded(&self) -> u64 {
        self.bytes_uploaded
    }

    /// Upload `chunk` as the next part.
    ///
    /// A stored part is recorded and advances the part number. A missing
    /// token records nothing, so sending the same chunk again reuses the same
    /// number. A failure aborts the upload.
    pub async fn upload_part(&mut self, chunk: Bytes) -> std::result::Result<PartOutcome, PartFailure> {
        let part_number = self.next_part_number();
        if !matches!(self.state, UploadState::Initiated | UploadState::Uploading) {
            return Err(PartFailure {
                part_number,
                bytes_in_flight: 0,
                source: ClientError::InvalidState(format!(
                    "cannot upload a part while {:?}",
                    self.state
                )),
            });
        }
        self.state = UploadState::Uploading;

        let len = chunk.len() as u64;
        match uploader::upload_part(self.transport.as_ref(), &self.session, part_number, chunk).await {
            Ok(PartOutcome::Stored(part)) => {
                self.session.parts.push(part.clone());
                self.bytes_uploaded += len;
                Ok(PartOutcome::Stored(part))
            }
            Ok(outcome) => Ok(outcome),
            Err(failure) => {
                self.state = UploadState::Aborted;
                Err(failure)
            }
        }
    }

    /// `POST /{bucket}/{key}?uploadId={id}` with the manifest of stored parts
    #[instrument(skip(self), fields(upload_id = %self.session.upload_id, parts = self.session.parts.len()))]
    pub async fn complete(&mut self) -> Result<CompletedUpload> {
        if self.state != UploadState::Uploading || self.session.parts.is_empty() {
            return Err(ClientError::InvalidState(format!(
                "cannot complete while {:?} with {} parts",
                self.state,
                self.session.parts.len()
            )));
        }
        self.state = UploadState::Finalizing;

        match self.finalize().await {
            Ok(completed) => {
                self.state = UploadState::Completed;
                info!(bytes = completed.bytes_uploaded, "multipart upload completed");
                Ok(completed)
            }
            Err(e) => {
                self.state = UploadState::Aborted;
                Err(e)
            }
        }
    }

    async fn finalize(&self) -> Result<CompletedUpload> {
        let body = manifest::build(&self.session.parts)?;
        let request = GatewayRequest::new(Method::POST, self.session.target.path())
            .query("uploadId", self.session.upload_id.as_str())
            .headers(&self.session.headers)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/xml"))
            .body(body);

        let response = self.transport.execute(request).await?.error_for_status()?;
        // The gateway may report a failed completion inside a 200 response
        let text = response.text();
        if is_error_document(&text) {
            return Err(ClientError::from_s3_xml(&text, response.status.as_u16()));
        }

        Ok(CompletedUpload {
            upload_id: self.session.upload_id.clone(),
            parts: self.session.parts.clone(),
            bytes_uploaded: self.bytes_uploaded,
            status: response.status.as_u16(),
            body: response.body,
        })
    }

    /// `DELETE /{bucket}/{key}?uploadId={id}`, discarding stored parts
    pub async fn abort(&mut self) -> Result<()> {
        if matches!(self.state, UploadState::Completed) {
            return Err(ClientError::InvalidState("upload already completed".to_string()));
        }
        self.state = UploadState::Aborted;
        abort_upload(
            self.transport.as_ref(),
            &self.session.target,
            &self.session.upload_id,
            &self.session.headers,
        )
        .await
    }
}

/// Abort an upload by id
pub(crate) async fn abort_upload(
    transport: &dyn Transport,
    target: &UploadTarget,
    upload_id: &str,
    headers: &HeaderOverlay,
) -> Result<()> {
    let request = GatewayRequest::new(Method::DELETE, target.path())
        .query("uploadId", upload_id)
        .headers(headers);
    transport.execute(request).await?.error_for_status()?;
    info!(upload_id, "multipart upload aborted");
    Ok(())
}

/// Upload everything `source` yields as one multipart object.
///
/// Chunks are read one part at a time; chunk N+1 is not read before part N is
/// stored. A source that yields no bytes at all is stored as a single empty
/// part so that the finalize manifest is never empty.
///
/// The first failure stops the upload. Nothing is retried and stored parts
/// are left in place (see the module docs).
#[instrument(skip(transport, source, options), fields(target = %target, part_size = options.part_size))]
pub async fn upload_stream<R>(
    transport: Arc<dyn Transport>,
    target: UploadTarget,
    source: R,
    options: UploadOptions,
) -> std::result::Result<CompletedUpload, UploadError>
where
    R: AsyncRead + Unpin + Send,
{
    let mut reader = PartReader::new(source, options.part_size).map_err(UploadError::Options)?;

    let mut upload = MultipartUpload::initiate(transport, target.clone(), options.headers)
        .await
        .map_err(|source| UploadError::Initiate {
            bucket: target.bucket.clone(),
            key: target.key.clone(),
            source,
        })?;

    loop {
        let part_number = upload.next_part_number();
        let chunk = match reader.next_chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) if upload.parts().is_empty() => {
                debug!("empty source, sending a single empty part");
                Bytes::new()
            }
            Ok(None) => break,
            Err(source) => {
                warn!(upload_id = upload.upload_id(), part_number, "reading source failed, upload left open");
                return Err(UploadError::ReadSource {
                    upload_id: upload.upload_id().to_string(),
                    part_number,
                    source,
                });
            }
        };

        match upload.upload_part(chunk).await {
            Ok(PartOutcome::Stored(_)) => {
                if let Some(progress) = &options.progress {
                    progress(UploadProgress {
                        bytes_uploaded: upload.bytes_uploaded(),
                        current_part: part_number,
                    });
                }
            }
            Ok(PartOutcome::MissingToken { part_number }) => {
                warn!(upload_id = upload.upload_id(), part_number, "upload stopped, part has no ETag");
                return Err(UploadError::MissingToken {
                    upload_id: upload.upload_id().to_string(),
                    part_number,
                    completed: upload.parts().to_vec(),
                });
            }
            Err(failure) => {
                warn!(upload_id = upload.upload_id(), part_number, "part failed, upload left open");
                return Err(UploadError::Part {
                    upload_id: upload.upload_id().to_string(),
                    part_number: failure.part_number,
                    bytes_in_flight: failure.bytes_in_flight,
                    completed: upload.parts().to_vec(),
                    source: failure.source,
                });
            }
        }
    }

    upload.complete().await.map_err(|source| UploadError::Complete {
        upload_id: upload.upload_id().to_string(),
        source,
    })
}

/// True if the document's root element is `<Error>`
fn is_error_document(xml: &str) -> bool {
    let mut reader = quick_xml::Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => return e.name().as_ref() == b"Error",
            Ok(Event::Eof) | Err(_) => return false,
            Ok(_) => continue,
        }
    }
}
