//! Client error types

use crate::types::PartResult;
use serde::Deserialize;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint or request URL could not be built
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Gateway answered with a non-success status
    #[error("S3 error ({code}, HTTP {status}): {message}")]
    S3Error {
        status: u16,
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Response was well-formed but not what the protocol requires
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Manifest would be rejected by the gateway
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// Operation not allowed in the current upload state
    #[error("invalid upload state: {0}")]
    InvalidState(String),

    /// Header name or value that cannot go on the wire
    #[error("invalid header {0}")]
    InvalidHeader(String),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDocument {
    #[serde(rename = "Code", default)]
    code: Option<String>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
    #[serde(rename = "RequestId", default)]
    request_id: Option<String>,
}

impl ClientError {
    /// Parse an S3 error from an XML response body
    pub fn from_s3_xml(xml: &str, status: u16) -> Self {
        let doc: ErrorDocument = quick_xml::de::from_str(xml).unwrap_or_default();

        Self::S3Error {
            status,
            code: doc.code.unwrap_or_else(|| format!("HTTP{}", status)),
            message: doc.message.unwrap_or_else(|| "Unknown error".to_string()),
            request_id: doc.request_id,
        }
    }

    /// HTTP status of a gateway error, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::S3Error { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::S3Error { code, status, .. }
            if code.starts_with("NoSuch") || *status == 404)
    }

    /// Check if this is an access denied error
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::S3Error { code, status, .. } if code == "AccessDenied" || *status == 403)
    }

    /// True for failures below the HTTP protocol (connect, timeout, IO)
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Io(_))
    }
}

/// Stage of a multipart upload at which it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    /// Checking options, before any request
    Prepare,
    Initiate,
    ReadSource,
    UploadPart,
    Complete,
}

/// Why a multipart upload was aborted.
///
/// Every variant raised after initiation carries the upload id. Parts stored
/// before the failure stay on the gateway until the caller finalizes or aborts
/// that id (see [`crate::GatewayClient::abort_multipart_upload`]); nothing is
/// cleaned up automatically.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("upload options rejected: {0}")]
    Options(#[source] ClientError),

    #[error("initiating upload of {bucket}/{key} failed: {source}")]
    Initiate {
        bucket: String,
        key: String,
        #[source]
        source: ClientError,
    },

    #[error("reading source for part {part_number} of upload {upload_id} failed: {source}")]
    ReadSource {
        upload_id: String,
        part_number: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("part {part_number} of upload {upload_id} failed with {bytes_in_flight} bytes in flight: {source}")]
    Part {
        upload_id: String,
        part_number: u32,
        bytes_in_flight: usize,
        completed: Vec<PartResult>,
        #[source]
        source: ClientError,
    },

    #[error("part {part_number} of upload {upload_id} was accepted without an ETag")]
    MissingToken {
        upload_id: String,
        part_number: u32,
        completed: Vec<PartResult>,
    },

    #[error("completing upload {upload_id} failed: {source}")]
    Complete {
        upload_id: String,
        #[source]
        source: ClientError,
    },
}

impl UploadError {
    /// Stage that failed
    pub fn stage(&self) -> UploadStage {
        match self {
            Self::Options(_) => UploadStage::Prepare,
            Self::Initiate { .. } => UploadStage::Initiate,
            Self::ReadSource { .. } => UploadStage::ReadSource,
            Self::Part { .. } | Self::MissingToken { .. } => UploadStage::UploadPart,
            Self::Complete { .. } => UploadStage::Complete,
        }
    }

    /// Part number being handled when the upload stopped
    pub fn part_number(&self) -> Option<u32> {
        match self {
            Self::ReadSource { part_number, .. }
            | Self::Part { part_number, .. }
            | Self::MissingToken { part_number, .. } => Some(*part_number),
            _ => None,
        }
    }

    /// Parts stored before the upload stopped
    pub fn completed_parts(&self) -> &[PartResult] {
        match self {
            Self::Part { completed, .. } | Self::MissingToken { completed, .. } => completed,
            _ => &[],
        }
    }

    /// Upload id left orphaned on the gateway, if initiation got that far
    pub fn upload_id(&self) -> Option<&str> {
        match self {
            Self::Options(_) | Self::Initiate { .. } => None,
            Self::ReadSource { upload_id, .. }
            | Self::Part { upload_id, .. }
            | Self::MissingToken { upload_id, .. }
            | Self::Complete { upload_id, .. } => Some(upload_id),
        }
    }
}
