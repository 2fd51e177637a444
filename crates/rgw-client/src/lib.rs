//! # RGW Client SDK
//!
//! A client for S3-compatible object gateways (Ceph RADOS Gateway and
//! friends) built around streaming multipart upload.
//!
//! ## Features
//!
//! - **Multipart upload** from any [`tokio::io::AsyncRead`], one part in
//!   flight at a time, with per-part failure reporting
//! - **Presigned requests**: SigV4 query signing with a short validity window
//! - **Per-call headers** through [`HeaderOverlay`]
//! - Bucket, user and single-shot object calls
//!
//! ## Example
//!
//! ```rust,ignore
//! use rgw_client::{Config, GatewayClient, HeaderOverlay, UploadTarget};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = GatewayClient::new(
//!         Config::new("http://rgw.local:7480").with_credentials("access", "secret"),
//!     )?;
//!
//!     client.create_bucket("backups", &HeaderOverlay::new()).await?.error_for_status()?;
//!
//!     let file = tokio::fs::File::open("db.dump").await?;
//!     let done = client
//!         .put_object_multipart(UploadTarget::new("backups", "db.dump"), file, client.upload_options())
//!         .await?;
//!     println!("stored {} bytes in {} parts", done.bytes_uploaded, done.parts.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
pub mod multipart;
pub mod signer;
pub mod transport;
mod types;

pub use client::GatewayClient;
pub use config::{Config, DEFAULT_PART_SIZE, MAX_PART_SIZE};
pub use error::{ClientError, Result, UploadError, UploadStage};
pub use multipart::{
    upload_stream, MultipartUpload, PartFailure, PartOutcome, PartReader, ProgressCallback,
    UploadOptions, UploadProgress, UploadSession, UploadState,
};
pub use transport::{GatewayRequest, GatewayResponse, HttpTransport, Transport};
pub use types::*;
