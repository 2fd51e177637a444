//! Single part upload

use super::UploadSession;
use crate::transport::{GatewayRequest, Transport};
use crate::{ClientError, PartResult};
use bytes::Bytes;
use reqwest::Method;
use thiserror::Error;
use tracing::{debug, warn};

/// What the gateway said about a part it accepted
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartOutcome {
    /// Stored, with its completion token
    Stored(PartResult),
    /// 2xx status but no usable `ETag` header. The part cannot be listed in
    /// the manifest; the caller either re-sends the same chunk or gives up.
    MissingToken { part_number: u32 },
}

/// A part upload that did not reach the gateway or was refused by it
#[derive(Error, Debug)]
#[error("part {part_number} failed with {bytes_in_flight} bytes in flight: {source}")]
pub struct PartFailure {
    pub part_number: u32,
    pub bytes_in_flight: usize,
    #[source]
    pub source: ClientError,
}

/// `PUT /{bucket}/{key}?partNumber={n}&uploadId={id}` with `chunk` as body
pub async fn upload_part(
    transport: &dyn Transport,
    session: &UploadSession,
    part_number: u32,
    chunk: Bytes,
) -> Result<PartOutcome, PartFailure> {
    let bytes_in_flight = chunk.len();
    let fail = |source| PartFailure {
        part_number,
        bytes_in_flight,
        source,
    };

    let request = GatewayRequest::new(Method::PUT, session.target().path())
        .query("partNumber", part_number.to_string())
        .query("uploadId", session.upload_id())
        .headers(session.headers())
        .body(chunk);

    let response = transport.execute(request).await.map_err(fail)?;
    let response = response.error_for_status().map_err(fail)?;

    let etag = response
        .header("ETag")
        .map(|v| v.trim().trim_matches('"'))
        .filter(|v| !v.is_empty());

    match etag {
        Some(etag) => {
            debug!(part_number, bytes = bytes_in_flight, etag, "part stored");
            Ok(PartOutcome::Stored(PartResult {
                part_number,
                etag: etag.to_string(),
            }))
        }
        None => {
            warn!(part_number, upload_id = session.upload_id(), "part accepted without ETag");
            Ok(PartOutcome::MissingToken { part_number })
        }
    }
}
