//! Object operation handlers

use super::{respond, CaseOutcome, HandlerFuture};
use crate::cases::ObjectParam;
use crate::Result;
use futures::FutureExt;
use rgw_client::{GatewayClient, HeaderOverlay};
use tokio::io::AsyncRead;
use tracing::info;

/// PUT /{bucket}/{key} - Single-shot upload of the whole file
pub fn put_object<'a>(client: &'a GatewayClient, param: ObjectParam, headers: &'a HeaderOverlay) -> HandlerFuture<'a> {
    upload_whole(client, param, headers).boxed()
}

async fn upload_whole(client: &GatewayClient, param: ObjectParam, headers: &HeaderOverlay) -> Result<CaseOutcome> {
    let body = match param.path() {
        Some(path) => tokio::fs::read(path).await?,
        None => Vec::new(),
    };
    respond(client.put_object(&param.target(), body, headers).await)
}

/// Multipart upload streaming the file part by part
pub fn put_object_multipart<'a>(
    client: &'a GatewayClient,
    param: ObjectParam,
    headers: &'a HeaderOverlay,
) -> HandlerFuture<'a> {
    upload_multipart(client, param, headers).boxed()
}

async fn upload_multipart(client: &GatewayClient, param: ObjectParam, headers: &HeaderOverlay) -> Result<CaseOutcome> {
    let source: Box<dyn AsyncRead + Unpin + Send> = match param.path() {
        Some(path) => Box::new(tokio::fs::File::open(path).await?),
        None => Box::new(tokio::io::empty()),
    };
    let options = client.upload_options().with_headers(headers.clone());

    let completed = client
        .put_object_multipart(param.target(), source, options)
        .await?;
    info!(
        upload_id = %completed.upload_id,
        parts = completed.parts.len(),
        bytes = completed.bytes_uploaded,
        "multipart upload finished"
    );

    Ok(CaseOutcome {
        status: completed.status,
        body: completed.body,
    })
}
