//! Bucket operation handlers

use super::{respond, HandlerFuture};
use futures::FutureExt;
use rgw_client::{GatewayClient, HeaderOverlay};
use tracing::warn;

/// GET / - List buckets. The case parameter is not used.
pub fn list_buckets<'a>(client: &'a GatewayClient, ignored: &'a str, headers: &'a HeaderOverlay) -> HandlerFuture<'a> {
    if !ignored.is_empty() {
        warn!(para = ignored, "ListBuckets lists every bucket, parameter ignored");
    }
    async move { respond(client.list_buckets(headers).await) }.boxed()
}

/// GET /{bucket} - List bucket contents
pub fn get_bucket<'a>(client: &'a GatewayClient, bucket: &'a str, headers: &'a HeaderOverlay) -> HandlerFuture<'a> {
    async move { respond(client.get_bucket(bucket, headers).await) }.boxed()
}

/// PUT /{bucket} - Create bucket
pub fn create_bucket<'a>(client: &'a GatewayClient, bucket: &'a str, headers: &'a HeaderOverlay) -> HandlerFuture<'a> {
    async move { respond(client.create_bucket(bucket, headers).await) }.boxed()
}

/// DELETE /{bucket} - Delete bucket
pub fn delete_bucket<'a>(client: &'a GatewayClient, bucket: &'a str, headers: &'a HeaderOverlay) -> HandlerFuture<'a> {
    async move { respond(client.delete_bucket(bucket, headers).await) }.boxed()
}
