//! Admin user handlers

use super::{respond, HandlerFuture};
use futures::FutureExt;
use rgw_client::{GatewayClient, HeaderOverlay};

/// GET /admin/user?uid={uid}
pub fn get_user<'a>(client: &'a GatewayClient, uid: &'a str, headers: &'a HeaderOverlay) -> HandlerFuture<'a> {
    async move { respond(client.get_user(uid, headers).await) }.boxed()
}
