//! Case handlers, one per gateway operation

pub mod bucket;
pub mod object;
pub mod user;

pub use bucket::*;
pub use object::*;
pub use user::*;

use crate::Result;
use bytes::Bytes;
use futures::future::BoxFuture;
use rgw_client::GatewayResponse;

/// What a case produced, for reporting
#[derive(Clone, Debug)]
pub struct CaseOutcome {
    pub status: u16,
    pub body: Bytes,
}

impl From<GatewayResponse> for CaseOutcome {
    fn from(response: GatewayResponse) -> Self {
        Self {
            status: response.status.as_u16(),
            body: response.body,
        }
    }
}

/// Report a gateway response whatever its status
pub(crate) fn respond(result: rgw_client::Result<GatewayResponse>) -> Result<CaseOutcome> {
    Ok(result?.into())
}

/// Future returned by every handler
pub type HandlerFuture<'a> = BoxFuture<'a, Result<CaseOutcome>>;
