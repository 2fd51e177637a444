//! Operation table
//!
//! Maps the `func_name` of a case to its handler. The table is fixed at
//! compile time; each entry also fixes the parameter type the handler takes.

use crate::cases::{ObjectParam, ParamType};
use crate::handlers::{self, HandlerFuture};
use rgw_client::{GatewayClient, HeaderOverlay};

/// Handler taking a string parameter
pub type TextHandler = for<'a> fn(&'a GatewayClient, &'a str, &'a HeaderOverlay) -> HandlerFuture<'a>;

/// Handler taking an object parameter
pub type ObjectHandler = for<'a> fn(&'a GatewayClient, ObjectParam, &'a HeaderOverlay) -> HandlerFuture<'a>;

#[derive(Clone, Copy)]
pub enum Handler {
    Text(TextHandler),
    Object(ObjectHandler),
}

impl Handler {
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::Text(_) => ParamType::Text,
            Self::Object(_) => ParamType::Object,
        }
    }
}

/// A named operation
#[derive(Clone, Copy)]
pub struct Operation {
    pub name: &'static str,
    pub handler: Handler,
}

/// Every operation a case file can name
pub static OPERATIONS: &[Operation] = &[
    Operation { name: "ListBuckets", handler: Handler::Text(handlers::list_buckets) },
    Operation { name: "GetBucket", handler: Handler::Text(handlers::get_bucket) },
    Operation { name: "CreateBucket", handler: Handler::Text(handlers::create_bucket) },
    Operation { name: "DeleteBucket", handler: Handler::Text(handlers::delete_bucket) },
    Operation { name: "GetUser", handler: Handler::Text(handlers::get_user) },
    Operation { name: "PutObject", handler: Handler::Object(handlers::put_object) },
    Operation { name: "PutObjectMultipart", handler: Handler::Object(handlers::put_object_multipart) },
    // Name used by older case files for the same streamed upload
    Operation { name: "PutObjectByPic", handler: Handler::Object(handlers::put_object_multipart) },
];

/// Find an operation by name
pub fn lookup(name: &str) -> Option<&'static Operation> {
    OPERATIONS.iter().find(|op| op.name == name)
}
