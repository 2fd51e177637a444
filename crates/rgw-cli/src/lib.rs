//! # RGW Harness
//!
//! Drives an S3-compatible RADOS gateway from a JSON case file.
//!
//! Each case names an operation from a fixed table, a parameter and an
//! optional set of headers for that call. Cases run in file order through
//! one [`rgw_client::GatewayClient`]; the status and body of every response
//! are logged.
//!
//! ```text
//! radosgw.ini ──► HarnessConfig ──► GatewayClient
//!                                        │
//! radosgw_testcase.json ──► TestCase ──► routes::lookup ──► handler
//! ```

pub mod cases;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod runner;

pub use cases::{load_cases, TestCase};
pub use config::HarnessConfig;
pub use error::{HarnessError, Result};
pub use runner::{run_case, run_cases, CaseReport};
