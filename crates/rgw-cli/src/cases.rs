//! Case file format
//!
//! A JSON array of calls to make, in order:
//!
//! ```json
//! [
//!   {"func_name": "CreateBucket", "para_type": "string", "para": "photos"},
//!   {"func_name": "PutObjectMultipart", "para_type": "ObjectConfig",
//!    "para": {"Bucket": "photos", "Key": "big.jpg", "ObjectPath": "./big.jpg"},
//!    "add_customHeader": {"x-amz-meta-origin": "harness"}}
//! ]
//! ```

use crate::{HarnessError, Result};
use rgw_client::{HeaderOverlay, UploadTarget};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Kind of parameter a case passes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    /// A single string (bucket name, user id)
    Text,
    /// An object description, see [`ObjectParam`]
    Object,
}

impl ParamType {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "string" => Ok(Self::Text),
            "ObjectConfig" => Ok(Self::Object),
            other => Err(HarnessError::UnsupportedParamType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Object => "ObjectConfig",
        }
    }
}

/// One entry of the case file
#[derive(Clone, Debug, Deserialize)]
pub struct TestCase {
    pub func_name: String,
    pub para_type: String,
    #[serde(default)]
    pub para: serde_json::Value,
    /// Headers sent with this call only
    #[serde(rename = "add_customHeader", default)]
    pub add_custom_header: BTreeMap<String, String>,
}

impl TestCase {
    pub fn param_type(&self) -> Result<ParamType> {
        ParamType::parse(&self.para_type)
    }

    /// Per-call headers; a name or value the gateway could not accept fails the case
    pub fn headers(&self) -> Result<HeaderOverlay> {
        Ok(HeaderOverlay::from_pairs(&self.add_custom_header)?)
    }
}

/// Object parameter: target plus an optional file to use as the body
#[derive(Clone, Debug, Deserialize)]
pub struct ObjectParam {
    #[serde(rename = "Bucket")]
    pub bucket: String,
    #[serde(rename = "Key")]
    pub key: String,
    /// Body source; absent or empty means an empty body
    #[serde(rename = "ObjectPath", default)]
    pub object_path: Option<PathBuf>,
}

impl ObjectParam {
    pub fn target(&self) -> UploadTarget {
        UploadTarget::new(self.bucket.clone(), self.key.clone())
    }

    pub fn path(&self) -> Option<&Path> {
        self.object_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// Read a case file
pub fn load_cases(path: &Path) -> Result<Vec<TestCase>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
