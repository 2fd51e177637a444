//! Common types for the client SDK

use crate::{ClientError, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

/// Destination object of an upload
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadTarget {
    /// Bucket name
    pub bucket: String,
    /// Object key
    pub key: String,
}

impl UploadTarget {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Request path of the object, `/{bucket}/{key}`
    pub fn path(&self) -> String {
        format!("/{}/{}", self.bucket, self.key)
    }
}

impl std::fmt::Display for UploadTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// A stored part of a multipart upload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartResult {
    /// 1-based part number
    pub part_number: u32,
    /// Entity tag with surrounding quotes removed
    pub etag: String,
}

/// Result of a finalized multipart upload
#[derive(Clone, Debug)]
pub struct CompletedUpload {
    /// Upload id issued at initiation
    pub upload_id: String,
    /// Parts listed in the manifest
    pub parts: Vec<PartResult>,
    /// Total bytes uploaded across all parts
    pub bytes_uploaded: u64,
    /// HTTP status of the finalize call
    pub status: u16,
    /// Completion document returned by the gateway
    pub body: Bytes,
}

/// Request headers applied to a single call.
///
/// Names and values are validated on the way in. [`HeaderOverlay::append`]
/// keeps earlier values under the same name, [`HeaderOverlay::insert`]
/// replaces them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderOverlay {
    headers: HeaderMap,
}

impl HeaderOverlay {
    /// Create an empty overlay
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`HeaderOverlay::append`]
    pub fn with(mut self, name: &str, value: &str) -> Result<Self> {
        self.append(name, value)?;
        Ok(self)
    }

    /// Build from name/value pairs, appending in order
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut overlay = Self::new();
        for (name, value) in pairs {
            overlay.append(name.as_ref(), value.as_ref())?;
        }
        Ok(overlay)
    }

    /// Add a value, keeping any already present under the same name
    pub fn append(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = parse_header(name, value)?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Set a header, replacing every value under the same name
    pub fn insert(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// [`HeaderOverlay::insert`] for an already validated header
    pub fn set(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Remove every value of a header, returning the first
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.headers
            .remove(name)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }

    /// First value of a header
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every value of a header, in insertion order
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter()
    }

    /// Number of values (a name with two values counts twice)
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// `self` with `top` applied over it. A name present in `top` keeps only
    /// the values from `top`.
    pub fn layered(&self, top: &HeaderOverlay) -> HeaderOverlay {
        let mut headers = self.headers.clone();
        headers.extend(top.headers.clone());
        Self { headers }
    }

    pub fn as_header_map(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn into_header_map(self) -> HeaderMap {
        self.headers
    }
}

impl From<HeaderMap> for HeaderOverlay {
    fn from(headers: HeaderMap) -> Self {
        Self { headers }
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| ClientError::InvalidHeader(format!("{:?}: {}", name, e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| ClientError::InvalidHeader(format!("value of {}: {}", name, e)))?;
    Ok((name, value))
}
