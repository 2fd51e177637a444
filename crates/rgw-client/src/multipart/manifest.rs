//! Completion manifest for a multipart upload

use crate::{ClientError, PartResult, Result};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename = "CompleteMultipartUpload")]
struct CompleteMultipartUpload<'a> {
    #[serde(rename = "Part")]
    parts: Vec<ManifestPart<'a>>,
}

#[derive(Serialize)]
struct ManifestPart<'a> {
    #[serde(rename = "PartNumber")]
    part_number: u32,
    #[serde(rename = "ETag")]
    etag: &'a str,
}

/// Serialize the finalize document.
///
/// Entries are written in input order. The list must be non-empty and
/// numbered exactly 1..=N; anything else means the caller lost track of its
/// parts, and the gateway would reject the document anyway.
pub fn build(parts: &[PartResult]) -> Result<String> {
    if parts.is_empty() {
        return Err(ClientError::InvalidManifest("no parts to complete".to_string()));
    }
    for (idx, part) in parts.iter().enumerate() {
        let expected = idx as u32 + 1;
        if part.part_number != expected {
            return Err(ClientError::InvalidManifest(format!(
                "entry {} has part number {}, expected {}",
                idx, part.part_number, expected
            )));
        }
        if part.etag.is_empty() {
            return Err(ClientError::InvalidManifest(format!(
                "part {} has no ETag",
                part.part_number
            )));
        }
    }

    let doc = CompleteMultipartUpload {
        parts: parts
            .iter()
            .map(|p| ManifestPart {
                part_number: p.part_number,
                etag: &p.etag,
            })
            .collect(),
    };
    quick_xml::se::to_string(&doc).map_err(|e| ClientError::XmlParse(e.to_string()))
}
