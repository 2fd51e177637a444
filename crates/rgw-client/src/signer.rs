//! AWS Signature Version 4 query-string presigning
//!
//! Every request leaves with its signature in the query string and an
//! `X-Amz-Expires` bound, so a captured URL stops working once the configured
//! validity window has passed. Only `host` is signed and the payload is
//! declared `UNSIGNED-PAYLOAD`, which lets part bodies stream without being
//! hashed up front.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Presigns gateway requests with SigV4 query parameters
#[derive(Clone)]
pub struct Presigner {
    access_key_id: String,
    region: String,
    service: String,
    /// "AWS4" + secret key
    aws4_key: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for Presigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presigner")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Presigner {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: &str,
        region: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            region: region.into(),
            service: "s3".to_string(),
            aws4_key: format!("AWS4{}", secret_access_key).into_bytes(),
            ttl,
        }
    }

    /// Build the signed query string for a request.
    ///
    /// `canonical_uri` must already be URI-encoded (see [`encode_path`]);
    /// `params` are raw, unencoded request parameters. The result contains the
    /// request parameters and the `X-Amz-*` signing parameters, ready to be
    /// appended after `?`.
    pub fn presign(
        &self,
        method: &str,
        host: &str,
        canonical_uri: &str,
        params: &[(String, String)],
        now: DateTime<Utc>,
    ) -> String {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();
        let credential_scope =
            format!("{}/{}/{}/aws4_request", date_stamp, self.region, self.service);

        let mut query: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (uri_encode(k, true), uri_encode(v, true)))
            .collect();
        let signing_params = [
            ("X-Amz-Algorithm", ALGORITHM.to_string()),
            (
                "X-Amz-Credential",
                format!("{}/{}", self.access_key_id, credential_scope),
            ),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", self.ttl.as_secs().max(1).to_string()),
            ("X-Amz-SignedHeaders", "host".to_string()),
        ];
        for (k, v) in signing_params {
            query.push((k.to_string(), uri_encode(&v, true)));
        }
        query.sort();

        let canonical_query = join_query(&query);
        let canonical_request = format!(
            "{}\n{}\n{}\nhost:{}\n\nhost\n{}",
            method, canonical_uri, canonical_query, host, UNSIGNED_PAYLOAD
        );
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            credential_scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = self.derive_signing_key(&date_stamp);
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        format!("{}&X-Amz-Signature={}", canonical_query, signature)
    }

    fn derive_signing_key(&self, date_stamp: &str) -> [u8; 32] {
        let k_date = hmac_sha256(&self.aws4_key, date_stamp.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        hmac_sha256(&k_service, b"aws4_request")
    }
}

/// Encode an object path for both the request line and the canonical request.
/// Slashes separate segments and are kept.
pub fn encode_path(path: &str) -> String {
    uri_encode(path, false)
}

fn join_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn hmac_sha256(key: &[u8], msg: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(msg);
    let mut output = [0u8; 32];
    output.copy_from_slice(&mac.finalize().into_bytes());
    output
}

/// RFC 3986 encoding as SigV4 requires it
fn uri_encode(s: &str, encode_slash: bool) -> String {
    let mut result = String::with_capacity(s.len() + 16);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            b'/' if !encode_slash => result.push('/'),
            _ => {
                result.push('%');
                result.push(HEX_UPPER[(byte >> 4) as usize] as char);
                result.push(HEX_UPPER[(byte & 0xf) as usize] as char);
            }
        }
    }
    result
}
