//! Classifies document URIs into object-storage keys or plain HTTP URLs.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Url;

use crate::documents::ExtractionError;

/// Characters escaped in object keys when rendering a public URL. `/` is kept
/// so key prefixes stay readable.
const KEY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentLocation {
    /// `https://<bucket>.s3[.<region>].amazonaws.com/<key>`
    ObjectStorage { bucket: String, key: String },
    Http(Url),
}

impl DocumentLocation {
    pub fn parse(uri: &str) -> Result<Self, ExtractionError> {
        let url = Url::parse(uri).map_err(|e| ExtractionError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ExtractionError::InvalidUri {
                uri: uri.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let host = url.host_str().unwrap_or_default();
        if let Some(bucket) = object_storage_bucket(host) {
            let raw_key = url.path().trim_start_matches('/');
            let key = percent_decode_str(raw_key)
                .decode_utf8()
                .map_err(|e| ExtractionError::InvalidUri {
                    uri: uri.to_string(),
                    reason: format!("object key is not valid UTF-8: {e}"),
                })?
                .into_owned();
            if key.is_empty() {
                return Err(ExtractionError::InvalidUri {
                    uri: uri.to_string(),
                    reason: "object key is empty".to_string(),
                });
            }
            return Ok(DocumentLocation::ObjectStorage {
                bucket: bucket.to_string(),
                key,
            });
        }

        Ok(DocumentLocation::Http(url))
    }
}

/// Returns the bucket name when `host` is a virtual-hosted S3 endpoint.
fn object_storage_bucket(host: &str) -> Option<&str> {
    if !host.ends_with(".amazonaws.com") {
        return None;
    }
    let (bucket, rest) = host.split_once('.')?;
    if bucket.is_empty() || !(rest.starts_with("s3.") || rest.starts_with("s3-")) {
        return None;
    }
    Some(bucket)
}

/// Renders the URL an uploaded object is reachable at. With a custom endpoint
/// (MinIO and friends) path-style addressing is used.
pub fn object_url(bucket: &str, region: &str, endpoint: Option<&str>, key: &str) -> String {
    let encoded_key = utf8_percent_encode(key, KEY_ENCODE_SET);
    match endpoint {
        Some(endpoint) => format!("{}/{bucket}/{encoded_key}", endpoint.trim_end_matches('/')),
        None => format!("https://{bucket}.s3.{region}.amazonaws.com/{encoded_key}"),
    }
}
