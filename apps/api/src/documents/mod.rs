//! Document text extraction: fetches a resume PDF and turns it into plain text.
//!
//! Two fetch paths: credentialed object storage for virtual-hosted S3 URLs,
//! plain HTTP GET (bounded redirects) for everything else. The full body is
//! read into memory and decoded with `pdf-extract`. Text comes out in
//! content-stream order, which is not guaranteed to match the visual order of
//! multi-column layouts. Nothing is cached; every call re-fetches.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tracing::{debug, info};

pub mod location;
pub mod upload;

use location::DocumentLocation;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("invalid document URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("document unreachable: {0}")]
    Unreachable(String),

    #[error("document request returned HTTP {status}")]
    Status { status: u16 },

    #[error("object storage error: {0}")]
    ObjectStorage(String),

    #[error("document is empty")]
    Empty,

    #[error("could not decode PDF: {0}")]
    Decode(String),

    #[error("document fetch timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Turns a document URI into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, uri: &str) -> Result<String, ExtractionError>;
}

/// Production extractor: S3 or HTTP fetch followed by PDF decoding.
#[derive(Clone)]
pub struct PdfExtractor {
    http: Client,
    s3: S3Client,
    fetch_timeout: Duration,
}

impl PdfExtractor {
    pub fn new(
        s3: S3Client,
        fetch_timeout: Duration,
        max_redirects: usize,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .redirect(redirect_policy(max_redirects))
            .build()?;
        Ok(Self {
            http,
            s3,
            fetch_timeout,
        })
    }

    async fn fetch(&self, location: &DocumentLocation) -> Result<Bytes, ExtractionError> {
        match location {
            DocumentLocation::ObjectStorage { bucket, key } => self.fetch_object(bucket, key).await,
            DocumentLocation::Http(url) => self.fetch_http(url).await,
        }
    }

    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<Bytes, ExtractionError> {
        debug!("Downloading from object storage: bucket={bucket}, key={key}");
        let output = self
            .s3
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ExtractionError::ObjectStorage(DisplayErrorContext(&e).to_string()))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| ExtractionError::ObjectStorage(e.to_string()))?;
        Ok(data.into_bytes())
    }

    async fn fetch_http(&self, url: &Url) -> Result<Bytes, ExtractionError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ExtractionError::Unreachable(describe_reqwest_error(&e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ExtractionError::Status {
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| ExtractionError::Unreachable(describe_reqwest_error(&e)))
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, uri: &str) -> Result<String, ExtractionError> {
        let location = DocumentLocation::parse(uri)?;
        info!("Extracting document text from: {uri}");

        let bytes = tokio::time::timeout(self.fetch_timeout, self.fetch(&location))
            .await
            .map_err(|_| ExtractionError::Timeout {
                secs: self.fetch_timeout.as_secs(),
            })??;
        debug!("Downloaded document, size: {} bytes", bytes.len());

        let text = decode_pdf(bytes).await?;
        info!("Document extraction successful, text length: {}", text.len());
        Ok(text)
    }
}

/// Follows at most `max_redirects` hops and refuses to revisit a URL.
fn redirect_policy(max_redirects: usize) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            attempt.error("too many redirects")
        } else if attempt.previous().contains(attempt.url()) {
            attempt.error("redirect loop detected")
        } else {
            attempt.follow()
        }
    })
}

/// reqwest's top-level Display hides the interesting part (e.g. which redirect
/// rule fired); walk the source chain.
fn describe_reqwest_error(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// Decodes PDF bytes into linear text on the blocking pool. A decoder panic on
/// malformed input is reported as a decode failure.
pub async fn decode_pdf(bytes: Bytes) -> Result<String, ExtractionError> {
    if bytes.is_empty() {
        return Err(ExtractionError::Empty);
    }
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ExtractionError::Decode(format!("decoder aborted: {e}")))?
        .map_err(|e| ExtractionError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::testing::offline_s3_client;

    /// Serves the same raw HTTP response to every connection.
    async fn serve_raw(make_response: impl Fn(SocketAddr) -> String) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = make_response(addr);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let response = response.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        addr
    }

    fn extractor(timeout: Duration) -> PdfExtractor {
        PdfExtractor::new(offline_s3_client(), timeout, 5).unwrap()
    }

    #[tokio::test]
    async fn test_decode_empty_bytes_is_empty_error() {
        let result = decode_pdf(Bytes::new()).await;
        assert!(matches!(result, Err(ExtractionError::Empty)));
    }

    #[tokio::test]
    async fn test_decode_non_pdf_is_decode_error() {
        let result = decode_pdf(Bytes::from_static(b"hello, this is not a pdf")).await;
        assert!(matches!(result, Err(ExtractionError::Decode(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = extractor(Duration::from_secs(5))
            .extract(&format!("http://{addr}/cv.pdf"))
            .await;
        assert!(matches!(result, Err(ExtractionError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_non_200_status_fails() {
        let addr = serve_raw(|_| {
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
        })
        .await;

        let result = extractor(Duration::from_secs(5))
            .extract(&format!("http://{addr}/missing.pdf"))
            .await;
        assert!(matches!(result, Err(ExtractionError::Status { status: 404 })));
    }

    #[tokio::test]
    async fn test_redirect_loop_fails_instead_of_spinning() {
        let addr = serve_raw(|addr| {
            format!(
                "HTTP/1.1 302 Found\r\nLocation: http://{addr}/loop.pdf\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            )
        })
        .await;

        let result = extractor(Duration::from_secs(5))
            .extract(&format!("http://{addr}/loop.pdf"))
            .await;
        match result {
            Err(ExtractionError::Unreachable(message)) => {
                assert!(message.contains("redirect"), "unexpected message: {message}")
            }
            other => panic!("expected redirect failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_pdf_body_fails_to_decode() {
        let addr = serve_raw(|_| {
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 13\r\nConnection: close\r\n\r\n<html></html>"
                .to_string()
        })
        .await;

        let result = extractor(Duration::from_secs(5))
            .extract(&format!("http://{addr}/cv.pdf"))
            .await;
        assert!(matches!(result, Err(ExtractionError::Decode(_))));
    }

    #[tokio::test]
    async fn test_stalled_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let result = extractor(Duration::from_millis(200))
            .extract(&format!("http://{addr}/slow.pdf"))
            .await;
        assert!(matches!(result, Err(ExtractionError::Timeout { .. })));
    }
}
