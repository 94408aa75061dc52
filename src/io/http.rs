use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use crate::error::CollectorError;
use crate::text::decode_document;

/// Per-request timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest response body accepted when none is configured (64 MiB)
pub const DEFAULT_MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Plain GET client for catalog pages and archives.
///
/// Requests are issued one at a time and never retried; every body is
/// buffered in memory up to `max_body_bytes`.
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: u64,
    transferred_bytes: AtomicU64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_body_bytes: u64) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            max_body_bytes,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Get total body bytes received so far
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// Fetch a resource and return its raw body
    pub async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>, CollectorError> {
        let resp = self.send(url).await?;
        self.read_body(url, resp).await
    }

    /// Fetch a markup document and decode it to a `String`.
    ///
    /// The charset is taken from the `Content-Type` header, then from a
    /// `<meta>` declaration, then defaults to UTF-8. A body that is not
    /// valid in that charset is a parse error rather than being patched up
    /// with replacement characters.
    pub async fn get_document(&self, url: &Url) -> Result<String, CollectorError> {
        let resp = self.send(url).await?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = self.read_body(url, resp).await?;

        decode_document(&body, content_type.as_deref())
            .map_err(|reason| CollectorError::parse(url.as_str(), reason))
    }

    async fn send(&self, url: &Url) -> Result<Response, CollectorError> {
        debug!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CollectorError::fetch(url.as_str(), e))?;

        if !resp.status().is_success() {
            return Err(CollectorError::HttpStatus {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        if let Some(len) = resp.content_length() {
            if len > self.max_body_bytes {
                return Err(self.too_large(url, len));
            }
        }

        Ok(resp)
    }

    async fn read_body(&self, url: &Url, mut resp: Response) -> Result<Vec<u8>, CollectorError> {
        let mut body = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| CollectorError::fetch(url.as_str(), e))?
        {
            body.extend_from_slice(&chunk);
            self.transferred_bytes
                .fetch_add(chunk.len() as u64, Ordering::Relaxed);

            if body.len() as u64 > self.max_body_bytes {
                return Err(self.too_large(url, body.len() as u64));
            }
        }

        trace!(%url, bytes = body.len(), "body received");
        Ok(body)
    }

    fn too_large(&self, url: &Url, size: u64) -> CollectorError {
        CollectorError::TooLarge {
            url: url.to_string(),
            size,
            limit: self.max_body_bytes,
        }
    }
}
