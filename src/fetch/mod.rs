//! JSON-over-HTTP fetching.
//!
//! One GET per call, nothing kept between calls. Status handling and body
//! decoding are plain functions so they can be checked without a server.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Seconds to report when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// How much of a non-JSON body to keep for the error message.
const BODY_PREVIEW_CHARS: usize = 80;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },

    #[error("Response is not JSON ({content_type}): {source}; body starts with {preview:?}")]
    NotJson {
        content_type: String,
        preview: String,
        source: serde_json::Error,
    },
}

impl FetchError {
    /// HTTP status code behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::RateLimited { .. } => Some(429),
            FetchError::HttpStatus { status, .. } => Some(*status),
            FetchError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Largest body accepted, in bytes
    pub max_content_size: usize,

    pub timeout: Duration,

    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_content_size: 50 * 1024 * 1024,
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// HTTP client that GETs JSON documents.
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("fangraphs-extractor/0.1.0")),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// GET `url` and decode the body as JSON.
    pub async fn get_json(&self, url: &Url) -> Result<Value, FetchError> {
        info!("Fetching {}", url);
        let response = self.client.get(url.as_str()).send().await?;

        check_status(
            response.status(),
            response.headers(),
            url.host_str().unwrap_or("unknown"),
        )?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let body = response.bytes().await?;
        if body.len() > self.config.max_content_size {
            return Err(FetchError::ContentTooLarge {
                size: body.len(),
                max_size: self.config.max_content_size,
            });
        }

        debug!("Received {} bytes ({})", body.len(), content_type);
        decode_json(&body, &content_type)
    }
}

/// Map a non-success status to an error. 429 reads `Retry-After`.
pub fn check_status(
    status: StatusCode,
    headers: &HeaderMap,
    host: &str,
) -> Result<(), FetchError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

        return Err(FetchError::RateLimited {
            host: host.to_string(),
            retry_after_secs,
        });
    }

    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    Ok(())
}

/// Decode a response body. An HTML page served with 200 (a stale build id
/// does this) comes back as `NotJson`.
pub fn decode_json(body: &[u8], content_type: &str) -> Result<Value, FetchError> {
    serde_json::from_slice(body).map_err(|source| FetchError::NotJson {
        content_type: content_type.to_string(),
        preview: String::from_utf8_lossy(body)
            .chars()
            .take(BODY_PREVIEW_CHARS)
            .collect(),
        source,
    })
}
