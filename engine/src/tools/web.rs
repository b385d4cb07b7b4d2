//! Web Fetch Core Tool
//!
//! Fetches an http(s) page and reduces it to a title plus bounded text.

use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::extract::{truncate_chars, ContentExtractor};
use crate::config::WebConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Status(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to initialise fetcher: {0}")]
    Setup(String),
}

/// A fetched and extracted page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub title: String,
    /// Extracted text, already truncated
    pub content: String,
}

impl FetchedPage {
    /// Human-readable summary stored as the task result
    pub fn summary(&self) -> String {
        format!("Fetched {}\n\nTitle: {}\n\n{}", self.url, self.title, self.content)
    }
}

#[derive(Debug, Clone)]
pub struct WebFetcher {
    client: reqwest::Client,
    extractor: ContentExtractor,
    max_content_chars: usize,
}

impl WebFetcher {
    pub fn new(config: &WebConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Setup(e.to_string()))?;

        let extractor = ContentExtractor::new().map_err(|e| FetchError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            extractor,
            max_content_chars: config.max_content_chars,
        })
    }

    /// Fetch `address` and extract its primary content
    pub async fn fetch(&self, address: &str) -> Result<FetchedPage, FetchError> {
        let url = validate_url(address)?;
        info!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Request(format!("Failed to read response body: {}", e))
            }
        })?;
        debug!("Fetched {} bytes from {}", body.len(), final_url);

        let extracted = self.extractor.extract(&body);

        Ok(FetchedPage {
            url: final_url,
            title: extracted.title,
            content: truncate_chars(&extracted.text, self.max_content_chars),
        })
    }
}

/// Parse an address and require an http(s) scheme
fn validate_url(address: &str) -> Result<url::Url, FetchError> {
    let url = url::Url::parse(address.trim()).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    }
}
