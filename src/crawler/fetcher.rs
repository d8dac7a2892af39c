//! Fetch capability
//!
//! This module defines the boundary between the crawl orchestration and the
//! network:
//! - The [`Fetcher`] trait that turns a URL into a [`Page`] or a [`FetchError`]
//! - [`HttpFetcher`], the reqwest-backed implementation used by the binary
//! - Building HTTP clients with proper user agent strings and timeouts
//!
//! Link extraction sits on the fetcher's side of the boundary: a successful
//! fetch hands back the page's outbound links already resolved to absolute
//! URL strings.

use crate::config::{Config, HttpConfig, UserAgentConfig};
use crate::crawler::parser::extract_links;
use crate::url::RelativeLinks;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// A successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// The URL the page was requested with
    pub url: String,

    /// Outbound links in order of appearance
    pub links: Vec<String>,
}

/// Errors a single fetch can end with
///
/// A fetch error only abandons the branch of the crawl rooted at that URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("{url} is unavailable: {reason}")]
    Unavailable { url: String, reason: String },
}

impl FetchError {
    /// The URL whose fetch failed
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. }
            | Self::Timeout { url }
            | Self::Body { url, .. }
            | Self::Unavailable { url, .. } => url,
        }
    }
}

/// Turns a URL into a page body's outbound links, or fails
///
/// Implementations must be shareable across the concurrently running crawl
/// tasks.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` and returns the page with its outbound links
    async fn fetch(&self, url: &str) -> Result<Page, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `http` - Timeout configuration
///
/// # Example
///
/// ```no_run
/// use ripple_crawl::config::{HttpConfig, UserAgentConfig};
/// use ripple_crawl::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    http: &HttpConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(http.request_timeout_secs))
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher that issues a single GET per URL over HTTP(S)
///
/// | Outcome                    | Result                      |
/// |----------------------------|-----------------------------|
/// | Any status, readable body  | `Ok(Page)`                  |
/// | Request or connect timeout | `FetchError::Timeout`       |
/// | Other transport failure    | `FetchError::Request`       |
/// | Body read failure          | `FetchError::Body`          |
///
/// There is no retry: every failure is final for that URL.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    relative: RelativeLinks,
}

impl HttpFetcher {
    /// Creates a fetcher around an existing client
    pub fn new(client: Client, relative: RelativeLinks) -> Self {
        Self { client, relative }
    }

    /// Builds the client from configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, &config.http)?;
        Ok(Self::new(client, config.crawler.relative_links))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        // An error status still carries a body whose links are followed
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} answered with HTTP {}", url, status.as_u16());
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let links = extract_links(url, &body, self.relative);
        tracing::trace!("{} yielded {} links", url, links.len());

        Ok(Page {
            url: url.to_string(),
            links,
        })
    }
}

/// Maps a reqwest send error onto the fetch error taxonomy
fn classify_request_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}
