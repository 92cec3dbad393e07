//! HTML fetcher and normalizer for company websites.
//!
//! - URL validation before any network activity
//! - Timed GET with browser-like headers, redirect following and a body cap
//! - Charset cascade with an explicit decode / inspect / re-decode sequence
//! - Parsed document tree plus title, meta map and main text
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), corpid_http::FetchError> {
//! use corpid_common::FetchSettings;
//!
//! let fetcher = corpid_http::HtmlFetcher::new(FetchSettings::default())?;
//! let doc = fetcher.fetch("https://example.co.jp/").await?;
//! println!("{} ({})", doc.title, doc.charset.label);
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, charset resolution, timeouts and final errors. Every
//! fetch carries a `req_id`.

use std::time::Instant;

use async_trait::async_trait;
use corpid_common::FetchSettings;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, redirect};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

pub mod charset;
pub mod document;
pub mod dom;
pub mod envelope;
pub mod reduce;

pub use document::FetchedDocument;
pub use envelope::{ErrorBody, FetchResponse, HtmlContent};

/// Media types accepted as HTML.
const HTML_MEDIA_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

// ==============================
// Errors
// ==============================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("timed out after {budget_ms}ms fetching {url}")]
    Timeout { url: String, budget_ms: u64 },
    #[error("fetch cancelled: {url}")]
    Cancelled { url: String },
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("not an HTML document ({content_type}) at {url}")]
    NotHtml { url: String, content_type: String },
    #[error("unsupported charset {charset:?}")]
    DecodeFailure { charset: String },
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },
    #[error("client build failed: {0}")]
    Build(String),
}

impl FetchError {
    /// Worth one more attempt by the caller. Status and content-type
    /// rejections will not change on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Timeout { .. } | FetchError::Network { .. })
    }
}

// ==============================
// Fetcher seam
// ==============================

/// Anything that can turn a URL into a [`FetchedDocument`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<FetchedDocument, FetchError>;
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HtmlFetcher {
    inner: Client,
    settings: FetchSettings,
}

struct RawResponse {
    final_url: Url,
    content_type: Option<String>,
    body: Vec<u8>,
    truncated: bool,
}

impl HtmlFetcher {
    /// Build a fetcher. Idle connections are not kept, so nothing outlives a request.
    ///
    /// ```no_run
    /// use corpid_common::FetchSettings;
    /// use corpid_http::{FetchError, HtmlFetcher};
    /// use std::time::Duration;
    ///
    /// let fetcher = HtmlFetcher::new(FetchSettings::default())?;
    /// assert_eq!(fetcher.settings().timeout(), Duration::from_secs(5));
    /// # Ok::<(), FetchError>(())
    /// ```
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value(&settings.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header_value(&settings.accept_language)?);

        let inner = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .redirect(redirect::Policy::limited(settings.max_redirects))
            .connect_timeout(settings.connect_timeout())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| FetchError::Build(e.to_string()))?;

        Ok(Self { inner, settings })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetch and normalize one page within the configured time budget.
    pub async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        self.fetch_with_cancel(url, &CancellationToken::new()).await
    }

    /// Like [`fetch`](Self::fetch), but also aborts as soon as `cancel` fires.
    /// Either way the in-flight request is dropped and no document is built.
    pub async fn fetch_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedDocument, FetchError> {
        let requested = validate_url(url)?;
        let req_id = Uuid::new_v4();
        let budget = self.settings.timeout();

        tracing::debug!(
            %req_id,
            url = %requested,
            timeout_ms = budget.as_millis() as u64,
            "fetch.request.start"
        );

        let t0 = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(%req_id, url = %requested, "fetch.cancelled");
                return Err(FetchError::Cancelled { url: requested.to_string() });
            }
            res = tokio::time::timeout(budget, self.exchange(&requested, req_id)) => res,
        };

        let raw = match outcome {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => {
                tracing::warn!(%req_id, url = %requested, error = %err, "fetch.error");
                return Err(err);
            }
            Err(_elapsed) => {
                tracing::warn!(
                    %req_id,
                    url = %requested,
                    timeout_ms = budget.as_millis() as u64,
                    "fetch.timeout"
                );
                return Err(FetchError::Timeout {
                    url: requested.to_string(),
                    budget_ms: budget.as_millis() as u64,
                });
            }
        };

        let body_len = raw.body.len();
        let doc = FetchedDocument::from_bytes(
            requested,
            raw.final_url,
            raw.body,
            raw.content_type.as_deref(),
            self.settings.content_max_chars,
        );

        tracing::info!(
            %req_id,
            url = %doc.final_url,
            duration_ms = t0.elapsed().as_millis() as u64,
            body_len,
            truncated = raw.truncated,
            charset = %doc.charset.label,
            "fetch.done"
        );
        Ok(doc)
    }

    async fn exchange(&self, url: &Url, req_id: Uuid) -> Result<RawResponse, FetchError> {
        let mut resp = self
            .inner
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(url, &e, &self.settings))?;

        let status = resp.status();
        let final_url = resp.url().clone();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        tracing::debug!(
            %req_id,
            %status,
            final_url = %final_url,
            content_type = content_type.as_deref().unwrap_or("-"),
            "fetch.response.headers"
        );

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if !content_type.as_deref().is_some_and(is_html) {
            return Err(FetchError::NotHtml {
                url: url.to_string(),
                content_type: content_type.unwrap_or_else(|| "missing".to_string()),
            });
        }

        let max = self.settings.max_body_bytes;
        let mut body = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| transport_error(url, &e, &self.settings))?
        {
            let room = max.saturating_sub(body.len());
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }
        if truncated {
            tracing::warn!(%req_id, max_body_bytes = max, "fetch.body.truncated");
        }

        Ok(RawResponse {
            final_url,
            content_type,
            body,
            truncated,
        })
    }
}

#[async_trait]
impl PageFetcher for HtmlFetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        self.fetch(url).await
    }
}

// ==============================
// Helpers
// ==============================

/// Absolute `http`/`https` URL with a host, or [`FetchError::InvalidUrl`].
pub fn validate_url(raw: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// `text/html; charset=...` and friends.
pub fn is_html(content_type: &str) -> bool {
    let media = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    HTML_MEDIA_TYPES.contains(&media.as_str())
}

fn header_value(raw: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(raw).map_err(|e| FetchError::Build(format!("invalid header {raw:?}: {e}")))
}

fn transport_error(url: &Url, err: &reqwest::Error, settings: &FetchSettings) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout {
            url: url.to_string(),
            budget_ms: settings.timeout_ms,
        };
    }
    FetchError::Network {
        url: url.to_string(),
        message: error_chain(err),
    }
}

/// `reqwest` hides the interesting part (DNS, TLS, refused) in the source chain.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
