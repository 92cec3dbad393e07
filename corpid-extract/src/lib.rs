//! Company identity extraction from fetched pages.
//!
//! - Name cascade over title, OGP, headings, logo alt text, meta description
//!   and finally the domain (`strategy`)
//! - Name and description cleaning (`clean`, `description`)
//! - Host and name normalization helpers (`domain`)
//! - Fetch + extract composition for callers that start from a URL (`pipeline`)
//!
//! Extraction is a pure function of the document; the only time input is the
//! injected [`Clock`].
//!
//! Example:
//! ```rust
//! use corpid_common::ExtractSettings;
//! use corpid_extract::{CompanyExtractor, ExtractResult};
//! use corpid_http::FetchedDocument;
//! use url::Url;
//!
//! let url = Url::parse("https://example.co.jp/").unwrap();
//! let html = "<html><head><title>株式会社サンプル｜企業情報</title></head></html>";
//! let doc = FetchedDocument::from_bytes(url.clone(), url, html.into(), Some("text/html"), 1000);
//!
//! let result = CompanyExtractor::new(ExtractSettings::default()).extract(&doc);
//! match result {
//!     ExtractResult::Success { data, confidence } => {
//!         assert_eq!(data.name, "サンプル株式会社");
//!         assert_eq!(confidence, 0.90);
//!     }
//!     ExtractResult::Failure { reason, .. } => panic!("{reason}"),
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use corpid_common::ExtractSettings;
use corpid_http::dom::{DocumentTree, HtmlTree};
use corpid_http::reduce::MetaMap;
use corpid_http::{FetchError, FetchedDocument};
use serde::{Serialize, Serializer};
use thiserror::Error;
use url::Url;

pub mod clean;
pub mod description;
pub mod domain;
pub mod pipeline;
pub mod strategy;

pub use pipeline::CompanyPipeline;
pub use strategy::{ExtractionMethod, Strategy};

// ==============================
// Data model
// ==============================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSource {
    pub method: ExtractionMethod,
    pub strategy: Strategy,
    pub confidence: f64,
    /// `false` when the name was synthesized rather than read from the page.
    pub verified: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: String,
    pub original_url: String,
    pub top_page_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_description: Option<String>,
    pub meta_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    pub extraction_source: ExtractionSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractFailure {
    #[error("no company name found at {url}")]
    NoCompanyNameFound { url: String },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Outcome of one extraction. Serializes as `{ success, data?, error?, confidence }`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractResult {
    Success {
        data: CompanyInfo,
        confidence: f64,
    },
    Failure {
        reason: ExtractFailure,
        timestamp: DateTime<Utc>,
    },
}

impl ExtractResult {
    /// The winning tier's constant on success, `0.0` on failure.
    pub fn confidence(&self) -> f64 {
        match self {
            ExtractResult::Success { confidence, .. } => *confidence,
            ExtractResult::Failure { .. } => 0.0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExtractResult::Success { .. })
    }

    pub fn data(&self) -> Option<&CompanyInfo> {
        match self {
            ExtractResult::Success { data, .. } => Some(data),
            ExtractResult::Failure { .. } => None,
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a CompanyInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    confidence: f64,
}

impl Serialize for ExtractResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let error = match self {
            ExtractResult::Failure { reason, .. } => Some(reason.to_string()),
            ExtractResult::Success { .. } => None,
        };
        Envelope {
            success: self.is_success(),
            data: self.data(),
            error,
            confidence: self.confidence(),
        }
        .serialize(serializer)
    }
}

// ==============================
// Clock
// ==============================

pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant. For reproducible output.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ==============================
// Extractor
// ==============================

/// What the extractor reads from a page. Borrowed, so any [`DocumentTree`]
/// implementation can be fed without building a [`FetchedDocument`].
pub struct PageView<'d, D: DocumentTree> {
    pub tree: &'d D,
    pub title: &'d str,
    pub meta: &'d MetaMap,
    /// Reported as `originalUrl`.
    pub requested_url: &'d Url,
    /// Source of `topPageUrl` and the domain fallback.
    pub final_url: &'d Url,
}

impl<'d> From<&'d FetchedDocument> for PageView<'d, HtmlTree> {
    fn from(doc: &'d FetchedDocument) -> Self {
        Self {
            tree: &doc.tree,
            title: &doc.title,
            meta: &doc.meta,
            requested_url: &doc.requested_url,
            final_url: &doc.final_url,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompanyExtractor {
    settings: ExtractSettings,
    clock: Arc<dyn Clock>,
}

impl CompanyExtractor {
    pub fn new(settings: ExtractSettings) -> Self {
        Self {
            settings,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn settings(&self) -> &ExtractSettings {
        &self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn extract(&self, doc: &FetchedDocument) -> ExtractResult {
        let page: PageView<'_, HtmlTree> = doc.into();
        self.extract_page(&page)
    }

    /// Walk the name cascade; the first strategy yielding a clean name wins
    /// and its tier constant becomes the confidence.
    pub fn extract_page<D: DocumentTree>(&self, page: &PageView<'_, D>) -> ExtractResult {
        let timestamp = self.clock.now();

        for step in strategy::name_cascade::<D>() {
            let Some(name) = (step.extract)(page, &self.settings) else {
                tracing::trace!(strategy = step.strategy.as_str(), "extract.name.miss");
                continue;
            };

            let strategy = step.strategy;
            tracing::debug!(
                url = %page.requested_url,
                strategy = strategy.as_str(),
                confidence = strategy.confidence(),
                %name,
                "extract.name.matched"
            );

            let meta_title = match page.title.trim() {
                "" => name.clone(),
                title => title.to_string(),
            };
            let data = CompanyInfo {
                original_url: page.requested_url.to_string(),
                top_page_url: domain::top_page_url(page.final_url),
                business_description: description::extract_description(
                    page.tree,
                    page.meta,
                    self.settings.description_max_chars,
                ),
                meta_title,
                meta_description: page
                    .meta
                    .get("description")
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
                extraction_source: ExtractionSource {
                    method: strategy.method(),
                    strategy,
                    confidence: strategy.confidence(),
                    verified: strategy.verified(),
                    timestamp,
                },
                name,
            };
            return ExtractResult::Success {
                data,
                confidence: strategy.confidence(),
            };
        }

        tracing::info!(url = %page.requested_url, "extract.name.not_found");
        ExtractResult::Failure {
            reason: ExtractFailure::NoCompanyNameFound {
                url: page.requested_url.to_string(),
            },
            timestamp,
        }
    }
}

impl Default for CompanyExtractor {
    fn default() -> Self {
        Self::new(ExtractSettings::default())
    }
}
