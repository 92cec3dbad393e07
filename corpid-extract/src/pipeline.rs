//! URL in, [`ExtractResult`] out.

use std::sync::Arc;

use corpid_http::PageFetcher;

use crate::{CompanyExtractor, ExtractFailure, ExtractResult};

/// Any [`PageFetcher`] composed with a [`CompanyExtractor`].
///
/// Fetch failures come back as `ExtractResult::Failure` with the
/// [`FetchError`](corpid_http::FetchError) intact, so callers can consult
/// `is_retryable()` before trying the URL again. Nothing is retried here.
#[derive(Clone)]
pub struct CompanyPipeline {
    fetcher: Arc<dyn PageFetcher>,
    extractor: CompanyExtractor,
}

impl CompanyPipeline {
    pub fn new(fetcher: Arc<dyn PageFetcher>, extractor: CompanyExtractor) -> Self {
        Self { fetcher, extractor }
    }

    pub fn extractor(&self) -> &CompanyExtractor {
        &self.extractor
    }

    pub async fn run(&self, url: &str) -> ExtractResult {
        let doc = match self.fetcher.fetch_page(url).await {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(
                    url,
                    error = %err,
                    retryable = err.is_retryable(),
                    "extract.fetch_failed"
                );
                return ExtractResult::Failure {
                    reason: ExtractFailure::Fetch(err),
                    timestamp: self.extractor.now(),
                };
            }
        };
        self.extractor.extract(&doc)
    }
}
