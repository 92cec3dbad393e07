use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use corpid_config::CorpidConfig;
use corpid_extract::{CompanyExtractor, CompanyPipeline};
use corpid_http::{FetchResponse, HtmlFetcher};
use futures::StreamExt;
use futures::stream;

/// `corpid fetch <URL>`: the Fetcher envelope with its status code.
pub async fn fetch(cfg: &CorpidConfig, url: &str) -> Result<()> {
    let fetcher = HtmlFetcher::new(cfg.fetch.clone()).context("building HTTP client")?;
    let result = fetcher.fetch(url).await;
    let response = FetchResponse::from_result(&result);

    let line = serde_json::json!({
        "status": response.status,
        "body": response.body,
    });
    println!("{}", serde_json::to_string_pretty(&line)?);
    Ok(())
}

/// `corpid extract <URL>...`: run the pipeline over every URL with bounded
/// concurrency and print one JSON envelope per line.
pub async fn extract(cfg: &CorpidConfig, urls: Vec<String>, concurrency: usize) -> Result<()> {
    let fetcher = HtmlFetcher::new(cfg.fetch.clone()).context("building HTTP client")?;
    let extractor = CompanyExtractor::new(cfg.extract.clone());
    let pipeline = CompanyPipeline::new(Arc::new(fetcher), extractor);

    let total = urls.len();
    let mut succeeded = 0usize;
    let mut results = stream::iter(urls)
        .map(|url| {
            let pipeline = pipeline.clone();
            async move {
                let result = pipeline.run(&url).await;
                (url, result)
            }
        })
        .buffered(concurrency.max(1));

    let stdout = std::io::stdout();
    while let Some((url, result)) = results.next().await {
        if result.is_success() {
            succeeded += 1;
        }
        let line = serde_json::to_string(&result).with_context(|| format!("serializing result for {url}"))?;
        let mut out = stdout.lock();
        writeln!(out, "{line}")?;
    }

    tracing::info!(total, succeeded, failed = total - succeeded, "extract.batch.done");
    Ok(())
}
