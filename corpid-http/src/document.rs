//! Turn raw response bytes into a [`FetchedDocument`].
//!
//! This is the network-free half of the fetcher: given the body bytes and the
//! transport `Content-Type`, run the charset cascade, parse, and reduce.

use url::Url;

use crate::charset::{self, CharsetSignals, ResolvedCharset};
use crate::dom::HtmlTree;
use crate::reduce::{self, MetaMap};

/// One fetched and decoded page. Created per request and never shared.
#[derive(Debug)]
pub struct FetchedDocument {
    pub requested_url: Url,
    /// URL after redirects.
    pub final_url: Url,
    pub raw_bytes: Vec<u8>,
    /// Charset from the transport header, normalized.
    pub declared_charset: Option<String>,
    pub charset: ResolvedCharset,
    /// Parsed with the final charset.
    pub tree: HtmlTree,
    pub meta: MetaMap,
    pub title: String,
    /// Whitespace-collapsed main text, capped at `content_max_chars`.
    pub content: String,
}

impl FetchedDocument {
    /// Decode and parse `raw_bytes` as a page served with `content_type`.
    ///
    /// ```
    /// use corpid_http::FetchedDocument;
    /// use corpid_http::charset::CharsetSource;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://example.com/").unwrap();
    /// let html = b"<html><head><title>Example</title></head><body>Hi</body></html>".to_vec();
    /// let doc = FetchedDocument::from_bytes(url.clone(), url, html, Some("text/html"), 1000);
    ///
    /// assert_eq!(doc.title, "Example");
    /// assert_eq!(doc.charset.source, CharsetSource::Default);
    /// assert!(!doc.charset.redecoded);
    /// ```
    pub fn from_bytes(
        requested_url: Url,
        final_url: Url,
        raw_bytes: Vec<u8>,
        content_type: Option<&str>,
        content_max_chars: usize,
    ) -> Self {
        let declared_charset = content_type.and_then(charset::charset_from_content_type);

        // Pass 1: decode only far enough to read the <meta> declarations.
        let (first_label, first_text) =
            decode_or_fallback(&raw_bytes, charset::first_pass_label(declared_charset.as_deref()));
        let first_tree = HtmlTree::parse(&first_text);

        // Pass 2: resolve the cascade against what the tree declares.
        let signals = CharsetSignals::scan(&first_tree, declared_charset.clone());
        let (label, source) = signals.resolve();

        // Pass 3: re-decode only when the winner names a different decoder.
        let redecoded = !charset::same_encoding(&label, &first_label);
        let tree = if redecoded {
            let (_, text) = decode_or_fallback(&raw_bytes, &label);
            HtmlTree::parse(&text)
        } else {
            first_tree
        };

        tracing::debug!(
            url = %final_url,
            charset = %label,
            ?source,
            first_pass = %first_label,
            redecoded,
            "fetch.charset.resolved"
        );

        let meta = reduce::meta_map(&tree);
        let title = reduce::page_title(&tree, &meta);
        let content = reduce::main_content(&tree, content_max_chars);

        Self {
            requested_url,
            final_url,
            raw_bytes,
            declared_charset,
            charset: ResolvedCharset {
                label,
                source,
                first_pass_label: first_label,
                redecoded,
            },
            tree,
            meta,
            title,
            content,
        }
    }
}

/// Decode as `label`, or as UTF-8 when the runtime does not know the label.
/// Returns the label that was actually used.
fn decode_or_fallback(bytes: &[u8], label: &str) -> (String, String) {
    match charset::decode(bytes, label) {
        Ok(text) => (label.to_string(), text),
        Err(err) => {
            tracing::warn!(error = %err, "fetch.charset.decode_failure");
            (
                charset::DEFAULT_CHARSET.to_string(),
                charset::decode_lossy_utf8(bytes),
            )
        }
    }
}
