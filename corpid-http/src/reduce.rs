//! Reduce a parsed page to title, meta map and readable main text.

use std::collections::BTreeMap;

use crate::dom::{DocumentTree, ElementView};

/// Conventional main-content containers; the first match in document order wins.
const MAIN_CONTENT_SELECTOR: &str = "main, article, .main, #main, .content, #content";

pub type MetaMap = BTreeMap<String, String>;

/// `<meta name|property=... content=...>` pairs. `name` is preferred as the
/// key when both are present; later duplicates overwrite earlier ones.
pub fn meta_map<D: DocumentTree>(tree: &D) -> MetaMap {
    let mut meta = MetaMap::new();
    for el in tree.query_selector_all("meta") {
        let key = el
            .attribute("name")
            .filter(|k| !k.is_empty())
            .or_else(|| el.attribute("property").filter(|k| !k.is_empty()));
        let content = el.attribute("content").filter(|c| !c.is_empty());
        if let (Some(key), Some(content)) = (key, content) {
            meta.insert(key.to_string(), content.to_string());
        }
    }
    meta
}

/// `<title>`, then `og:title`, then `twitter:title`; first non-empty wins.
pub fn page_title<D: DocumentTree>(tree: &D, meta: &MetaMap) -> String {
    let from_tag = tree
        .query_selector("title")
        .map(|t| t.text_content().trim().to_string())
        .filter(|t| !t.is_empty());
    from_tag
        .or_else(|| {
            ["og:title", "twitter:title"]
                .iter()
                .filter_map(|k| meta.get(*k))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        })
        .unwrap_or_default()
}

/// Generic "page text" payload: the main container if there is one, else `<body>`.
pub fn main_content<D: DocumentTree>(tree: &D, max_chars: usize) -> String {
    let text = tree
        .query_selector(MAIN_CONTENT_SELECTOR)
        .or_else(|| tree.query_selector("body"))
        .map(|el| el.text_content())
        .unwrap_or_default();
    truncate_chars(&collapse_whitespace(&text), max_chars)
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate on a char boundary to at most `max` chars.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
