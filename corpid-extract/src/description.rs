//! Business description lookup, independent of the name cascade.

use corpid_http::dom::{DocumentTree, ElementView};
use corpid_http::reduce::MetaMap;

use crate::clean::clean_description;

const ABOUT_SELECTOR: &str = ".company-about, .about-company, #company-profile, #about-us";

/// First non-empty of: meta `description`, `og:description`, an about/profile
/// container, the first `<p>` after the first `<h1>`. Cleaned and capped at
/// `max_chars`.
pub fn extract_description<D: DocumentTree>(tree: &D, meta: &MetaMap, max_chars: usize) -> Option<String> {
    let candidates = [
        meta.get("description").cloned(),
        meta.get("og:description").cloned(),
        tree.query_selector(ABOUT_SELECTOR).map(|el| el.text_content()),
        paragraph_after_heading(tree),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(|raw| clean_description(&raw, max_chars))
        .find(|text| !text.is_empty())
}

fn paragraph_after_heading<D: DocumentTree>(tree: &D) -> Option<String> {
    let h1 = tree.query_selector("h1")?;
    h1.next_element_siblings()
        .into_iter()
        .filter(|el| el.tag_name().eq_ignore_ascii_case("p"))
        .map(|el| el.text_content())
        .find(|text| !text.trim().is_empty())
}
