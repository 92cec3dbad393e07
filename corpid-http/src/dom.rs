//! Typed query surface over a parsed HTML document.
//!
//! Extraction code talks to [`DocumentTree`] / [`ElementView`] only, so it
//! never depends on the parser directly. [`HtmlTree`] is the `scraper`-backed
//! implementation produced by the fetcher.

use scraper::{ElementRef, Html, Selector};

/// Text inside these elements is never part of the readable text.
const NON_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

pub trait DocumentTree {
    type Element<'a>: ElementView<'a>
    where
        Self: 'a;

    /// First element in document order matching a CSS selector.
    fn query_selector(&self, selector: &str) -> Option<Self::Element<'_>>;

    /// Every element matching a CSS selector, in document order.
    fn query_selector_all(&self, selector: &str) -> Vec<Self::Element<'_>>;
}

pub trait ElementView<'a>: Sized + Copy {
    /// Lowercase local name, e.g. `h1`.
    fn tag_name(&self) -> &'a str;

    fn attribute(&self, name: &str) -> Option<&'a str>;

    /// Concatenated descendant text, skipping script-like elements.
    fn text_content(&self) -> String;

    /// Element siblings after this one, nearest first.
    fn next_element_siblings(&self) -> Vec<Self>;

    /// Matching descendants of this element, in document order.
    fn query_selector_all(&self, selector: &str) -> Vec<Self>;
}

/// A parsed HTML document.
pub struct HtmlTree {
    html: Html,
}

impl std::fmt::Debug for HtmlTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlTree")
            .field("errors", &self.html.errors.len())
            .finish()
    }
}

impl HtmlTree {
    /// Parse already-decoded markup. Parsing never fails; malformed input is repaired.
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }
}

/// Selectors in this crate are static strings, so a parse failure is a bug
/// worth a log line rather than an error path.
fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::warn!(selector, error = %e, "dom.selector.invalid");
            None
        }
    }
}

impl DocumentTree for HtmlTree {
    type Element<'a> = HtmlElement<'a>;

    fn query_selector(&self, selector: &str) -> Option<HtmlElement<'_>> {
        let sel = compile(selector)?;
        self.html.select(&sel).next().map(HtmlElement)
    }

    fn query_selector_all(&self, selector: &str) -> Vec<HtmlElement<'_>> {
        match compile(selector) {
            Some(sel) => self.html.select(&sel).map(HtmlElement).collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HtmlElement<'a>(ElementRef<'a>);

impl<'a> ElementView<'a> for HtmlElement<'a> {
    fn tag_name(&self) -> &'a str {
        self.0.value().name()
    }

    fn attribute(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self.0, &mut out);
        out
    }

    fn next_element_siblings(&self) -> Vec<Self> {
        self.0
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .map(HtmlElement)
            .collect()
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Self> {
        match compile(selector) {
            Some(sel) => self.0.select(&sel).map(HtmlElement).collect(),
            None => Vec::new(),
        }
    }
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !NON_TEXT_ELEMENTS.contains(&child_el.value().name()) {
                collect_text(child_el, out);
            }
        }
    }
}
