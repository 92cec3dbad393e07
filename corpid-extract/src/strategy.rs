//! The company-name cascade, kept as an ordered list of strategies.
//!
//! Each entry pairs a [`Strategy`] (which fixes its provenance tag and
//! confidence) with a plain function over a [`PageView`]. The extractor walks
//! the list and the first cleaned, non-placeholder name wins.

use corpid_common::ExtractSettings;
use corpid_http::dom::{DocumentTree, ElementView};
use serde::Serialize;

use crate::PageView;
use crate::clean::{clean_company_name, contains_legal_marker};
use crate::domain::domain_fallback_label;

/// Coarse provenance reported in `extractionSource.method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Meta,
    Title,
    Content,
}

/// Fine-grained tier id reported in `extractionSource.strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Title,
    OgSiteName,
    LegalEntityHeading,
    LogoAlt,
    MetaDescription,
    DomainFallback,
}

impl Strategy {
    pub const fn method(self) -> ExtractionMethod {
        match self {
            Strategy::Title => ExtractionMethod::Title,
            Strategy::OgSiteName => ExtractionMethod::Meta,
            Strategy::LegalEntityHeading
            | Strategy::LogoAlt
            | Strategy::MetaDescription
            | Strategy::DomainFallback => ExtractionMethod::Content,
        }
    }

    pub const fn confidence(self) -> f64 {
        match self {
            Strategy::Title => 0.90,
            Strategy::OgSiteName => 0.85,
            Strategy::LegalEntityHeading => 0.70,
            Strategy::LogoAlt => 0.60,
            Strategy::MetaDescription => 0.50,
            Strategy::DomainFallback => 0.30,
        }
    }

    /// Read from the page itself, as opposed to synthesized from the URL.
    pub const fn verified(self) -> bool {
        !matches!(self, Strategy::DomainFallback)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Strategy::Title => "title",
            Strategy::OgSiteName => "og_site_name",
            Strategy::LegalEntityHeading => "legal_entity_heading",
            Strategy::LogoAlt => "logo_alt",
            Strategy::MetaDescription => "meta_description",
            Strategy::DomainFallback => "domain_fallback",
        }
    }
}

pub type ExtractFn<D> = fn(&PageView<'_, D>, &ExtractSettings) -> Option<String>;

pub struct NameStrategy<D: DocumentTree> {
    pub strategy: Strategy,
    pub extract: ExtractFn<D>,
}

/// The cascade in priority order.
pub fn name_cascade<D: DocumentTree>() -> [NameStrategy<D>; 6] {
    [
        NameStrategy {
            strategy: Strategy::Title,
            extract: from_title,
        },
        NameStrategy {
            strategy: Strategy::OgSiteName,
            extract: from_og_site_name,
        },
        NameStrategy {
            strategy: Strategy::LegalEntityHeading,
            extract: from_legal_entity_heading,
        },
        NameStrategy {
            strategy: Strategy::LogoAlt,
            extract: from_logo_alt,
        },
        NameStrategy {
            strategy: Strategy::MetaDescription,
            extract: from_meta_description,
        },
        NameStrategy {
            strategy: Strategy::DomainFallback,
            extract: from_domain,
        },
    ]
}

fn from_title<D: DocumentTree>(page: &PageView<'_, D>, _: &ExtractSettings) -> Option<String> {
    clean_company_name(page.title)
}

fn from_og_site_name<D: DocumentTree>(page: &PageView<'_, D>, _: &ExtractSettings) -> Option<String> {
    page.meta.get("og:site_name").and_then(|v| clean_company_name(v))
}

/// Every `h1` in document order; hero banners rarely carry the legal name
/// but an "about" heading further down often does.
fn from_legal_entity_heading<D: DocumentTree>(
    page: &PageView<'_, D>,
    _: &ExtractSettings,
) -> Option<String> {
    page.tree
        .query_selector_all("h1")
        .into_iter()
        .map(|h1| h1.text_content())
        .filter(|text| contains_legal_marker(text))
        .find_map(|text| clean_company_name(&text))
}

/// Logo alt text, looking inside `<header>` before the rest of the page.
fn from_logo_alt<D: DocumentTree>(page: &PageView<'_, D>, _: &ExtractSettings) -> Option<String> {
    ["header img[alt]", "img[alt]"].into_iter().find_map(|selector| {
        page.tree
            .query_selector_all(selector)
            .into_iter()
            .filter_map(|img| img.attribute("alt"))
            .filter(|alt| contains_legal_marker(alt))
            .find_map(|alt| clean_company_name(&alt))
    })
}

fn from_meta_description<D: DocumentTree>(
    page: &PageView<'_, D>,
    _: &ExtractSettings,
) -> Option<String> {
    page.meta
        .get("description")
        .filter(|d| contains_legal_marker(d))
        .and_then(|d| clean_company_name(d))
}

/// Synthesized from the host: `example.co.jp` → `Example` + suffix.
fn from_domain<D: DocumentTree>(page: &PageView<'_, D>, settings: &ExtractSettings) -> Option<String> {
    let label = domain_fallback_label(page.final_url)?;
    let name = clean_company_name(&label)?;
    Some(format!("{name}{}", settings.fallback_suffix))
}
