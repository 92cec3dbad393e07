//! Character encoding resolution.
//!
//! Charset declarations on real sites are unreliable and often contradict
//! each other, so the final charset comes from a fixed priority cascade:
//!
//! 1. `<meta charset="...">`
//! 2. `<meta http-equiv="Content-Type" content="...; charset=...">`
//! 3. the `charset` parameter of the transport `Content-Type` header
//! 4. UTF-8
//!
//! Steps 1 and 2 can only be read after a first parse, so decoding happens in
//! explicit passes: [`first_pass_label`] + [`decode`] to get a parseable tree,
//! [`CharsetSignals::scan`] to read the declarations, [`CharsetSignals::resolve`]
//! to pick the winner, and a second [`decode`] only when the winner differs.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252, X_USER_DEFINED};
use regex::Regex;
use serde::Serialize;

use crate::FetchError;
use crate::dom::{DocumentTree, ElementView};

pub const DEFAULT_CHARSET: &str = "utf-8";

static CHARSET_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^;"'\s]+)"#).expect("static charset regex")
});

/// Map the spellings seen in the wild onto one canonical lowercase label.
///
/// ```
/// use corpid_http::charset::normalize_charset;
///
/// assert_eq!(normalize_charset(" SJIS ").as_deref(), Some("shift_jis"));
/// assert_eq!(normalize_charset("x-euc-jp").as_deref(), Some("euc-jp"));
/// assert_eq!(normalize_charset("ISO-8859-1").as_deref(), Some("iso-8859-1"));
/// assert_eq!(normalize_charset(""), None);
/// ```
pub fn normalize_charset(raw: &str) -> Option<String> {
    let label = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_ascii_lowercase();
    if label.is_empty() {
        return None;
    }
    let canonical = match label.as_str() {
        "shift-jis" | "shift_jis" | "sjis" | "x-sjis" | "ms_kanji" | "csshiftjis" => "shift_jis",
        "windows-31j" | "cp932" | "ms932" => "shift_jis",
        "euc-jp" | "eucjp" | "x-euc-jp" | "cseucpkdfmtjapanese" => "euc-jp",
        "utf8" | "utf-8" | "unicode-1-1-utf-8" => "utf-8",
        _ => return Some(label),
    };
    Some(canonical.to_string())
}

/// Pull the `charset=` parameter out of a `Content-Type` style value and normalize it.
pub fn charset_from_content_type(value: &str) -> Option<String> {
    CHARSET_PARAM
        .captures(value)
        .and_then(|c| c.get(1))
        .and_then(|m| normalize_charset(m.as_str()))
}

/// A charset declared inside the markup, adjusted the way browsers adjust it:
/// the markup was readable as ASCII, so a UTF-16 declaration means UTF-8, and
/// `x-user-defined` means windows-1252.
///
/// ```
/// use corpid_http::charset::meta_declared_charset;
///
/// assert_eq!(meta_declared_charset("UTF-16LE").as_deref(), Some("utf-8"));
/// assert_eq!(meta_declared_charset("x-user-defined").as_deref(), Some("windows-1252"));
/// assert_eq!(meta_declared_charset("Shift_JIS").as_deref(), Some("shift_jis"));
/// ```
pub fn meta_declared_charset(raw: &str) -> Option<String> {
    let label = normalize_charset(raw)?;
    match lookup(&label) {
        Some(enc) if enc == UTF_16LE || enc == UTF_16BE => Some(DEFAULT_CHARSET.to_string()),
        Some(enc) if enc == X_USER_DEFINED => Some(WINDOWS_1252.name().to_ascii_lowercase()),
        _ => Some(label),
    }
}

/// Runtime support check for a canonical label.
pub fn lookup(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.as_bytes())
}

/// Label used for the first, purely structural, decode.
pub fn first_pass_label(header_charset: Option<&str>) -> &str {
    header_charset.unwrap_or(DEFAULT_CHARSET)
}

/// Decode `bytes` as `label`. An unsupported label is a [`FetchError::DecodeFailure`];
/// callers treat it as soft and fall back to [`decode_lossy_utf8`].
pub fn decode(bytes: &[u8], label: &str) -> Result<String, FetchError> {
    let encoding = lookup(label).ok_or_else(|| FetchError::DecodeFailure {
        charset: label.to_string(),
    })?;
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        tracing::debug!(charset = label, "charset.decode.replacement_chars");
    }
    Ok(text.into_owned())
}

pub fn decode_lossy_utf8(bytes: &[u8]) -> String {
    let (text, _) = UTF_8.decode_with_bom_removal(bytes);
    text.into_owned()
}

/// Which cascade step produced the final charset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CharsetSource {
    MetaCharset,
    MetaHttpEquiv,
    Header,
    Default,
}

/// Every charset declaration found for one response, already normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharsetSignals {
    pub meta_charset: Option<String>,
    pub meta_http_equiv: Option<String>,
    pub header: Option<String>,
}

impl CharsetSignals {
    /// Read the `<meta>` declarations out of a first-pass tree.
    pub fn scan<D: DocumentTree>(tree: &D, header: Option<String>) -> Self {
        let meta_charset = tree
            .query_selector_all("meta[charset]")
            .into_iter()
            .find_map(|m| m.attribute("charset").and_then(meta_declared_charset));

        let meta_http_equiv = tree
            .query_selector_all("meta[http-equiv]")
            .into_iter()
            .filter(|m| {
                m.attribute("http-equiv")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("content-type"))
            })
            .find_map(|m| m.attribute("content").and_then(charset_from_content_type))
            .and_then(|label| meta_declared_charset(&label));

        Self {
            meta_charset,
            meta_http_equiv,
            header,
        }
    }

    /// Walk the cascade; labels the runtime cannot decode are skipped.
    pub fn resolve(&self) -> (String, CharsetSource) {
        let candidates = [
            (self.meta_charset.as_deref(), CharsetSource::MetaCharset),
            (self.meta_http_equiv.as_deref(), CharsetSource::MetaHttpEquiv),
            (self.header.as_deref(), CharsetSource::Header),
        ];
        for (label, source) in candidates {
            let Some(label) = label else { continue };
            if lookup(label).is_some() {
                return (label.to_string(), source);
            }
            tracing::warn!(charset = label, ?source, "charset.unsupported");
        }
        (DEFAULT_CHARSET.to_string(), CharsetSource::Default)
    }
}

/// Outcome of the cascade, kept on the fetched document for auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCharset {
    /// Label the final tree was decoded with.
    pub label: String,
    pub source: CharsetSource,
    /// Label the structural first pass was decoded with.
    pub first_pass_label: String,
    /// Whether the bytes were decoded a second time.
    pub redecoded: bool,
}

/// Two labels name the same decoder (e.g. `windows-31j` and `shift_jis`).
pub fn same_encoding(a: &str, b: &str) -> bool {
    match (lookup(a), lookup(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
