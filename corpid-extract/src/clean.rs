//! String cleaning for company-name candidates and descriptions.
//!
//! Every candidate goes through [`clean_company_name`] before it can win the
//! name cascade:
//!
//! 1. decode HTML entities
//! 2. cut taglines after a separator (`｜` or `|` anywhere, ` -`, ` /`)
//! 3. move an embedded Japanese legal-entity marker to the end
//! 4. strip boilerplate suffixes ("企業情報", "Official Site", ...)
//! 5. collapse whitespace
//! 6. reject placeholders and anything shorter than two chars

use std::sync::LazyLock;

use corpid_http::reduce::{collapse_whitespace, truncate_chars};
use regex::{Captures, Regex};

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[xX]([0-9A-Fa-f]{1,6})|#([0-9]{1,7})|(amp|lt|gt|quot|apos|nbsp));")
        .expect("static entity regex")
});

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"｜|\||\s[\-/–—]").expect("static separator regex"));

/// Japanese markers that read as a prefix ("株式会社ホゲ") and get moved behind the name.
static MOVABLE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"株式会社|（株）|\(株\)|（株\)|㈱|有限会社|合同会社").expect("static marker regex")
});

static JA_BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:企業情報|会社概要|公式サイト|トップページ|ホーム|オフィシャルサイト|コーポレートサイト).*$")
        .expect("static boilerplate regex")
});

static EN_BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*\b(?:official\s+(?:web\s*)?site|corporate\s+site|top\s+page|home|company\s+overview|corporate\s+information)\s*$",
    )
    .expect("static boilerplate regex")
});

static LEGAL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"株式会社|（株）|\(株\)|（株\)|㈱|有限会社|合同会社|コーポレーション|\b(?:Inc|INC|Ltd|LTD|LLC|Corp|Corporation|GmbH|K\.K)\b",
    )
    .expect("static legal marker regex")
});

/// Bare page-furniture words that are never a company name.
const JA_DENYLIST: &[&str] = &[
    "企業情報",
    "会社概要",
    "ホーム",
    "トップページ",
    "トップ",
    "公式サイト",
    "コーポレートサイト",
    "オフィシャルサイト",
    "ウェブサイト",
    "ホームページ",
];

/// Compared case-insensitively.
const EN_DENYLIST: &[&str] = &[
    "home",
    "top",
    "top page",
    "official site",
    "website",
    "homepage",
    "corporate site",
    "company overview",
];

const MIN_NAME_CHARS: usize = 2;

/// Decode the entities that survive in titles and attribute values.
///
/// ```
/// use corpid_extract::clean::decode_entities;
///
/// assert_eq!(decode_entities("Tech &amp; Co"), "Tech & Co");
/// assert_eq!(decode_entities("&#x682A;&#24335;"), "株式");
/// assert_eq!(decode_entities("&amp;lt;"), "&lt;");
/// ```
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let decoded = if let Some(hex) = caps.get(1) {
                u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = caps.get(2) {
                dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match caps.get(3).map(|m| m.as_str()) {
                    Some("amp") => Some('&'),
                    Some("lt") => Some('<'),
                    Some("gt") => Some('>'),
                    Some("quot") => Some('"'),
                    Some("apos") => Some('\''),
                    Some("nbsp") => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Does the text carry a legal-entity marker such as 株式会社 or Inc.?
pub fn contains_legal_marker(text: &str) -> bool {
    LEGAL_MARKER.is_match(text)
}

/// Run the full cleaning pipeline. `None` means the candidate is unusable.
///
/// ```
/// use corpid_extract::clean::clean_company_name;
///
/// assert_eq!(clean_company_name("Acme Inc｜Official Site").as_deref(), Some("Acme Inc"));
/// assert_eq!(clean_company_name("株式会社ホゲ - 企業情報").as_deref(), Some("ホゲ株式会社"));
/// assert_eq!(clean_company_name("トップページ"), None);
/// ```
pub fn clean_company_name(raw: &str) -> Option<String> {
    let decoded = decode_entities(raw);
    let cut = strip_after_separator(&decoded);
    let moved = move_marker_to_end(cut);
    let stripped = strip_boilerplate(&moved);
    let cleaned = collapse_whitespace(&stripped);

    if is_placeholder(&cleaned) || cleaned.chars().count() < MIN_NAME_CHARS {
        return None;
    }
    Some(cleaned)
}

/// Description cleaning: decode, collapse, trim, cap.
pub fn clean_description(raw: &str, max_chars: usize) -> String {
    truncate_chars(&collapse_whitespace(&decode_entities(raw)), max_chars)
}

fn strip_after_separator(text: &str) -> &str {
    match SEPARATOR.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    }
}

fn move_marker_to_end(text: &str) -> String {
    match MOVABLE_MARKER.find(text) {
        Some(m) if !text[m.end()..].trim().is_empty() => {
            format!("{}{}{}", &text[..m.start()], &text[m.end()..], m.as_str())
        }
        _ => text.to_string(),
    }
}

fn strip_boilerplate(text: &str) -> String {
    let ja = JA_BOILERPLATE.replace(text, "");
    EN_BOILERPLATE.replace(&ja, "").into_owned()
}

fn is_placeholder(text: &str) -> bool {
    JA_DENYLIST.contains(&text) || EN_DENYLIST.iter().any(|d| d.eq_ignore_ascii_case(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_cut_taglines() {
        assert_eq!(clean_company_name("Acme Inc｜Official Site").as_deref(), Some("Acme Inc"));
        assert_eq!(clean_company_name("Acme Corp | Leading the future").as_deref(), Some("Acme Corp"));
        assert_eq!(clean_company_name("Acme / Products").as_deref(), Some("Acme"));
        assert_eq!(clean_company_name("Acme – Home of widgets").as_deref(), Some("Acme"));
        // Hyphens inside a word are part of the name.
        assert_eq!(clean_company_name("Coca-Cola Japan").as_deref(), Some("Coca-Cola Japan"));
    }

    #[test]
    fn unspaced_pipe_is_a_separator() {
        assert_eq!(clean_company_name("サンプル株式会社|トップ").as_deref(), Some("サンプル株式会社"));
        assert_eq!(clean_company_name("株式会社サンプル|会社概要").as_deref(), Some("サンプル株式会社"));
        assert_eq!(clean_company_name("Acme Corp|Home").as_deref(), Some("Acme Corp"));
        assert_eq!(clean_company_name("Acme Inc|Leading the future").as_deref(), Some("Acme Inc"));
        assert_eq!(clean_company_name("|トップ"), None);
    }

    #[test]
    fn legal_marker_moves_behind_the_name() {
        assert_eq!(clean_company_name("株式会社ホゲ").as_deref(), Some("ホゲ株式会社"));
        assert_eq!(clean_company_name("（株）フガ商事").as_deref(), Some("フガ商事（株）"));
        assert_eq!(clean_company_name("ピヨ株式会社").as_deref(), Some("ピヨ株式会社"));
    }

    #[test]
    fn boilerplate_suffixes_are_stripped() {
        assert_eq!(clean_company_name("ホゲ商事 企業情報").as_deref(), Some("ホゲ商事"));
        assert_eq!(clean_company_name("フガ工業コーポレートサイト").as_deref(), Some("フガ工業"));
        assert_eq!(clean_company_name("ピヨ株式会社｜会社概要").as_deref(), Some("ピヨ株式会社"));
        assert_eq!(clean_company_name("Acme Holdings Official Site").as_deref(), Some("Acme Holdings"));
        assert_eq!(clean_company_name("Acme Holdings home").as_deref(), Some("Acme Holdings"));
        let hoge = clean_company_name("株式会社ホゲ - 企業情報").unwrap();
        assert!(!hoge.contains("企業情報"));
    }

    #[test]
    fn placeholders_and_short_strings_are_rejected() {
        for raw in ["トップページ", "ホームページ", "Home", "TOP PAGE", "Website", "A", "  ", ""] {
            assert_eq!(clean_company_name(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(
            clean_company_name("  Tech &amp;\n\t Co  ").as_deref(),
            Some("Tech & Co")
        );
        assert_eq!(clean_company_name("Tech &amp; Co").as_deref(), Some("Tech & Co"));
    }

    #[test]
    fn entities_decode_once() {
        assert_eq!(decode_entities("&quot;Acme&quot; &#39;KK&#39;"), "\"Acme\" 'KK'");
        assert_eq!(decode_entities("&lt;b&gt;"), "<b>");
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
        assert_eq!(decode_entities("AT&T"), "AT&T");
    }

    #[test]
    fn legal_marker_detection() {
        assert!(contains_legal_marker("株式会社ホゲ"));
        assert!(contains_legal_marker("ホゲ㈱"));
        assert!(contains_legal_marker("Acme Inc."));
        assert!(contains_legal_marker("Acme Co., Ltd."));
        assert!(contains_legal_marker("ピヨコーポレーション"));
        assert!(!contains_legal_marker("Incredible widgets"));
        assert!(!contains_legal_marker("Welcome"));
    }

    #[test]
    fn description_is_capped() {
        let long = "あ".repeat(400);
        assert_eq!(clean_description(&long, 300).chars().count(), 300);
        assert_eq!(clean_description(" a\n\n b &amp; c ", 300), "a b & c");
    }
}
