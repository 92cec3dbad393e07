//! Host and name normalization helpers.
//!
//! Used by the name cascade (domain fallback, top page URL) and by callers
//! that need stable dedup keys for companies discovered from many URLs.

use url::{Host, Url};

/// Second-level labels that never name the company (`co` in `example.co.jp`).
const GENERIC_LABELS: &[&str] = &[
    "co", "com", "ne", "or", "ac", "go", "net", "org", "gr", "ed", "lg",
];

const WWW: &str = "www";

/// Half-width katakana U+FF66..=U+FF9D mapped to their full-width forms.
const HALF_WIDTH_KANA: &str =
    "ヲァィゥェォャュョッーアイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワン";
const HALF_WIDTH_KANA_START: u32 = 0xFF66;
const VOICED_MARK: char = '\u{FF9E}';
const SEMI_VOICED_MARK: char = '\u{FF9F}';
/// Full-width kana whose voiced form is the next code point.
const VOICEABLE: &str = "カキクケコサシスセソタチツテトハヒフヘホ";
const SEMI_VOICEABLE: &str = "ハヒフヘホ";

/// Punctuation dropped from names before comparing them.
const NAME_NOISE: &[char] = &[
    '|', '｜', '(', ')', '[', ']', '{', '}', '「', '」', '『', '』', '【', '】', '-', '.', ',', '、',
    '。', '・', '\'', '"', ';', '\\',
];

/// `scheme://host[:port]` of `url`, without path, query or fragment.
///
/// ```
/// use corpid_extract::domain::top_page_url;
/// use url::Url;
///
/// let url = Url::parse("https://www.example.co.jp/company/about?x=1").unwrap();
/// assert_eq!(top_page_url(&url), "https://www.example.co.jp");
/// ```
pub fn top_page_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    }
}

/// The label of `url`'s host most likely to be the company's own name,
/// title-cased per hyphen segment: `example.co.jp` → `Example`,
/// `www.tokyo-gas.co.jp` → `Tokyo-Gas`. IP hosts yield `None`.
pub fn domain_fallback_label(url: &Url) -> Option<String> {
    let Some(Host::Domain(host)) = url.host() else {
        return None;
    };
    let host = host.to_ascii_lowercase();
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    let (_tld, rest) = labels.split_last()?;

    let label = rest
        .iter()
        .rev()
        .find(|l| !GENERIC_LABELS.contains(l) && **l != WWW)?;
    Some(title_case_segments(label))
}

/// Registrable domain of a URL or bare host, lowercased and without `www.`.
///
/// Keeps three labels when the second-level label is generic and the TLD is
/// a country code (`example.co.jp`), two otherwise.
///
/// ```
/// use corpid_extract::domain::normalize_domain;
///
/// assert_eq!(normalize_domain("http://sub1.sub2.example.co.jp").as_deref(), Some("example.co.jp"));
/// assert_eq!(normalize_domain("https://www.example.com/about").as_deref(), Some("example.com"));
/// assert_eq!(normalize_domain("example"), None);
/// ```
pub fn normalize_domain(input: &str) -> Option<String> {
    let url = parse_loose(input)?;
    let Some(Host::Domain(host)) = url.host() else {
        return None;
    };
    let host = host.to_ascii_lowercase();
    let labels: Vec<&str> = host
        .trim_start_matches("www.")
        .split('.')
        .filter(|l| !l.is_empty())
        .collect();
    if labels.len() < 2 {
        return None;
    }

    let n = labels.len();
    let keep = if n >= 3 && labels[n - 1].len() == 2 && GENERIC_LABELS.contains(&labels[n - 2]) {
        3
    } else {
        2
    };
    Some(labels[n - keep..].join("."))
}

/// Canonical form of a company URL: `https`, no `www.`, no trailing slash,
/// query or fragment.
///
/// ```
/// use corpid_extract::domain::normalize_url;
///
/// assert_eq!(normalize_url("http://www.example.com/path/?q=1#top").as_deref(), Some("https://example.com/path"));
/// assert_eq!(normalize_url("https://example.com/").as_deref(), Some("https://example.com"));
/// ```
pub fn normalize_url(input: &str) -> Option<String> {
    let url = parse_loose(input)?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let path = url.path().trim_end_matches('/');
    match url.port() {
        Some(port) => Some(format!("https://{host}:{port}{path}")),
        None => Some(format!("https://{host}{path}")),
    }
}

/// Comparison key for company names.
///
/// Full-width ASCII becomes half-width, half-width katakana becomes
/// full-width (voiced marks folded in), and whitespace, brackets, quotes and
/// separators are removed.
///
/// ```
/// use corpid_extract::domain::normalize_company_name;
///
/// assert_eq!(normalize_company_name("ＡＢＣ　株式会社"), "ABC株式会社");
/// assert_eq!(normalize_company_name("ｶﾞｲｱ(株)"), "ガイア株");
/// ```
pub fn normalize_company_name(name: &str) -> String {
    let mut out: Vec<char> = Vec::with_capacity(name.len());
    for c in name.chars() {
        let code = c as u32;
        match c {
            '\u{3000}' => out.push(' '),
            '\u{FF01}'..='\u{FF5E}' => out.extend(char::from_u32(code - 0xFEE0)),
            VOICED_MARK | SEMI_VOICED_MARK => fold_voicing(&mut out, c),
            '\u{FF66}'..='\u{FF9D}' => {
                out.extend(HALF_WIDTH_KANA.chars().nth((code - HALF_WIDTH_KANA_START) as usize))
            }
            _ => out.push(c),
        }
    }
    out.into_iter()
        .filter(|c| !c.is_whitespace() && !NAME_NOISE.contains(c))
        .collect()
}

/// `example.co.jp`-style hostname check: at least two labels of ASCII
/// letters, digits and inner hyphens, ending in an alphabetic TLD.
pub fn is_valid_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    let Some((tld, _)) = labels.split_last() else {
        return false;
    };
    labels.len() >= 2
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
        && labels.iter().all(|l| is_valid_label(l))
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn parse_loose(input: &str) -> Option<Url> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let parsed = if input.contains("://") {
        Url::parse(input)
    } else {
        Url::parse(&format!("https://{input}"))
    };
    parsed.ok()
}

fn title_case_segments(label: &str) -> String {
    label
        .split('-')
        .map(|seg| {
            let mut chars = seg.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn fold_voicing(out: &mut Vec<char>, mark: char) {
    let Some(last) = out.last_mut() else {
        return;
    };
    let shift = match mark {
        VOICED_MARK if VOICEABLE.contains(*last) => 1,
        SEMI_VOICED_MARK if SEMI_VOICEABLE.contains(*last) => 2,
        VOICED_MARK if *last == 'ウ' => {
            *last = 'ヴ';
            return;
        }
        _ => return,
    };
    if let Some(voiced) = char::from_u32(*last as u32 + shift) {
        *last = voiced;
    }
}
