//! Common types shared across corpid crates.
//!
//! This crate defines the settings model and observability helpers used
//! throughout the corpid workspace. It is intentionally lightweight so the
//! fetcher, the extractor and the binary can all depend on it.
//!
//! # Overview
//!
//! - [`FetchSettings`]: network retrieval knobs for the HTML fetcher
//! - [`ExtractSettings`]: limits and constants used by the identity extractor
//! - [`LogSettings`]: how the binary wires up `tracing`
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use corpid_common::FetchSettings;
//!
//! let settings = FetchSettings::default();
//! assert_eq!(settings.timeout().as_millis(), 5000);
//! assert_eq!(settings.content_max_chars, 1000);
//! ```
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod observability;

/// Desktop Chrome on macOS; several sites vary markup and encoding by agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "ja,en-US;q=0.7,en;q=0.3";

/// Retrieval settings for a single page fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Hard budget for the whole exchange (headers and body), in milliseconds.
    pub timeout_ms: u64,
    /// Budget for establishing the TCP/TLS connection, in milliseconds.
    pub connect_timeout_ms: u64,
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    /// Maximum number of redirects followed before giving up.
    pub max_redirects: usize,
    /// Body bytes kept; anything past this is discarded.
    pub max_body_bytes: usize,
    /// Length cap (in chars) of the reduced main-content text.
    pub content_max_chars: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            connect_timeout_ms: 3_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            max_redirects: 10,
            max_body_bytes: 5 * 1024 * 1024,
            content_max_chars: 1_000,
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Settings consumed by the identity extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    /// Length cap (in chars) of the business description.
    pub description_max_chars: usize,
    /// Legal-entity suffix appended to names synthesized from the domain.
    pub fallback_suffix: String,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            description_max_chars: 300,
            fallback_suffix: "株式会社".to_string(),
        }
    }
}

/// Output encoding for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging section of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Duplicate events to `stderr` in addition to the file sink.
    pub emit_stderr: bool,
    /// Default filter applied when `RUST_LOG` is unset.
    pub filter: String,
    /// Explicit log directory; see [`observability::LogConfig::log_dir`].
    pub dir: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: false,
            filter: "info".to_string(),
            dir: None,
        }
    }
}
