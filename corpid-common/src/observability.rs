//! Logging setup shared by the `corpid` binary and the integration tests.
//!
//! Events go to a daily rolling file and, optionally, to `stderr`. Only the
//! first [`init_logging`] call installs the subscriber; later calls return
//! the path chosen by the first.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::LogFormat;
use crate::LogSettings;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

const LOG_DIR_ENV: &str = "CORPID_LOG_DIR";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Resolved logging options for one process.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Prefix of the log file name and of the default log directory.
    pub app_name: &'static str,
    /// `None` means `$CORPID_LOG_DIR`, then `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from_settings("corpid", &LogSettings::default())
    }
}

impl LogConfig {
    /// Build a config for `app_name` from the `logging` section of the settings file.
    pub fn from_settings(app_name: &'static str, settings: &LogSettings) -> Self {
        Self {
            app_name,
            log_dir: settings.dir.as_deref().map(PathBuf::from),
            emit_stderr: settings.emit_stderr,
            format: settings.format,
            default_filter: settings.filter.clone(),
        }
    }

    fn resolve_dir(&self) -> PathBuf {
        match &self.log_dir {
            Some(dir) => expand_home(dir),
            None => match std::env::var(LOG_DIR_ENV) {
                Ok(dir) => expand_home(Path::new(&dir)),
                Err(_) => home_dir()
                    .map(|home| home.join(".local/share").join(self.app_name))
                    .unwrap_or_else(|| PathBuf::from(".").join(self.app_name)),
            },
        }
    }

    fn layers(&self, file: NonBlocking) -> Vec<BoxedLayer> {
        let mut layers = vec![match self.format {
            LogFormat::Text => fmt::layer().with_writer(file).with_ansi(false).boxed(),
            LogFormat::Json => fmt::layer().json().with_writer(file).boxed(),
        }];
        if self.emit_stderr {
            layers.push(match self.format {
                LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
                LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
            });
        }
        layers
    }
}

/// Install the global subscriber and return today's log file path.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let dir = config.resolve_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let base_name = format!("{}.log", config.app_name);
    // `rolling::daily` stamps file names with the UTC date.
    let path = dir.join(dated_file_name(&base_name, Utc::now().date_naive()));

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, &base_name));
    let _ = LOG_GUARD.set(guard);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter.as_str()));

    tracing_subscriber::registry()
        .with(config.layers(writer))
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let _ = LOG_PATH.set(path.clone());
    Ok(path)
}

fn dated_file_name(base_name: &str, date: NaiveDate) -> String {
    format!("{base_name}.{}", date.format("%Y-%m-%d"))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
