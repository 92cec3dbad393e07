use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use corpid_common::observability::{LogConfig, init_logging};
use corpid_config::{CorpidConfig, CorpidConfigLoader};

mod commands;

const DEFAULT_CONFIG: &str = "corpid.yaml";

#[derive(Parser, Debug)]
#[command(name = "corpid")]
#[command(about = "Fetch company websites and extract who runs them")]
#[command(version)]
struct Cli {
    /// YAML settings file; missing is fine, defaults and CORPID__* env apply
    #[arg(long, short, global = true, env = "CORPID_CONFIG")]
    config: Option<PathBuf>,

    /// Mirror log events to stderr
    #[arg(long, global = true)]
    log_stderr: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one page and print the normalized { title, content, meta } envelope
    Fetch {
        url: String,
    },
    /// Fetch pages and print one extraction envelope per line, in input order
    Extract {
        #[arg(required = true)]
        urls: Vec<String>,
        /// Pages fetched at the same time
        #[arg(long, short = 'j', default_value_t = 4)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins over file)
    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let cfg: CorpidConfig = CorpidConfigLoader::new()
        .with_optional_file(&config_path)
        .load()
        .with_context(|| format!("loading settings from {}", config_path.display()))?;

    // 2) Logging from the `logging` section
    let mut log_config = LogConfig::from_settings("corpid", &cfg.logging);
    log_config.emit_stderr |= cli.log_stderr;
    let log_path = init_logging(log_config)?;
    tracing::debug!(log_path = %log_path.display(), "corpid.start");

    match cli.command {
        Command::Fetch { url } => commands::fetch(&cfg, &url).await,
        Command::Extract { urls, concurrency } => commands::extract(&cfg, urls, concurrency).await,
    }
}
