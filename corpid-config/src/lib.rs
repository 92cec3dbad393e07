//! Loader for corpid configuration with YAML + environment overlays.
//!
//! Sources are merged in this order (later wins):
//! 1. built-in defaults on every section,
//! 2. the YAML file (optional or required) and/or inline YAML,
//! 3. `CORPID__`-prefixed environment variables, `__` separating sections
//!    (`CORPID__FETCH__TIMEOUT_MS=3000`).
//!
//! `${VAR}` placeholders inside string values are expanded afterwards.
use config::{Config, ConfigError, Environment, File};
use corpid_common::{ExtractSettings, FetchSettings, LogSettings};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "CORPID";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CorpidConfig {
    pub fetch: FetchSettings,
    pub extract: ExtractSettings,
    pub logging: LogSettings,
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct CorpidConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env: Environment,
}

impl Default for CorpidConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpidConfigLoader {
    /// Start with defaults only; `CORPID__` env overrides are applied on [`load`](Self::load).
    ///
    /// ```
    /// use corpid_config::CorpidConfigLoader;
    ///
    /// let config = CorpidConfigLoader::new()
    ///     .with_yaml_str("fetch:\n  timeout_ms: 2500\n")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.fetch.timeout_ms, 2500);
    /// assert_eq!(config.extract.description_max_chars, 300);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env: Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so deployments can rely purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use corpid_common::LogFormat;
    /// use corpid_config::CorpidConfigLoader;
    ///
    /// let cfg = CorpidConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// logging:
    ///   format: json
    ///   emit_stderr: true
    /// extract:
    ///   fallback_suffix: "Inc."
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.logging.format, LogFormat::Json);
    /// assert_eq!(cfg.extract.fallback_suffix, "Inc.");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into [`CorpidConfig`].
    ///
    /// ```
    /// use corpid_config::CorpidConfigLoader;
    ///
    /// unsafe { std::env::set_var("CORPID_DOC_AGENT", "corpid-doc/1.0"); }
    ///
    /// let config = CorpidConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// fetch:
    ///   user_agent: "${CORPID_DOC_AGENT}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.fetch.user_agent, "corpid-doc/1.0");
    ///
    /// unsafe { std::env::remove_var("CORPID_DOC_AGENT"); }
    /// ```
    pub fn load(self) -> Result<CorpidConfig, ConfigError> {
        let cfg = self.builder.add_source(self.env).build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);
        if v.is_null() {
            v = Value::Object(Default::default());
        }

        let typed: CorpidConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
