use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "casegen.toml";
const ENV_PREFIX: &str = "CASEGEN_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// `tracing` env-filter directive; `RUST_LOG` wins when set.
    pub log_filter: String,
    pub llm: LLMConfig,
    pub batch: BatchSettings,
    pub server: ServerSettings,
    pub tracker: TrackerSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    pub total_scenarios: u32,
    pub batch_size: u32,
    /// Minimum spacing between model calls.
    pub interval_secs: u64,
    /// Request the leftover `total_scenarios % batch_size` in one extra batch.
    pub include_remainder: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Also write every generation to a numbered file under `output.dir`.
    pub save_outputs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSettings {
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub token: Option<String>,
    pub acceptance_field_fallback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub batch_file: PathBuf,
    pub exports_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            llm: LLMConfig::default(),
            batch: BatchSettings {
                total_scenarios: 20,
                batch_size: 5,
                interval_secs: 30,
                include_remainder: false,
            },
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8000,
                save_outputs: false,
            },
            tracker: TrackerSettings {
                base_url: None,
                email: None,
                token: None,
                acceptance_field_fallback: "customfield_10000".to_string(),
            },
            output: OutputSettings {
                dir: PathBuf::from("outputs"),
                batch_file: PathBuf::from("output.md"),
                exports_dir: PathBuf::from("test_output"),
            },
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file, then `CASEGEN_*` variables, then the bare
    /// credential variables (`GEMINI_API_KEY`, `JIRA_EMAIL`, `JIRA_TOKEN`).
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(
                Env::raw()
                    .only(&["GEMINI_API_KEY"])
                    .map(|_| "llm.api_key".into()),
            )
            .merge(Env::raw().only(&["JIRA_EMAIL"]).map(|_| "tracker.email".into()))
            .merge(Env::raw().only(&["JIRA_TOKEN"]).map(|_| "tracker.token".into()))
    }

    /// Loads `.env`, then the layered configuration. An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config_path = match path {
            Some(path) if !path.exists() => {
                return Err(AppError::ConfigError(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config: AppConfig = Self::figment(&config_path)
            .extract()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch.batch_size == 0 {
            return Err(AppError::ConfigError(
                "batch.batch_size must be greater than zero".to_string(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(AppError::ConfigError("llm.model is required".to_string()));
        }
        Ok(())
    }
}
