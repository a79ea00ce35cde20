//! Configuration for the mealcraft binary.
//!
//! A TOML file with `[llm]`, `[planner]` and `[server]` sections, resolved
//! with the chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use mealcraft_agent::{CompletionOptions, PlannerSettings, RetryPolicy};
use mealcraft_llm::provider::{GROQ_BASE_URL, GROQ_DEFAULT_MODEL};
use mealcraft_llm::{Error, ProviderConfig};

use crate::session::DEFAULT_MAX_SESSIONS;

pub const CONFIG_ENV: &str = "MEALCRAFT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "mealcraft.toml";
/// Checked in order; the first one set wins
pub const API_KEY_ENVS: [&str; 2] = ["MEALCRAFT_API_KEY", "GROQ_API_KEY"];
pub const BASE_URL_ENV: &str = "MEALCRAFT_BASE_URL";
pub const MODEL_ENV: &str = "MEALCRAFT_MODEL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub llm: LlmSection,
    pub planner: PlannerSection,
    pub server: ServerSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: GROQ_BASE_URL.to_string(),
            model: GROQ_DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: 120,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSection {
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub reduce_on_denial: bool,
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 0,
            reduce_on_denial: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    pub port: u16,
    /// Sessions kept by `serve` before the oldest is evicted
    pub max_sessions: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5000,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Pick the config file: `--config` > `MEALCRAFT_CONFIG` > `./mealcraft.toml`
/// when it exists. `None` means built-in defaults.
pub fn config_path(
    cli_path: Option<&Path>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    local.exists().then_some(local)
}

/// Load and parse a config file. Missing sections and keys take defaults.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MealcraftConfig {
    pub file: ConfigFile,
    /// Where the file settings came from, if anywhere
    pub source: Option<PathBuf>,
}

impl MealcraftConfig {
    /// Resolve against the process environment.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self> {
        Self::resolve_with(cli_path, &|key| std::env::var(key).ok())
    }

    pub fn resolve_with(
        cli_path: Option<&Path>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let source = config_path(cli_path, env);
        let mut file = match &source {
            Some(path) => load_config(path)?,
            None => ConfigFile::default(),
        };

        if let Some(key) = API_KEY_ENVS
            .iter()
            .find_map(|name| env(name).filter(|v| !v.is_empty()))
        {
            file.llm.api_key = Some(key);
        }
        if let Some(url) = env(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            file.llm.base_url = url;
        }
        if let Some(model) = env(MODEL_ENV).filter(|v| !v.is_empty()) {
            file.llm.model = model;
        }

        if file.planner.max_attempts == 0 {
            bail!("planner.max_attempts must be at least 1");
        }
        Ok(Self { file, source })
    }

    /// Apply `serve --bind/--port` overrides
    pub fn with_server_overrides(mut self, bind: Option<String>, port: Option<u16>) -> Self {
        if let Some(bind) = bind {
            self.file.server.bind = bind;
        }
        if let Some(port) = port {
            self.file.server.port = port;
        }
        self
    }

    /// Provider settings for the configured endpoint.
    ///
    /// Local endpoints may run without a key; anything else needs one.
    pub fn provider_config(&self) -> mealcraft_llm::Result<ProviderConfig> {
        let llm = &self.file.llm;
        let base = llm.base_url.trim_end_matches('/');
        let is_local = base.starts_with("http://localhost") || base.starts_with("http://127.0.0.1");

        let config = match (&llm.api_key, is_local) {
            (_, true) => {
                let mut config = ProviderConfig::local(base, llm.model.clone());
                config.api_key = llm.api_key.clone();
                config
            }
            (Some(key), false) if base.contains("api.openai.com") => ProviderConfig::openai(key),
            (Some(key), false) => ProviderConfig::groq(key),
            (None, false) => {
                return Err(Error::config_invalid(format!(
                    "no API key configured; set {} or llm.api_key",
                    API_KEY_ENVS.join(" / ")
                ))
                .with_context("base_url", base));
            }
        };

        Ok(config
            .with_base_url(base)
            .with_model(llm.model.clone())
            .with_timeout(llm.timeout_secs))
    }

    pub fn planner_settings(&self) -> PlannerSettings {
        let planner = &self.file.planner;
        let llm = &self.file.llm;
        PlannerSettings {
            retry: RetryPolicy::new(planner.max_attempts)
                .with_backoff(Duration::from_millis(planner.backoff_ms)),
            completion: CompletionOptions {
                model: Some(llm.model.clone()),
                temperature: Some(llm.temperature),
                max_tokens: Some(llm.max_tokens),
            },
            reduce_on_denial: planner.reduce_on_denial,
        }
    }

    /// The resolved settings as TOML with the API key masked
    pub fn redacted(&self) -> Result<String> {
        let mut file = self.file.clone();
        if file.llm.api_key.is_some() {
            file.llm.api_key = Some("***".to_string());
        }
        toml::to_string_pretty(&file).context("failed to serialize config")
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
