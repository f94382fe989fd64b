//! Run configuration
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! whatever the caller (usually the CLI) overrides. Credentials are kept apart
//! from settings and are only demanded by the stage that needs them, so a
//! missing key fails at construction with the variable's name.

use crate::enrich::DEFAULT_INSTRUCTION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the Elsevier (Scopus) API key.
pub const ELSEVIER_API_KEY_VAR: &str = "ELSEVIER_API_KEY";
/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

pub const DEFAULT_SEARCH_URL: &str = "https://api.elsevier.com/content/search/scopus";
pub const DEFAULT_COMPLETIONS_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a research assistant with expertise in conducting literature reviews.";

/// Errors raised while assembling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential: environment variable {var} is not set")]
    MissingCredential { var: &'static str },

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Literature-search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub base_url: String,
    /// Number of records to request
    pub count: u32,
    /// Subject area code (e.g. AGRI, BIOC)
    pub subject: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SEARCH_URL.to_string(),
            count: 10,
            subject: None,
            timeout_secs: 30,
        }
    }
}

/// Enrichment service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentSettings {
    pub base_url: String,
    pub model: String,
    /// Upper bound on response length, enforced on our side
    pub max_tokens: u32,
    pub temperature: f32,
    /// Per-call timeout
    pub timeout_secs: u64,
    pub system_prompt: String,
    /// Instruction placed before each record's fields
    pub instruction: String,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMPLETIONS_URL.to_string(),
            model: "gpt-4".to_string(),
            max_tokens: 512,
            temperature: 0.7,
            timeout_secs: 60,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            instruction: DEFAULT_INSTRUCTION.to_string(),
        }
    }
}

/// Worker pool and output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Maximum number of enrichment calls in flight
    pub concurrency: usize,
    pub output: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: 8,
            output: PathBuf::from("papers.csv"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchSettings,
    pub enrichment: EnrichmentSettings,
    pub pipeline: PipelineSettings,
}

impl Config {
    /// Load settings from `path`, or from the default location if it exists.
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Reject settings no run can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.concurrency == 0 {
            return Err(invalid("pipeline.concurrency", "must be at least 1"));
        }
        if self.search.count == 0 {
            return Err(invalid("search.count", "must be at least 1"));
        }
        if self.enrichment.max_tokens == 0 {
            return Err(invalid("enrichment.max_tokens", "must be at least 1"));
        }
        if self.enrichment.timeout_secs == 0 {
            return Err(invalid("enrichment.timeout_secs", "must be at least 1"));
        }
        if self.enrichment.model.trim().is_empty() {
            return Err(invalid("enrichment.model", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

/// `<config dir>/litreview/config.yaml` (e.g. ~/.config/litreview/config.yaml)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("litreview").join("config.yaml"))
}

/// API keys for the external services.
///
/// Empty values count as missing.
#[derive(Clone, Default)]
pub struct Credentials {
    elsevier_api_key: Option<String>,
    openai_api_key: Option<String>,
}

impl Credentials {
    pub fn new(elsevier_api_key: Option<String>, openai_api_key: Option<String>) -> Self {
        let present = |key: Option<String>| key.filter(|k| !k.trim().is_empty());
        Self {
            elsevier_api_key: present(elsevier_api_key),
            openai_api_key: present(openai_api_key),
        }
    }

    /// Read both keys from the process environment.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var(ELSEVIER_API_KEY_VAR).ok(),
            std::env::var(OPENAI_API_KEY_VAR).ok(),
        )
    }

    pub fn elsevier(&self) -> Result<&str, ConfigError> {
        self.elsevier_api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential {
                var: ELSEVIER_API_KEY_VAR,
            })
    }

    pub fn openai(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential {
                var: OPENAI_API_KEY_VAR,
            })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("elsevier_api_key", &shown(&self.elsevier_api_key))
            .field("openai_api_key", &shown(&self.openai_api_key))
            .finish()
    }
}
