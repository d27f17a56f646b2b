//! Settings loaded from a TOML configuration file.
//!
//! Non-sensitive configuration lives in the XDG config directory
//! (~/.config/konsilium/config.toml). A commented default file is written on
//! first run. `KONSILIUM_CONFIG` overrides the file location, which is how
//! tests point a process at an isolated configuration.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default TOML configuration file content.
const DEFAULT_CONFIG_TOML: &str = r#"# konsilium configuration file
# Located at: ~/.config/konsilium/config.toml
#
# Override the location with the KONSILIUM_CONFIG environment variable.

[gateway]
host = "127.0.0.1"
port = 8003

[generation]
base_url = "http://127.0.0.1:11434"
model = "gemma3:4b"
temperature = 0.7
top_p = 0.9
max_tokens = 2048
timeout_seconds = 120

[knowledge]
embedding_url = "http://127.0.0.1:11434"
embedding_model = "all-minilm"
embedding_batch = 32
chunk_size = 1000
chunk_overlap = 200
n_results = 3
# embedding_dim = 384
# db_path = "/var/lib/konsilium/guidelines.sqlite3"

[consultation]
specialist_timeout_seconds = 30
disclaimer_on_error = false

# Guideline documents to ingest with `konsilium-cli ingest`.
# Paths point at extracted text (form feed between pages, as produced
# by `pdftotext`).
#
# [[guidelines]]
# path = "files/eau-prostate-cancer-2025.txt"
# domain = "prostate"
# name = "EAU Prostate Cancer Guidelines 2025"
#
# [[guidelines]]
# path = "files/eau-nmibc-2025.txt"
# domain = "bladder"
# name = "EAU Non-muscle-invasive Bladder Cancer Guidelines 2025"
"#;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("could not determine a config directory")]
    MissingConfigDir,
    #[error(
        "invalid chunking parameters: chunk_overlap ({chunk_overlap}) must be \
         smaller than chunk_size ({chunk_size})"
    )]
    InvalidChunking {
        chunk_size: usize,
        chunk_overlap: usize,
    },
}

/// Load `.env` if present. Silently does nothing when the file is missing.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Top-level settings, all sections optional in the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub knowledge: KnowledgeSettings,
    #[serde(default)]
    pub consultation: ConsultationSettings,
    #[serde(default)]
    pub guidelines: Vec<GuidelineSource>,
}

impl Settings {
    /// Load settings from the config file, writing the default file first if
    /// none exists, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv();
        let path = Self::config_path()?;
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, DEFAULT_CONFIG_TOML)?;
            tracing::info!("Wrote default configuration to {}", path.display());
        }
        let raw = fs::read_to_string(&path)?;
        let settings: Settings = toml::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Resolve the configuration file path.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var("KONSILIUM_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let dir = dirs::config_dir().ok_or(ConfigError::MissingConfigDir)?;
        Ok(dir.join("konsilium").join("config.toml"))
    }

    /// Startup validation. Invalid chunk parameters are fatal here rather
    /// than at first ingest.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.knowledge.chunk_overlap >= self.knowledge.chunk_size {
            return Err(ConfigError::InvalidChunking {
                chunk_size: self.knowledge.chunk_size,
                chunk_overlap: self.knowledge.chunk_overlap,
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Generation provider connection and sampling defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_generation_url")]
    pub base_url: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_generation_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: default_generation_url(),
            model: default_generation_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_generation_timeout(),
        }
    }
}

/// Resolved knowledge-index settings used by `konsilium-knowledge`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub embedding_dim: Option<usize>,
    #[serde(default = "default_embedding_batch")]
    pub embedding_batch: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_n_results")]
    pub n_results: usize,
    /// Explicit database file location.
    #[serde(default, rename = "db_path")]
    pub db_path_override: Option<PathBuf>,
    /// Override the root data directory. Primarily for testing.
    #[serde(default)]
    pub data_root_override: Option<PathBuf>,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            embedding_url: default_embedding_url(),
            embedding_model: default_embedding_model(),
            embedding_dim: None,
            embedding_batch: default_embedding_batch(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            n_results: default_n_results(),
            db_path_override: None,
            data_root_override: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationSettings {
    #[serde(default = "default_specialist_timeout")]
    pub specialist_timeout_seconds: u64,
    /// Whether failure answers also carry the medical disclaimer. Off by
    /// default: disclaimers apply to medical content, not to error text.
    #[serde(default)]
    pub disclaimer_on_error: bool,
}

impl Default for ConsultationSettings {
    fn default() -> Self {
        Self {
            specialist_timeout_seconds: default_specialist_timeout(),
            disclaimer_on_error: false,
        }
    }
}

/// One guideline document in the ingestion manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidelineSource {
    pub path: PathBuf,
    pub domain: String,
    pub name: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8003
}

fn default_generation_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_generation_model() -> String {
    "gemma3:4b".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_generation_timeout() -> u64 {
    120
}

fn default_embedding_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

fn default_embedding_batch() -> usize {
    32
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_n_results() -> usize {
    3
}

fn default_specialist_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.gateway.port, 8003);
        assert_eq!(settings.knowledge.chunk_size, 1000);
        assert_eq!(settings.knowledge.chunk_overlap, 200);
        assert_eq!(settings.knowledge.n_results, 3);
        assert_eq!(settings.consultation.specialist_timeout_seconds, 30);
        assert!(!settings.consultation.disclaimer_on_error);
        assert!(settings.guidelines.is_empty());
        settings.validate().unwrap();
    }

    #[test]
    fn default_config_file_parses() {
        let settings: Settings = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        settings.validate().unwrap();
        assert_eq!(settings.generation.model, "gemma3:4b");
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let mut settings = Settings::default();
        settings.knowledge.chunk_size = 200;
        settings.knowledge.chunk_overlap = 200;
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidChunking { .. }));
    }

    #[test]
    fn guideline_manifest_parses() {
        let raw = r#"
            [[guidelines]]
            path = "files/bladder.txt"
            domain = "bladder"
            name = "EAU NMIBC Guidelines"
        "#;
        let settings: Settings = toml::from_str(raw).unwrap();
        assert_eq!(settings.guidelines.len(), 1);
        assert_eq!(settings.guidelines[0].domain, "bladder");
    }
}
