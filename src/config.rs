//! YAML configuration for the database location and the analysis backend.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Which analysis strategy to construct. Fixed at construction time; there
/// is no runtime toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerMode {
    /// Static pre-authored payloads; no network.
    #[default]
    Canned,
    /// OpenAI-compatible chat-completions endpoint.
    Live,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub mode: AnalyzerMode,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            mode: AnalyzerMode::Canned,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4".to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub analyzer: AnalyzerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("meeting-scribe").join("meetings.db"),
            analyzer: AnalyzerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read config from a YAML file. `OPENAI_API_KEY` in the environment
    /// overrides any key in the file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                config.analyzer.api_key = Some(key);
            }
        }
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, AppError> {
        Ok(serde_yaml::from_str(content)?)
    }
}
