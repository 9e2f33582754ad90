use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::persona::DEFAULT_PERSONA;
use crate::provider::Provider;

pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const APP_DIR: &str = "persona-chat";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub provider: Option<String>,
    pub default_model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub ollama_url: Option<String>,
    /// Seconds to wait for a reply; `0` waits forever.
    pub request_timeout_secs: Option<u64>,
    pub cv_path: Option<PathBuf>,
    /// Replaces the built-in biography when set.
    pub persona: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::Gemini.as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or(Provider::Gemini)
    }

    pub fn model(&self) -> String {
        self.default_model
            .clone()
            .unwrap_or_else(|| self.provider().default_model().to_string())
    }

    /// Environment first, then the config file.
    pub fn gemini_api_key(&self) -> Option<String> {
        resolve_key(std::env::var(GEMINI_KEY_ENV).ok(), self.gemini_api_key.clone())
    }

    pub fn ollama_url(&self) -> &str {
        self.ollama_url
            .as_deref()
            .unwrap_or(crate::ai::ollama::DEFAULT_BASE_URL)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn persona_text(&self) -> &str {
        self.persona.as_deref().unwrap_or(DEFAULT_PERSONA)
    }

    pub fn cv_path(&self) -> PathBuf {
        self.cv_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::cv::DEFAULT_CV_FILE))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join(APP_DIR))
    }

    pub fn log_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("persona.log"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

fn resolve_key(env: Option<String>, config: Option<String>) -> Option<String> {
    env.filter(|k| !k.trim().is_empty())
        .or(config)
        .filter(|k| !k.trim().is_empty())
}
