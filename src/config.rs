use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::api_connection::endpoints::GEMINI_API_BASE_URL;
use crate::error::{EdenError, Result};

pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

const TEXT_MODEL_ENV_VAR: &str = "EDEN_TEXT_MODEL";
const REASONING_MODEL_ENV_VAR: &str = "EDEN_REASONING_MODEL";
const IMAGE_MODEL_ENV_VAR: &str = "EDEN_IMAGE_MODEL";
const BASE_URL_ENV_VAR: &str = "EDEN_API_BASE_URL";
const TIMEOUT_ENV_VAR: &str = "EDEN_TIMEOUT_SECONDS";
const DATA_DIR_ENV_VAR: &str = "EDEN_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub text_model: String,
    pub reasoning_model: String,
    pub image_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            text_model: "gemini-3-flash-preview".into(),
            reasoning_model: "gemini-3-pro-preview".into(),
            image_model: "gemini-2.5-flash-image".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_key_env_var: String,
    pub api_base_url: String,
    pub timeout_seconds: u64,
    pub models: ModelConfig,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key_env_var: API_KEY_ENV_VAR.into(),
            api_base_url: GEMINI_API_BASE_URL.into(),
            timeout_seconds: 60,
            models: ModelConfig::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Defaults overridden by the environment (after loading `.env`).
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(model) = non_empty(TEXT_MODEL_ENV_VAR) {
            config.models.text_model = model;
        }
        if let Some(model) = non_empty(REASONING_MODEL_ENV_VAR) {
            config.models.reasoning_model = model;
        }
        if let Some(model) = non_empty(IMAGE_MODEL_ENV_VAR) {
            config.models.image_model = model;
        }
        if let Some(url) = non_empty(BASE_URL_ENV_VAR) {
            config.api_base_url = url;
        }
        if let Some(raw) = non_empty(TIMEOUT_ENV_VAR) {
            config.timeout_seconds = raw.trim().parse().map_err(|_| {
                EdenError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    TIMEOUT_ENV_VAR, raw
                ))
            })?;
        }
        if let Some(dir) = non_empty(DATA_DIR_ENV_VAR) {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("eden")
}
