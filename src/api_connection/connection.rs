use dotenv::dotenv;
use reqwest::Client;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::endpoints::{
    GenerateContentRequest, GenerateContentResponse, Provider, GEMINI_API_BASE_URL,
};

/// Consulted when the configured key variable is unset.
pub const FALLBACK_API_KEY_ENV_VAR: &str = "API_KEY";

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },

    #[error("API returned no usable content: {0}")]
    EmptyResponse(String),
}

impl Provider {
    pub fn gemini(api_key_env_var_name: &str) -> Self {
        Self::gemini_with(api_key_env_var_name, GEMINI_API_BASE_URL, 60)
    }

    pub fn gemini_with(api_key_env_var_name: &str, base_url: &str, timeout_seconds: u64) -> Self {
        dotenv().ok();
        Self::Gemini {
            api_key: api_key_env_var_name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_seconds,
        }
    }

    fn resolve_api_key(api_key_env_var_name: &str) -> Result<String, ApiConnectionError> {
        env::var(api_key_env_var_name)
            .or_else(|_| env::var(FALLBACK_API_KEY_ENV_VAR))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ApiConnectionError::MissingApiKey(api_key_env_var_name.to_string()))
    }

    pub async fn call_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ApiConnectionError> {
        match self {
            Provider::Gemini {
                api_key: api_key_env_var_name,
                base_url,
                timeout_seconds,
            } => {
                dotenv().ok();
                let actual_api_key = Self::resolve_api_key(api_key_env_var_name)?;

                let client = Client::builder()
                    .timeout(Duration::from_secs(*timeout_seconds))
                    .build()?;
                let url = format!("{}/models/{}:generateContent", base_url, model);
                debug!(%url, "calling Gemini generateContent");

                let response = client
                    .post(&url)
                    .header("x-goog-api-key", actual_api_key)
                    .json(request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let body = response.text().await?;
                    let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
                    Ok(parsed)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}
