//! Text transform backed by a messages-style LLM HTTP API.
//!
//! The draft goes in as the single user message and the instructions as the
//! system prompt. Only `text` content blocks are read back.

use async_trait::async_trait;
use leadflow_core::{TextTransform, TransformError};
use serde::Deserialize;
use tracing::debug;

use crate::error::AdapterError;
use crate::{non_blank, Result, USER_AGENT};

pub const ENV_API_KEY: &str = "LEADFLOW_LLM_API_KEY";
pub const ENV_MODEL: &str = "LEADFLOW_LLM_MODEL";
pub const ENV_URL: &str = "LEADFLOW_LLM_URL";

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";

/// Connection settings for [`HttpTextTransform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTextTransformConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
}

impl HttpTextTransformConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 600,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Build from `LEADFLOW_LLM_*` variables. The API key is required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key =
            non_blank(&lookup, ENV_API_KEY).ok_or(AdapterError::MissingConfig(ENV_API_KEY))?;
        let mut config = Self::new(api_key);
        if let Some(model) = non_blank(&lookup, ENV_MODEL) {
            config.model = model;
        }
        if let Some(url) = non_blank(&lookup, ENV_URL) {
            config.endpoint = url;
        }
        Ok(config)
    }

    /// JSON request body for one rewrite.
    pub fn request_body(&self, text: &str, instructions: &str) -> serde_json::Value {
        serde_json::json!({
            "model": &self.model,
            "max_tokens": self.max_tokens,
            "system": instructions,
            "messages": [
                { "role": "user", "content": text }
            ],
        })
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Concatenate the text blocks of a messages response.
pub fn parse_response(body: &[u8]) -> Result<String> {
    let response: MessagesResponse = serde_json::from_slice(body)?;
    let text = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        return Err(AdapterError::EmptyResponse);
    }
    Ok(text.trim().to_string())
}

/// HTTP implementation of [`TextTransform`].
pub struct HttpTextTransform {
    config: HttpTextTransformConfig,
    http: reqwest::Client,
}

impl HttpTextTransform {
    pub fn new(config: HttpTextTransformConfig) -> Result<Self> {
        reqwest::Url::parse(&config.endpoint)
            .map_err(|e| AdapterError::InvalidEndpoint(format!("{}: {e}", config.endpoint)))?;
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(HttpTextTransformConfig::from_env()?)
    }

    pub fn config(&self) -> &HttpTextTransformConfig {
        &self.config
    }

    /// One rewrite request.
    pub async fn complete(&self, text: &str, instructions: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.config.request_body(text, instructions))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let text = parse_response(&bytes)?;
        debug!(model = %self.config.model, chars = text.len(), "transform completed");
        Ok(text)
    }
}

#[async_trait]
impl TextTransform for HttpTextTransform {
    async fn transform(
        &self,
        text: &str,
        instructions: &str,
    ) -> std::result::Result<String, TransformError> {
        Ok(self.complete(text, instructions).await?)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
