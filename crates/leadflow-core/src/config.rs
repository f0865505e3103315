//! Pipeline configuration.

use std::str::FromStr;
use std::time::Duration;

use crate::domain::{PipelineError, Result};
use crate::repair::fallback_message;
use crate::retry::RetryPolicy;
use crate::validator::{RuleValidator, ValidatorConfig};

/// Longest company or contact name accepted, in characters.
pub const MAX_FIELD_CHARS: usize = 100;

pub const ENV_ENABLE_ENRICHMENT: &str = "LEADFLOW_ENABLE_ENRICHMENT";
pub const ENV_ENABLE_POLISH: &str = "LEADFLOW_ENABLE_POLISH";
pub const ENV_MODEL_TIMEOUT_MS: &str = "LEADFLOW_MODEL_TIMEOUT_MS";
pub const ENV_TRANSFORM_ATTEMPTS: &str = "LEADFLOW_TRANSFORM_ATTEMPTS";

/// Runtime switches and bounds for a [`Pipeline`](crate::pipeline::Pipeline).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Overlay the configured enrichment source on research records.
    pub enrichment_enabled: bool,
    /// Ask the text transform to polish template drafts.
    pub polishing_enabled: bool,
    /// Upper bound on a single transform or enrichment call.
    pub model_timeout: Duration,
    /// Attempts for polishing (repair always makes one call).
    pub transform_attempts: u32,
    /// Delay before the second polishing attempt; doubles afterwards.
    pub retry_backoff: Duration,
    pub validator: ValidatorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enrichment_enabled: false,
            polishing_enabled: false,
            model_timeout: Duration::from_secs(10),
            transform_attempts: 2,
            retry_backoff: Duration::from_millis(500),
            validator: ValidatorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `LEADFLOW_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_ENABLE_ENRICHMENT) {
            config.enrichment_enabled = parse_flag(ENV_ENABLE_ENRICHMENT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ENABLE_POLISH) {
            config.polishing_enabled = parse_flag(ENV_ENABLE_POLISH, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MODEL_TIMEOUT_MS) {
            config.model_timeout = Duration::from_millis(parse_num(ENV_MODEL_TIMEOUT_MS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_TRANSFORM_ATTEMPTS) {
            config.transform_attempts = parse_num(ENV_TRANSFORM_ATTEMPTS, &raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Retry policy applied to polishing and enrichment calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.transform_attempts,
            base_delay: self.retry_backoff,
        }
    }

    /// Reject settings under which the fallback message could fail
    /// validation.
    pub fn validate(&self) -> Result<()> {
        if self.model_timeout.is_zero() {
            return Err(PipelineError::invalid("model_timeout", "must be positive"));
        }
        if self.transform_attempts == 0 {
            return Err(PipelineError::invalid(
                "transform_attempts",
                "must be at least 1",
            ));
        }

        let v = &self.validator;
        if v.min_chars > v.max_chars {
            return Err(PipelineError::invalid(
                "validator",
                format!("min_chars {} exceeds max_chars {}", v.min_chars, v.max_chars),
            ));
        }

        let shortest = fallback_message("A", "B");
        let longest_name = "x".repeat(MAX_FIELD_CHARS);
        let longest = fallback_message(&longest_name, &longest_name);
        if shortest.trim().chars().count() < v.min_chars {
            return Err(PipelineError::invalid(
                "validator",
                format!("min_chars {} rejects the fallback message", v.min_chars),
            ));
        }
        if longest.trim().chars().count() > v.max_chars {
            return Err(PipelineError::invalid(
                "validator",
                format!("max_chars {} rejects the fallback message", v.max_chars),
            ));
        }
        if !RuleValidator::new(v.clone()).screen_field(&shortest).is_empty() {
            return Err(PipelineError::invalid(
                "validator",
                "banned terms reject the fallback message",
            ));
        }
        Ok(())
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(PipelineError::invalid(
            key,
            format!("expected true/false, got '{other}'"),
        )),
    }
}

fn parse_num<T: FromStr>(key: &'static str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| PipelineError::invalid(key, format!("expected a number, got '{raw}'")))
}
