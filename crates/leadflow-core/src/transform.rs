//! Contract for the external text-transform (rewriting) service.
//!
//! The service is optional and untrusted: every call is bounded by a
//! timeout, and blank output counts as a failure.

use std::time::Duration;

use async_trait::async_trait;

/// Failure modes of a transform call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("transform timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("transform service unavailable: {0}")]
    Unavailable(String),

    #[error("transform returned empty output")]
    EmptyOutput,

    #[error("transform rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Rewrites text according to natural-language instructions.
#[async_trait]
pub trait TextTransform: Send + Sync {
    async fn transform(&self, text: &str, instructions: &str) -> Result<String, TransformError>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}

/// Call `transform` with an upper bound on wall-clock time.
///
/// Whitespace-only output is reported as [`TransformError::EmptyOutput`].
pub async fn transform_with_timeout(
    transform: &dyn TextTransform,
    text: &str,
    instructions: &str,
    timeout: Duration,
) -> Result<String, TransformError> {
    let output = tokio::time::timeout(timeout, transform.transform(text, instructions))
        .await
        .map_err(|_| TransformError::Timeout {
            after_ms: timeout.as_millis() as u64,
        })??;

    if output.trim().is_empty() {
        return Err(TransformError::EmptyOutput);
    }
    Ok(output)
}
