//! Leadflow-Adapters: HTTP clients for external services
//!
//! ## Layer 2 - External services
//!
//! - `HttpTextTransform`: messages-style LLM endpoint implementing
//!   `leadflow_core::TextTransform`
//! - `HttpEnrichment`: firmographics endpoint implementing
//!   `leadflow_core::Enrichment`
//!
//! Both are optional. The pipeline runs fully offline without them.

pub mod enrichment;
pub mod error;
pub mod transform;

pub use enrichment::{HttpEnrichment, HttpEnrichmentConfig};
pub use error::AdapterError;
pub use transform::{HttpTextTransform, HttpTextTransformConfig};

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

pub(crate) const USER_AGENT: &str = concat!("leadflow-adapters/", env!("CARGO_PKG_VERSION"));

/// Reads a variable through `lookup`, treating blank values as unset.
pub(crate) fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
