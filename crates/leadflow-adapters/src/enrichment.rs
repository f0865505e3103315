//! Company enrichment over HTTP.
//!
//! `GET <endpoint>?company=<name>` with a bearer token; the response is a
//! JSON object with optional `industry`, `funding`, `website` and `summary`
//! fields. Unknown fields are ignored.

use async_trait::async_trait;
use leadflow_core::{Enrichment, EnrichmentData, ResearchError};
use tracing::debug;

use crate::error::{research_error, AdapterError};
use crate::{non_blank, Result, USER_AGENT};

pub const ENV_API_KEY: &str = "ENRICHMENT_API_KEY";
pub const ENV_URL: &str = "ENRICHMENT_URL";

/// Connection settings for [`HttpEnrichment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEnrichmentConfig {
    pub endpoint: String,
    pub api_key: String,
}

impl HttpEnrichmentConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Build from `ENRICHMENT_URL` and `ENRICHMENT_API_KEY`; both required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key =
            non_blank(&lookup, ENV_API_KEY).ok_or(AdapterError::MissingConfig(ENV_API_KEY))?;
        let endpoint = non_blank(&lookup, ENV_URL).ok_or(AdapterError::MissingConfig(ENV_URL))?;
        Ok(Self::new(endpoint, api_key))
    }

    /// Lookup URL for `company_name`.
    pub fn request_url(&self, company_name: &str) -> Result<reqwest::Url> {
        reqwest::Url::parse_with_params(&self.endpoint, &[("company", company_name)])
            .map_err(|e| AdapterError::InvalidEndpoint(format!("{}: {e}", self.endpoint)))
    }
}

/// HTTP implementation of [`Enrichment`].
pub struct HttpEnrichment {
    config: HttpEnrichmentConfig,
    http: reqwest::Client,
}

impl HttpEnrichment {
    pub fn new(config: HttpEnrichmentConfig) -> Result<Self> {
        config.request_url("probe")?;
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(HttpEnrichmentConfig::from_env()?)
    }

    /// Fetch enrichment data for one company.
    pub async fn fetch(&self, company_name: &str) -> Result<EnrichmentData> {
        let url = self.config.request_url(company_name)?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.config.api_key)
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
        let data: EnrichmentData = serde_json::from_slice(&bytes)?;
        debug!(company = %company_name, "enrichment fetched");
        Ok(data)
    }
}

#[async_trait]
impl Enrichment for HttpEnrichment {
    async fn enrich(
        &self,
        company_name: &str,
    ) -> std::result::Result<EnrichmentData, ResearchError> {
        self.fetch(company_name)
            .await
            .map_err(|err| research_error(company_name, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_variables_are_required() {
        let err = HttpEnrichmentConfig::from_lookup(|key| {
            (key == ENV_API_KEY).then(|| "secret".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, AdapterError::MissingConfig(ENV_URL)));

        let err = HttpEnrichmentConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, AdapterError::MissingConfig(ENV_API_KEY)));
    }

    #[test]
    fn request_url_encodes_company() {
        let config = HttpEnrichmentConfig::new("https://enrich.test/v1/companies", "k");
        let url = config.request_url("AT&T Labs").unwrap();
        assert_eq!(
            url.as_str(),
            "https://enrich.test/v1/companies?company=AT%26T+Labs"
        );
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let config = HttpEnrichmentConfig::new("::nope::", "k");
        assert!(matches!(
            HttpEnrichment::new(config),
            Err(AdapterError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn payload_ignores_unknown_fields() {
        let data: EnrichmentData = serde_json::from_str(
            r#"{"industry":"SaaS","funding":"Series C","employees":900}"#,
        )
        .unwrap();
        assert_eq!(data.industry.as_deref(), Some("SaaS"));
        assert_eq!(data.website, None);
    }
}
