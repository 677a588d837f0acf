//! HTTP implementation of the backend.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::client::{Backend, BackendError};
use crate::config::ApiConfig;
use crate::models::{ClassificationResult, ClassifyRequest, SampleText, SearchPage, SearchQuery};
use crate::utils::{validate_base_url, validate_category, validate_page, validate_text, HttpClient};

/// Backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: HttpClient,
    base_url: String,
}

/// Error bodies look like `{"error": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Classify responses carry either an error or a full prediction
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifyBody {
    Rejected {
        error: String,
    },
    Classified {
        prediction: String,
        probabilities: BTreeMap<String, f64>,
    },
}

impl HttpBackend {
    /// Create a backend for `base_url` with default timeouts
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let http = HttpClient::new()?;
        Self::with_client(base_url, http)
    }

    /// Create a backend from API configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, BackendError> {
        let http = HttpClient::with_timeouts(config.timeout(), config.connect_timeout())?;
        Self::with_client(&config.base_url, http)
    }

    /// Create a backend sharing an existing client
    pub fn with_client(base_url: &str, http: HttpClient) -> Result<Self, BackendError> {
        Ok(Self {
            http,
            base_url: validate_base_url(base_url)?,
        })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success status to an error, preferring the server's message
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            });

        Err(BackendError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Network(format!("Failed to read response body: {}", e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn search(&self, query: &SearchQuery, page: u32) -> Result<SearchPage, BackendError> {
        let page = validate_page(page)?;
        let url = self.endpoint(&format!(
            "/search/?query={}&page={}",
            urlencoding::encode(query.as_str()),
            page
        ));
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .client()
            .get(&url)
            .send()
            .await
            .map_err(BackendError::from)?;

        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    async fn classify(&self, text: &str) -> Result<ClassificationResult, BackendError> {
        let text = validate_text(text)?;
        let url = self.endpoint("/classify/");
        tracing::debug!("POST {} ({} chars)", url, text.chars().count());

        let response = self
            .http
            .client()
            .post(&url)
            .json(&ClassifyRequest { text })
            .send()
            .await
            .map_err(BackendError::from)?;

        let response = Self::check_status(response).await?;
        match Self::decode(response).await? {
            ClassifyBody::Rejected { error } => Err(BackendError::Rejected(error)),
            ClassifyBody::Classified {
                prediction,
                probabilities,
            } => Ok(ClassificationResult::new(prediction, probabilities)),
        }
    }

    async fn sample(&self, category: &str) -> Result<SampleText, BackendError> {
        let category = validate_category(category)?;
        let url = self.endpoint(&format!("/sample/{}/", urlencoding::encode(category)));
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .client()
            .get(&url)
            .send()
            .await
            .map_err(BackendError::from)?;

        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }
}
