use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use nr_core::{Error, InferenceModel, Recommendations, Result, SummaryLength};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::text::strip_markup;
use crate::InferenceConfig;

/// Host fragments of the sample configuration that were never filled in.
const PLACEHOLDER_HOSTS: &[&str] = &["your-ngrok-url", "example-model-host"];

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
    max_length: u32,
    min_length: u32,
}

#[derive(Deserialize)]
struct SummarizeResponse {
    summary: Option<String>,
}

#[derive(Serialize)]
struct RecommendRequest<'a> {
    query_text: &'a str,
    top_k: usize,
}

/// Client for the hosted summarization and recommendation endpoint.
pub struct RemoteModel {
    client: Arc<Client>,
    base_url: Option<Url>,
}

impl fmt::Debug for RemoteModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteModel")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .finish()
    }
}

impl RemoteModel {
    /// Builds the client. A missing or placeholder URL is accepted here and
    /// reported by each request instead, so health checks can answer `false`.
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        let base_url = match config.model_url.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let url = Url::parse(raw)
                    .map_err(|e| Error::Config(format!("Invalid model URL {}: {}", raw, e)))?;
                Some(url)
            }
            _ => None,
        };
        Ok(Self {
            client: Arc::new(client),
            base_url,
        })
    }

    fn endpoint(&self, route: &str) -> Result<String> {
        let base = self.base_url.as_ref().ok_or_else(|| {
            Error::Config("Model URL is not configured (set NR_MODEL_URL)".to_string())
        })?;
        let host = base.host_str().unwrap_or_default();
        if PLACEHOLDER_HOSTS.iter().any(|p| host.contains(p)) {
            return Err(Error::Config(format!(
                "Model URL {} is still a placeholder",
                base
            )));
        }
        Ok(format!("{}/{}", base.as_str().trim_end_matches('/'), route))
    }

    fn transport(err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Network("Request timeout - the model took too long to respond".to_string())
        } else {
            Error::Network(format!("Check your internet connection ({})", err))
        }
    }

    async fn expect_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!("❌ Model endpoint returned {}: {}", status, body);
        Err(Error::Inference(format!(
            "API error: {} - {}",
            status.as_u16(),
            body
        )))
    }
}

#[async_trait]
impl InferenceModel for RemoteModel {
    fn name(&self) -> &str {
        "remote"
    }

    async fn summarize(&self, content: &str, length: SummaryLength) -> Result<String> {
        let text = strip_markup(content);
        if text.is_empty() {
            return Err(Error::Validation("Content cannot be empty".to_string()));
        }
        let url = self.endpoint("summarize")?;
        debug!("📝 Summarizing {} chars", text.len());

        let request = SummarizeRequest {
            text: &text,
            max_length: length.max,
            min_length: length.min,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(Self::transport)?;
        let response = Self::expect_success(response).await?;
        let body: SummarizeResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Malformed summary response: {}", e)))?;

        body.summary
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Inference("No summary returned from API".to_string()))
    }

    async fn recommend(&self, query: &str, top_k: usize) -> Result<Recommendations> {
        if query.trim().is_empty() {
            return Err(Error::Validation("Query must be a non-empty string".to_string()));
        }
        let url = self.endpoint("recommend")?;
        info!("🔎 Requesting {} recommendations for {:?}", top_k, query);

        let request = RecommendRequest {
            query_text: query,
            top_k,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(Self::transport)?;
        let response = Self::expect_success(response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Invalid response format: {}", e)))?;

        let items = body
            .get("recommendations")
            .filter(|v| v.is_array())
            .cloned()
            .ok_or_else(|| {
                Error::Inference(
                    "Invalid response format: \"recommendations\" array not found".to_string(),
                )
            })?;
        let recommendations: Recommendations = serde_json::from_value(items)
            .map_err(|e| Error::Inference(format!("Invalid response format: {}", e)))?;
        debug!("Received {} recommendations", recommendations.len());
        Ok(recommendations)
    }

    async fn health(&self) -> Result<bool> {
        let url = match self.endpoint("health") {
            Ok(url) => url,
            Err(e) => {
                warn!("⚠️ Health check skipped: {}", e);
                return Ok(false);
            }
        };
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!("⚠️ Health check failed: {}", e);
                Ok(false)
            }
        }
    }
}
