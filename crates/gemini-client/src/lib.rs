pub mod error;
pub mod models;
pub mod prompt;

pub use error::{GeminiError, GeminiResult};
pub use models::{GenerateContentRequest, GenerateContentResponse};
pub use prompt::analysis_prompt;

use analysis_core::{AnalysisError, ModelResponse, ReportModel};
use async_trait::async_trait;
use models::ErrorEnvelope;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// Text substituted when the model answers without any text.
pub const EMPTY_ANALYSIS_TEXT: &str = "No analysis generated.";

/// Configuration for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// `None` waits as long as the API takes.
    pub timeout: Option<Duration>,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    /// Read `GEMINI_API_KEY` (or `API_KEY`), `GEMINI_MODEL`, `GEMINI_BASE_URL`
    /// and `GEMINI_TIMEOUT_SECS`.
    pub fn from_env() -> GeminiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GeminiResult<Self> {
        let api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GeminiError::Config("GEMINI_API_KEY must be set".to_string()))?;

        let timeout = match lookup("GEMINI_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    GeminiError::Config(format!("GEMINI_TIMEOUT_SECS is not a number: {raw}"))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            api_key,
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: lookup("GEMINI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout,
        })
    }
}

/// Client for grounded `generateContent` calls
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> GeminiResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    /// Send one grounded prompt. There is no retry.
    pub async fn generate_content(&self, prompt: &str) -> GeminiResult<GenerateContentResponse> {
        let request = GenerateContentRequest::grounded_prompt(prompt);

        tracing::debug!("Calling Gemini model {}", self.config.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => GeminiError::Api {
                    code: status.as_u16(),
                    status: envelope.error.status,
                    message: envelope.error.message,
                },
                Err(_) => GeminiError::Api {
                    code: status.as_u16(),
                    status: status.canonical_reason().unwrap_or("unknown").to_string(),
                    message: body,
                },
            });
        }

        decode_response(&body)
    }

    /// Prompt the model and reduce the reply to its text and citations.
    pub async fn analyze(&self, prompt: &str) -> GeminiResult<ModelResponse> {
        let response = self.generate_content(prompt).await?;
        Ok(to_model_response(&response))
    }
}

fn decode_response(body: &str) -> GeminiResult<GenerateContentResponse> {
    Ok(serde_json::from_str(body)?)
}

/// Reduce a `generateContent` reply to answer text plus web citations.
pub fn to_model_response(response: &GenerateContentResponse) -> ModelResponse {
    let text = response.text().unwrap_or_else(|| {
        tracing::warn!("Gemini returned no text; using placeholder");
        EMPTY_ANALYSIS_TEXT.to_string()
    });

    ModelResponse {
        text,
        citations: response.citations(),
    }
}

#[async_trait]
impl ReportModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<ModelResponse, AnalysisError> {
        self.analyze(prompt)
            .await
            .map_err(|e| AnalysisError::Upstream(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = GeminiConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_config_falls_back_to_api_key() {
        let config = GeminiConfig::from_lookup(lookup(&[("API_KEY", "legacy")])).unwrap();
        assert_eq!(config.api_key, "legacy");
    }

    #[test]
    fn test_config_requires_key() {
        let err = GeminiConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, GeminiError::Config(_)));
    }

    #[test]
    fn test_config_overrides() {
        let config = GeminiConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-2.5-flash"),
            ("GEMINI_BASE_URL", "http://localhost:9000/v1beta/"),
            ("GEMINI_TIMEOUT_SECS", "45"),
        ]))
        .unwrap();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.base_url, "http://localhost:9000/v1beta");
        assert_eq!(config.timeout, Some(Duration::from_secs(45)));
    }

    #[test]
    fn test_config_rejects_bad_timeout() {
        let err = GeminiConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, GeminiError::Config(_)));
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(GeminiConfig::new("k")).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-preview:generateContent"
        );
    }

    #[test]
    fn test_empty_reply_uses_placeholder() {
        let response = to_model_response(&GenerateContentResponse::default());
        assert_eq!(response.text, EMPTY_ANALYSIS_TEXT);
        assert!(response.citations.is_empty());
    }

    #[test]
    fn test_undecodable_body_is_serialization_error() {
        let err = decode_response("<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, GeminiError::Serialization(_)));
    }

    #[test]
    fn test_decode_response_body() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello"}]}}]}"#;
        let response = decode_response(body).unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello"));
    }

    // Integration tests require API key, mark as ignored
    #[tokio::test]
    #[ignore = "requires GEMINI_API_KEY"]
    async fn test_live_grounded_analysis() {
        dotenvy::dotenv().ok();
        let client = GeminiClient::new(GeminiConfig::from_env().unwrap()).unwrap();
        let response = client.analyze(&analysis_prompt("AAPL")).await.unwrap();

        assert!(!response.text.is_empty());
    }
}
