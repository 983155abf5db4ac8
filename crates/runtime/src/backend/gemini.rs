//! Google Gemini backend.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TextBackend;
use crate::{Error, Result};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when neither config nor `GEMINI_MODEL_NAME` names one.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    contents: [ApiContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ApiContent<'a> {
    role: &'static str,
    parts: [ApiPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ApiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Builder for creating a Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiBackendBuilder {
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiBackendBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    /// Point the backend at another endpoint root.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build(self) -> GeminiBackend {
        GeminiBackend {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            model: self.model,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Gemini `generateContent` backend.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn builder(api_key: impl Into<String>, model: impl Into<String>) -> GeminiBackendBuilder {
        GeminiBackendBuilder::new(api_key, model)
    }

    /// Build from `GEMINI_API_KEY` and `GEMINI_MODEL_NAME`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::Config("GEMINI_API_KEY not set".into()))?;
        let model = std::env::var("GEMINI_MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Ok(Self::builder(api_key, model).build())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> Result<Url> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        Url::parse(&url).map_err(|e| Error::Config(format!("invalid Gemini endpoint {url}: {e}")))
    }
}

impl std::fmt::Display for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gemini({})", self.model)
    }
}

impl TextBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ApiRequest {
            contents: [ApiContent {
                role: "user",
                parts: [ApiPart { text: prompt }],
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");
        let response = self
            .client
            .post(self.endpoint()?)
            .header("x-goog-api-key", self.api_key.as_str())
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Api(e.without_url().to_string()))?;

        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or_else(|| Error::Api("response contained no candidates".into()))?;

        let text = candidate
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
