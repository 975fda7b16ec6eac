// src/services/copywriter.rs
use axum::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::{Capability, GatewayError};
use crate::config::GeminiConfig;
use crate::models::CopySuggestion;
use crate::utils::validation::collapse_whitespace;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models/";

/// Remote side of the copy gateway: prompt in, JSON text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_json(&self, prompt: &str) -> Result<String, GatewayError>;
}

pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: url::Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|part| part.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let endpoint = url::Url::parse(GEMINI_API_BASE)?
            .join(&format!("./{}:generateContent", config.model))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("glitchhunt/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_json(&self, prompt: &str) -> Result<String, GatewayError> {
        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Remote {
                status: status.as_u16(),
                code: None,
                message,
                details: None,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed.text().ok_or(GatewayError::EmptyResponse("gemini"))
    }
}

/// A suggestion plus whether it came from the model or the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub suggestion: CopySuggestion,
    pub from_fallback: bool,
}

#[derive(Clone)]
pub struct CopyGateway {
    generator: Capability<Arc<dyn TextGenerator>>,
}

impl CopyGateway {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Capability::Configured(generator),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            generator: Capability::Unconfigured { service: "gemini" },
        }
    }

    pub fn from_config(config: Option<&GeminiConfig>, timeout: Duration) -> Self {
        let Some(config) = config else {
            return Self::unconfigured();
        };
        match GeminiClient::new(config, timeout) {
            Ok(client) => Self::new(Arc::new(client)),
            Err(e) => {
                warn!(error = %e, "Gemini client could not be built; serving fallback copy");
                Self::unconfigured()
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_configured()
    }

    pub async fn generate_marketing_copy(&self, niche: &str, style: &str) -> CopySuggestion {
        self.generate(niche, style).await.suggestion
    }

    pub async fn generate(&self, niche: &str, style: &str) -> Generated {
        match self.try_generate(niche, style).await {
            Ok(suggestion) => {
                info!(niche, style, "Generated marketing copy");
                Generated {
                    suggestion,
                    from_fallback: false,
                }
            }
            Err(e) => {
                error!(error = %e, "Gemini API error");
                Generated {
                    suggestion: CopySuggestion::fallback(),
                    from_fallback: true,
                }
            }
        }
    }

    async fn try_generate(&self, niche: &str, style: &str) -> Result<CopySuggestion, GatewayError> {
        let generator = self.generator.get()?;
        let text = generator.generate_json(&build_prompt(niche, style)).await?;
        parse_suggestion(&text)
    }
}

pub fn build_prompt(niche: &str, style: &str) -> String {
    format!(
        r#"You are a world-class copywriter for a SaaS landing page.
The product is a "Reddit-style" community platform where users post issues and bugs found in web apps, mobile apps, and services.

Target Niche: {}
Design Style: {}

Generate a JSON object with exactly these string fields:
- "headline": a catchy, short headline (max 8 words).
- "subheadline": a compelling subheadline (max 20 words).
- "cta": a strong call to action button text (max 4 words).

Do not include markdown code blocks. Just the raw JSON string."#,
        collapse_whitespace(niche),
        collapse_whitespace(style)
    )
}

/// Parses the model's reply, tolerating a stray markdown fence.
pub fn parse_suggestion(text: &str) -> Result<CopySuggestion, GatewayError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    Ok(serde_json::from_str(unfenced.trim())?)
}
