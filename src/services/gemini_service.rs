use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use secrecy::ExposeSecret;

use crate::config::gemini::GeminiSettings;
use crate::models::llm::{
    GenerateContentRequest, GenerateContentResponse, InlineData, LLMError, RequestContent,
    RequestPart,
};

/// Thin client for the Gemini `generateContent` endpoint. One attempt per
/// call; callers fall back on any error.
#[derive(Clone)]
pub struct GeminiService {
    client: Client,
    settings: GeminiSettings,
}

impl GeminiService {
    pub fn new(settings: GeminiSettings) -> Result<Self, LLMError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        if !settings.is_configured() {
            tracing::warn!("No Gemini API key configured, replies will use the fallback template");
        }

        Ok(Self { client, settings })
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_configured()
    }

    #[tracing::instrument(name = "Generate model text", skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn generate_text(&self, prompt: &str) -> Result<String, LLMError> {
        let parts = vec![RequestPart::Text { text: prompt.to_string() }];
        self.generate(parts).await
    }

    /// Prompt plus one inline attachment (image or PDF).
    #[tracing::instrument(
        name = "Generate model text with attachment",
        skip(self, prompt, data),
        fields(mime_type = %mime_type, size = data.len())
    )]
    pub async fn generate_with_attachment(
        &self,
        prompt: &str,
        data: &[u8],
        mime_type: &str,
    ) -> Result<String, LLMError> {
        let parts = vec![
            RequestPart::Text { text: prompt.to_string() },
            RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: STANDARD.encode(data),
                },
            },
        ];
        self.generate(parts).await
    }

    async fn generate(&self, parts: Vec<RequestPart>) -> Result<String, LLMError> {
        if !self.settings.is_configured() {
            return Err(LLMError::NotConfigured);
        }

        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user".to_string(),
                parts,
            }],
        };

        let response = self
            .client
            .post(self.settings.generate_content_url())
            .header("x-goog-api-key", self.settings.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::NetworkError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                429 => LLMError::RateLimited,
                500..=599 => LLMError::ServiceUnavailable(error_text),
                _ => LLMError::InvalidResponse(format!("HTTP {}: {}", status, error_text)),
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LLMError::InvalidResponse(e.to_string()))?;

        if let Some(reason) = body
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(LLMError::Blocked(reason));
        }

        match body.first_text() {
            Some(text) => Ok(text),
            None => {
                let finish_reason = body
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.clone())
                    .unwrap_or_else(|| "no candidates".to_string());
                Err(LLMError::InvalidResponse(format!("Empty content ({})", finish_reason)))
            }
        }
    }
}
