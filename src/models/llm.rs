use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Result of asking the model for a reply. The branch taken is kept so
/// callers can log it and flag it to the client; both carry the text that
/// gets persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    Generated { text: String },
    Fallback { text: String, reason: String },
}

impl ChatOutcome {
    pub fn text(&self) -> &str {
        match self {
            ChatOutcome::Generated { text } => text,
            ChatOutcome::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ChatOutcome::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            ChatOutcome::Generated { .. } => None,
            ChatOutcome::Fallback { reason, .. } => Some(reason),
        }
    }

    /// Advisory flag for JSON responses, omitted on the happy path
    pub fn fallback_flag(&self) -> Option<bool> {
        self.is_fallback().then_some(true)
    }

    pub fn into_text(self) -> String {
        match self {
            ChatOutcome::Generated { text } => text,
            ChatOutcome::Fallback { text, .. } => text,
        }
    }
}

// Gemini generateContent wire format

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
pub struct RequestContent {
    pub role: String,
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 encoded payload
    pub data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it produced any.
    pub fn first_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

// Error types for the generative model client
#[derive(Debug, ThisError)]
pub enum LLMError {
    #[error("Generative model is not configured")]
    NotConfigured,

    #[error("Generative model unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Response blocked: {0}")]
    Blocked(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}
