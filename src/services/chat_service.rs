use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::context::prompt::{assemble_prompt, fallback_response, resolve_outcome};
use crate::context::wearable_metrics::{load_wearable_summary, render_wearable_summary};
use crate::context::build_profile_context;
use crate::db::profile::fetch_profile;
use crate::models::llm::ChatOutcome;
use crate::models::wearable::WearableSummary;
use crate::services::gemini_service::GeminiService;

/// Everything the prompt needs about one user, read once per request.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub profile_block: String,
    pub summary: WearableSummary,
    pub wearable_block: String,
}

impl ChatContext {
    pub fn new(profile_block: String, summary: WearableSummary) -> Self {
        let wearable_block = render_wearable_summary(&summary);
        Self {
            profile_block,
            summary,
            wearable_block,
        }
    }

    pub fn prompt_for(&self, question: &str) -> String {
        assemble_prompt(&self.profile_block, &self.wearable_block, question)
    }

    pub fn fallback_for(&self, question: &str) -> String {
        fallback_response(&self.summary, question)
    }
}

#[tracing::instrument(name = "Load chat context", skip(pool), fields(user_id = %user_id))]
pub async fn load_chat_context(
    pool: &PgPool,
    user_id: Uuid,
    window_days: i64,
    now: DateTime<Utc>,
) -> Result<ChatContext, sqlx::Error> {
    let profile = fetch_profile(pool, user_id).await?;
    let profile_block = build_profile_context(profile.as_ref());
    let (summary, _) = load_wearable_summary(pool, user_id, window_days, now).await?;
    Ok(ChatContext::new(profile_block, summary))
}

/// Ask the model and fall back to the rule-based reply on any failure.
pub async fn generate_reply(
    gemini: &GeminiService,
    context: &ChatContext,
    question: &str,
) -> ChatOutcome {
    let prompt = context.prompt_for(question);
    let result = gemini.generate_text(&prompt).await;
    let outcome = resolve_outcome(result, || context.fallback_for(question));

    if let Some(reason) = outcome.fallback_reason() {
        tracing::info!("Answered with fallback reply: {}", reason);
    }
    outcome
}
