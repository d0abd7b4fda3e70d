use crate::context::wearable_metrics::summary_bullet_lines;
use crate::models::llm::{ChatOutcome, LLMError};
use crate::models::wearable::WearableSummary;

/// Fixed preamble placed at the top of every prompt.
pub const SAFETY_PREAMBLE: &str = "You are a compassionate and knowledgeable AI health assistant.
You provide evidence-based health information and support, personalized to the user's profile and recent wearable data.

Important guidelines:
- Always be empathetic and supportive
- Provide accurate, evidence-based health information
- Consider the user's profile and wearable data when responding
- NEVER diagnose conditions or prescribe medications
- Always recommend consulting healthcare professionals for serious concerns
- Be clear about the limitations of AI health advice
- Prioritize user safety and well-being";

/// Notice opening every rule-based reply.
pub const SAFETY_NOTICE: &str = "I'm not able to reach the AI assistant right now, so here is some general guidance instead. \
This is not medical advice: please consult a healthcare professional for any serious or persistent concern, \
and contact emergency services if you feel unwell right now.";

const GENERIC_SUGGESTIONS: [&str; 4] = [
    "- Aim for 7-9 hours of sleep with a consistent bedtime.",
    "- Try to move regularly; around 150 minutes of moderate activity per week is a common target.",
    "- Stay hydrated and favour balanced meals with vegetables, whole grains and protein.",
    "- Take short breaks to manage stress, for example a walk or a few minutes of slow breathing.",
];

/// Build the prompt sent to the model.
///
/// Empty blocks are left out entirely, so an absent profile and no wearable
/// data give preamble plus question.
pub fn assemble_prompt(profile_block: &str, wearable_block: &str, question: &str) -> String {
    let mut prompt = String::from(SAFETY_PREAMBLE);
    prompt.push_str("\n\n");

    if !profile_block.trim().is_empty() {
        prompt.push_str("User Profile:\n");
        prompt.push_str(profile_block.trim_end());
        prompt.push_str("\n\n");
    }

    if !wearable_block.trim().is_empty() {
        prompt.push_str(wearable_block.trim_end());
        prompt.push_str("\n\n");
    }

    prompt.push_str("User Question: ");
    prompt.push_str(question);
    prompt.push_str("\n\nPlease provide a helpful, personalized response:");
    prompt
}

/// Suggestions that react to what the summary shows, ahead of the generic ones.
fn data_aware_suggestions(summary: &WearableSummary) -> Vec<String> {
    let mut suggestions = Vec::new();

    if let Some(steps) = &summary.steps {
        if steps.average_per_day < 7000.0 {
            suggestions.push(
                "- Your daily steps are on the lower side; a short walk after meals is an easy way to add more."
                    .to_string(),
            );
        }
    }
    if let Some(sleep) = &summary.sleep {
        if sleep.average_hours_per_night < 7.0 {
            suggestions.push(
                "- You are averaging under 7 hours of sleep; an earlier, regular bedtime may help.".to_string(),
            );
        }
    }
    if let Some(spo2) = &summary.spo2 {
        if spo2.average_percent < 95.0 {
            suggestions.push(
                "- Your average SpO2 is below 95%; if this persists or you feel short of breath, talk to a doctor."
                    .to_string(),
            );
        }
    }

    suggestions
}

/// Rule-based reply used when the model cannot answer.
///
/// Contains every bullet of the rendered wearable summary unchanged and the
/// question verbatim.
pub fn fallback_response(summary: &WearableSummary, question: &str) -> String {
    let mut sections: Vec<String> = vec![SAFETY_NOTICE.to_string()];

    let bullets = summary_bullet_lines(summary);
    if !bullets.is_empty() {
        sections.push(format!(
            "Here is a summary of your recent wearable data (last {} days):\n{}",
            summary.window_days,
            bullets.join("\n")
        ));
    }

    let mut suggestions = data_aware_suggestions(summary);
    suggestions.extend(GENERIC_SUGGESTIONS.iter().map(|s| s.to_string()));
    sections.push(format!("General wellness suggestions:\n{}", suggestions.join("\n")));

    sections.push(format!(
        "Your question was: \"{}\"\nPlease try again later for a personalized answer.",
        question
    ));

    sections.join("\n\n")
}

/// Turn a model result into the outcome that gets persisted.
pub fn resolve_outcome<F>(result: Result<String, LLMError>, fallback: F) -> ChatOutcome
where
    F: FnOnce() -> String,
{
    match result {
        Ok(text) => ChatOutcome::Generated { text },
        Err(e) => {
            tracing::warn!("Generative model call failed, using fallback: {}", e);
            ChatOutcome::Fallback {
                text: fallback(),
                reason: e.to_string(),
            }
        }
    }
}

// Task prompts. Each one frames a request as a question so it flows through
// the same assembly as chat.

pub fn followup_checkin_question(title: &str, notes: Option<&str>) -> String {
    let mut question = format!(
        "I just completed my health follow-up \"{}\".",
        title
    );
    if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
        question.push_str(&format!(" My notes: {}", notes));
    }
    question.push_str(" Please give me a brief, encouraging check-in with one or two practical next steps.");
    question
}

pub const RECOMMENDATIONS_QUESTION: &str = "Based on my profile and recent wearable data, \
give me 3 to 5 specific, actionable recommendations to improve my activity, sleep and overall well-being.";

pub const INSIGHTS_QUESTION: &str = "Analyze my health data from the last 30 days. \
Point out notable patterns or changes, what is going well, and what I could focus on next.";

pub fn file_analysis_question(filename: &str, description: Option<&str>) -> String {
    let mut question = format!(
        "Please analyze the attached health document \"{}\" and explain it in plain language.",
        filename
    );
    if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
        question.push_str(&format!(" The user describes it as: {}.", description));
    }
    question.push_str(" Highlight values that may deserve a follow-up with a healthcare professional.");
    question
}

/// File analysis fallback. There is no wearable summary in play so only
/// the notice and the file name are restated.
pub fn file_analysis_fallback(filename: &str) -> String {
    format!(
        "{}\n\nThe document \"{}\" was stored successfully but could not be analyzed right now. \
Please try again later, and share the document with your healthcare provider for an expert review.",
        SAFETY_NOTICE, filename
    )
}
