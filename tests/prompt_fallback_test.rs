use chrono::{Local, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use medlm_backend::context::prompt::{SAFETY_NOTICE, SAFETY_PREAMBLE};
use medlm_backend::context::{
    aggregate_samples, assemble_prompt, build_profile_context, fallback_response,
    render_wearable_summary, resolve_outcome, summary_bullet_lines,
};
use medlm_backend::models::llm::{ChatOutcome, LLMError};
use medlm_backend::models::profile::UserProfile;
use medlm_backend::models::wearable::{WearableSample, WearableSummary};

fn steps_sample(value: f64, day: u32) -> WearableSample {
    let recorded_at = Local
        .from_local_datetime(&NaiveDate::from_ymd_opt(2025, 6, day).unwrap().and_hms_opt(12, 0, 0).unwrap())
        .earliest()
        .unwrap()
        .with_timezone(&Utc);
    WearableSample {
        id: Uuid::new_v4(),
        user_id: Uuid::nil(),
        metric: "steps".to_string(),
        value,
        unit: "count".to_string(),
        source: "demo".to_string(),
        metadata: None,
        recorded_at,
        created_at: recorded_at,
    }
}

#[test]
fn prompt_contains_profile_data_and_question_in_order() {
    let profile = UserProfile {
        full_name: Some("Sam".to_string()),
        allergies: Some("Peanuts".to_string()),
        ..Default::default()
    };
    let summary = aggregate_samples(&[steps_sample(9000.0, 1)], 7);

    let prompt = assemble_prompt(
        &build_profile_context(Some(&profile)),
        &render_wearable_summary(&summary),
        "Is my activity level OK?",
    );

    let preamble = prompt.find(SAFETY_PREAMBLE).expect("preamble");
    let profile_at = prompt.find("User Profile:\nName: Sam\nAllergies: Peanuts").expect("profile");
    let wearable_at = prompt.find("Wearable Data (last 7 days):").expect("wearable block");
    let question_at = prompt.find("User Question: Is my activity level OK?").expect("question");

    assert!(preamble < profile_at && profile_at < wearable_at && wearable_at < question_at);
    assert!(prompt.ends_with("Please provide a helpful, personalized response:"));
}

#[test]
fn missing_profile_and_data_give_preamble_and_question_only() {
    let prompt = assemble_prompt(&build_profile_context(None), "", "Hello?");

    assert_eq!(
        prompt,
        format!(
            "{}\n\nUser Question: Hello?\n\nPlease provide a helpful, personalized response:",
            SAFETY_PREAMBLE
        )
    );
}

#[test]
fn fallback_restates_every_bullet_and_the_question() {
    let summary = aggregate_samples(&[steps_sample(4000.0, 1), steps_sample(5000.0, 2)], 7);
    let question = "Why am I always tired?";

    let reply = fallback_response(&summary, question);

    assert!(reply.starts_with(SAFETY_NOTICE));
    for bullet in summary_bullet_lines(&summary) {
        assert!(reply.contains(&bullet), "missing bullet {}", bullet);
    }
    assert!(reply.contains(&format!("\"{}\"", question)));
    // Low step count triggers the walking suggestion
    assert!(reply.contains("short walk after meals"));
}

#[test]
fn fallback_without_data_still_gives_general_advice() {
    let reply = fallback_response(&WearableSummary::empty(7), "Any tips?");

    assert!(reply.starts_with(SAFETY_NOTICE));
    assert!(!reply.contains("summary of your recent wearable data"));
    assert!(reply.contains("General wellness suggestions:"));
    assert!(reply.contains("\"Any tips?\""));
}

#[test]
fn every_model_error_resolves_to_a_fallback() {
    let errors = vec![
        LLMError::NotConfigured,
        LLMError::Timeout,
        LLMError::RateLimited,
        LLMError::ServiceUnavailable("503".to_string()),
        LLMError::InvalidResponse("empty".to_string()),
    ];

    for error in errors {
        let outcome = resolve_outcome(Err(error), || "fallback".to_string());
        assert!(outcome.is_fallback());
        assert_eq!(outcome.fallback_flag(), Some(true));
        assert_eq!(outcome.text(), "fallback");
    }
}

#[test]
fn model_text_passes_through_untouched() {
    let outcome = resolve_outcome(Ok("Drink water.".to_string()), || unreachable!());

    assert_eq!(outcome, ChatOutcome::Generated { text: "Drink water.".to_string() });
    assert_eq!(outcome.fallback_flag(), None);
}
