use medlm_backend::context::build_profile_context;
use medlm_backend::models::profile::UserProfile;

#[test]
fn absent_or_empty_profile_renders_nothing() {
    assert_eq!(build_profile_context(None), "");
    assert_eq!(build_profile_context(Some(&UserProfile::default())), "");

    let blank = UserProfile {
        full_name: Some(String::new()),
        gender: Some("  ".to_string()),
        ..Default::default()
    };
    assert_eq!(build_profile_context(Some(&blank)), "");
}

#[test]
fn one_field_gives_one_labeled_line() {
    let profile = UserProfile {
        current_medications: Some("Metformin 500mg".to_string()),
        ..Default::default()
    };

    let block = build_profile_context(Some(&profile));

    assert_eq!(block, "Current Medications: Metformin 500mg");
    assert_eq!(block.lines().count(), 1);
}

#[test]
fn full_profile_uses_every_label_in_order() {
    let profile = UserProfile {
        full_name: Some("Jordan Lee".to_string()),
        age: Some(52),
        gender: Some("Non-binary".to_string()),
        medical_history: Some("Type 2 diabetes".to_string()),
        allergies: Some("None known".to_string()),
        current_medications: Some("Metformin".to_string()),
        health_goals: Some("Lower HbA1c".to_string()),
    };

    let lines: Vec<String> = build_profile_context(Some(&profile))
        .lines()
        .map(|l| l.split(':').next().unwrap().to_string())
        .collect();

    assert_eq!(
        lines,
        vec![
            "Name",
            "Age",
            "Gender",
            "Medical History",
            "Allergies",
            "Current Medications",
            "Health Goals"
        ]
    );
}

#[test]
fn zero_age_is_left_out() {
    let profile = UserProfile {
        age: Some(0),
        gender: Some("Female".to_string()),
        ..Default::default()
    };

    assert_eq!(build_profile_context(Some(&profile)), "Gender: Female");
}
