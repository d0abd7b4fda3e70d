use crate::models::profile::UserProfile;

/// Render the non-empty profile fields as labeled lines, one per field.
///
/// A missing profile, or one where every field is empty, renders as "".
pub fn build_profile_context(profile: Option<&UserProfile>) -> String {
    let Some(profile) = profile else {
        return String::new();
    };

    // An age of zero is an unset form field
    let age = profile.age.filter(|a| *a > 0).map(|a| a.to_string());
    let fields: [(&str, Option<&str>); 7] = [
        ("Name", profile.full_name.as_deref()),
        ("Age", age.as_deref()),
        ("Gender", profile.gender.as_deref()),
        ("Medical History", profile.medical_history.as_deref()),
        ("Allergies", profile.allergies.as_deref()),
        ("Current Medications", profile.current_medications.as_deref()),
        ("Health Goals", profile.health_goals.as_deref()),
    ];

    fields
        .iter()
        .filter_map(|&(label, value)| {
            let value = value?.trim();
            if value.is_empty() {
                None
            } else {
                Some(format!("{}: {}", label, value))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
