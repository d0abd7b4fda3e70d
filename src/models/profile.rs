use serde::{Deserialize, Deserializer, Serialize};

/// Free-text health profile. Every field is optional; an empty profile is
/// a valid profile.
#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub full_name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub current_medications: Option<String>,
    pub health_goals: Option<String>,
}

/// Wholesale replacement of the profile. Missing fields clear the stored value.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_age")]
    pub age: Option<i32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub current_medications: Option<String>,
    #[serde(default)]
    pub health_goals: Option<String>,
}

pub const MIN_AGE: i32 = 0;
pub const MAX_AGE: i32 = 150;

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(age) = self.age {
            if !(MIN_AGE..=MAX_AGE).contains(&age) {
                return Err(format!("Age must be between {} and {}", MIN_AGE, MAX_AGE));
            }
        }
        Ok(())
    }

    /// Blank strings are stored as NULL so the context builder sees them as absent.
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            full_name: non_blank(self.full_name),
            age: self.age,
            gender: non_blank(self.gender),
            medical_history: non_blank(self.medical_history),
            allergies: non_blank(self.allergies),
            current_medications: non_blank(self.current_medications),
            health_goals: non_blank(self.health_goals),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The profile form posts age as a number, a numeric string or "".
fn deserialize_optional_age<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AgeInput {
        Number(i64),
        Text(String),
    }

    match Option::<AgeInput>::deserialize(deserializer)? {
        None => Ok(None),
        Some(AgeInput::Number(n)) => i32::try_from(n)
            .map(Some)
            .map_err(|_| serde::de::Error::custom("age out of range")),
        Some(AgeInput::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                trimmed
                    .parse::<i32>()
                    .map(Some)
                    .map_err(|_| serde::de::Error::custom("age must be a whole number"))
            }
        }
    }
}
