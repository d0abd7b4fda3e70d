use chrono::{Duration, TimeZone, Utc};

use medlm_backend::models::followup::FollowUpFrequency;

#[test]
fn fixed_frequencies_add_whole_days() {
    let from = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();

    assert_eq!(FollowUpFrequency::Daily.next_due_after(from), from + Duration::days(1));
    assert_eq!(FollowUpFrequency::Weekly.next_due_after(from), from + Duration::days(7));
    assert_eq!(FollowUpFrequency::Biweekly.next_due_after(from), from + Duration::days(14));
}

#[test]
fn monthly_clamps_to_the_end_of_a_shorter_month() {
    let from = Utc.with_ymd_and_hms(2025, 1, 31, 9, 0, 0).unwrap();

    assert_eq!(
        FollowUpFrequency::Monthly.next_due_after(from),
        Utc.with_ymd_and_hms(2025, 2, 28, 9, 0, 0).unwrap()
    );
}

#[test]
fn frequency_names_are_case_insensitive() {
    assert_eq!("Weekly".parse::<FollowUpFrequency>(), Ok(FollowUpFrequency::Weekly));
    assert_eq!(" monthly ".parse::<FollowUpFrequency>(), Ok(FollowUpFrequency::Monthly));
    assert!("yearly".parse::<FollowUpFrequency>().is_err());
}
