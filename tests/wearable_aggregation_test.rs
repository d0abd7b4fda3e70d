use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use medlm_backend::context::wearable_metrics::{
    aggregate_samples, bucket_date, daily_series, parse_recorded_at, render_wearable_summary,
    summary_bullet_lines, window_start,
};
use medlm_backend::models::wearable::{MetricKind, WearableSample};

fn at_local(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    Local
        .from_local_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
        .earliest()
        .unwrap()
        .with_timezone(&Utc)
}

fn sample(metric: &str, value: f64, unit: &str, recorded_at: DateTime<Utc>) -> WearableSample {
    WearableSample {
        id: Uuid::new_v4(),
        user_id: Uuid::nil(),
        metric: metric.to_string(),
        value,
        unit: unit.to_string(),
        source: "test".to_string(),
        metadata: None,
        recorded_at,
        created_at: recorded_at,
    }
}

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, n).unwrap()
}

#[test]
fn no_samples_render_nothing() {
    let summary = aggregate_samples(&[], 7);
    assert!(!summary.has_data());
    assert!(summary_bullet_lines(&summary).is_empty());
    assert_eq!(render_wearable_summary(&summary), "");
}

#[test]
fn steps_are_summed_per_day_then_averaged_over_days_with_data() {
    let samples = vec![
        sample("steps", 3000.0, "count", at_local(day(1), 9)),
        sample("steps", 5000.0, "count", at_local(day(1), 18)),
        sample("steps", 6000.0, "count", at_local(day(3), 12)),
    ];

    let summary = aggregate_samples(&samples, 7);
    let steps = summary.steps.expect("steps summary");

    assert_eq!(steps.days_counted, 2);
    assert_eq!(steps.total, 14000.0);
    assert_eq!(steps.average_per_day, 7000.0);
}

#[test]
fn sleep_minutes_are_reported_in_hours() {
    let samples = vec![
        sample("sleep_minutes", 420.0, "minutes", at_local(day(1), 7)),
        sample("sleep_hours", 8.0, "hours", at_local(day(2), 7)),
    ];

    let summary = aggregate_samples(&samples, 7);
    let sleep = summary.sleep.expect("sleep summary");

    assert_eq!(sleep.nights_counted, 2);
    assert_eq!(sleep.average_hours_per_night, 7.5);
}

#[test]
fn heart_rate_keeps_range_and_resting_average_apart() {
    let samples = vec![
        sample("heart_rate", 60.0, "bpm", at_local(day(1), 8)),
        sample("heart_rate", 90.0, "bpm", at_local(day(1), 14)),
        sample("heart_rate", 75.0, "bpm", at_local(day(2), 10)),
        sample("resting_heart_rate", 58.0, "bpm", at_local(day(1), 12)),
    ];

    let summary = aggregate_samples(&samples, 7);
    let hr = summary.heart_rate.expect("heart rate summary");

    assert_eq!(hr.average, Some(75.0));
    assert_eq!(hr.min, Some(60.0));
    assert_eq!(hr.max, Some(90.0));
    assert_eq!(hr.resting_average, Some(58.0));
    assert_eq!(hr.samples, 3);
}

#[test]
fn unknown_metrics_are_counted_not_aggregated() {
    let samples = vec![
        sample("calories", 2100.0, "kcal", at_local(day(1), 12)),
        sample("body_temperature", 36.6, "celsius", at_local(day(1), 12)),
        sample("body_temperature", 36.8, "celsius", at_local(day(2), 12)),
    ];

    let summary = aggregate_samples(&samples, 7);

    assert!(!summary.has_data());
    assert_eq!(summary.other_metrics.get("body_temperature"), Some(&2));
    assert_eq!(summary.other_metrics.get("calories"), Some(&1));
}

#[test]
fn rendered_block_lists_families_in_a_fixed_order() {
    let samples = vec![
        sample("spo2", 97.0, "percent", at_local(day(1), 4)),
        sample("active_minutes", 30.0, "minutes", at_local(day(1), 12)),
        sample("steps", 8000.0, "count", at_local(day(1), 12)),
        sample("sleep_hours", 7.0, "hours", at_local(day(1), 7)),
    ];

    let text = render_wearable_summary(&aggregate_samples(&samples, 7));

    assert_eq!(
        text,
        "Wearable Data (last 7 days):\n\
         - Steps: 8000 average per day over 1 day(s) (8000 total)\n\
         - Sleep: 7.0 hours average per night over 1 night(s)\n\
         - SpO2: 97.0% average\n\
         - Active Minutes: 30 total"
    );
}

#[test]
fn same_rows_give_the_same_summary() {
    let samples: Vec<WearableSample> = (1..=5)
        .flat_map(|d| {
            vec![
                sample("steps", 1000.0 * d as f64, "count", at_local(day(d), 10)),
                sample("heart_rate", 60.0 + d as f64, "bpm", at_local(day(d), 11)),
            ]
        })
        .collect();

    assert_eq!(aggregate_samples(&samples, 7), aggregate_samples(&samples, 7));
}

#[test]
fn daily_series_sums_steps_and_averages_heart_rate() {
    let samples = vec![
        sample("steps", 1000.0, "count", at_local(day(1), 9)),
        sample("steps", 2000.0, "count", at_local(day(1), 19)),
        sample("heart_rate", 60.0, "bpm", at_local(day(1), 9)),
        sample("heart_rate", 80.0, "bpm", at_local(day(1), 19)),
    ];

    let steps = daily_series(&samples, &MetricKind::Steps);
    let hr = daily_series(&samples, &MetricKind::HeartRate);

    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].date, day(1));
    assert_eq!(steps[0].value, 3000.0);
    assert_eq!(hr[0].value, 70.0);
}

#[test]
fn malformed_timestamp_falls_back_to_now() {
    let now = Utc::now();

    let (ts, fallback) = parse_recorded_at(Some("yesterday-ish"), now);
    assert!(fallback);
    assert_eq!(ts, now);

    let (ts, fallback) = parse_recorded_at(None, now);
    assert!(!fallback);
    assert_eq!(ts, now);
}

#[test]
fn accepted_timestamp_formats() {
    let now = Utc::now();

    let (ts, fallback) = parse_recorded_at(Some("2025-06-01T08:30:00Z"), now);
    assert!(!fallback);
    assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap());

    let (ts, fallback) = parse_recorded_at(Some("2025-06-01"), now);
    assert!(!fallback);
    assert_eq!(bucket_date(ts), day(1));

    let (ts, fallback) = parse_recorded_at(Some("1748766600"), now);
    assert!(!fallback);
    assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap());
}

#[test]
fn millisecond_epochs_are_read_as_milliseconds() {
    let now = Utc::now();

    let (ts, fallback) = parse_recorded_at(Some("1748766600000"), now);

    assert!(!fallback);
    assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap());
}

#[test]
fn implausible_numbers_fall_back_to_now() {
    let now = Utc::now();

    for raw in ["2025", "0", "-1748766600", "99999999999999999"] {
        let (ts, fallback) = parse_recorded_at(Some(raw), now);
        assert!(fallback, "{} should not parse as a timestamp", raw);
        assert_eq!(ts, now);
    }
}

#[test]
fn window_covers_whole_calendar_days_ending_today() {
    let now = at_local(day(10), 15);

    let start = window_start(now, 7);

    assert_eq!(start, at_local(day(4), 0));
    // Evening of the day before the window stays out
    assert!(at_local(day(3), 19) < start);
    assert_eq!(window_start(now, 1), at_local(day(10), 0));
}

#[test]
fn samples_late_in_the_day_stay_on_their_local_date() {
    let late = at_local(day(2), 23);
    let early_next = late + Duration::hours(2);

    assert_eq!(bucket_date(late), day(2));
    assert_eq!(bucket_date(early_next), day(3));
}

#[test]
fn two_days_of_steps_average_over_days_with_data() {
    let samples = vec![
        sample("steps", 3000.0, "count", at_local(day(1), 8)),
        sample("steps", 4000.0, "count", at_local(day(1), 17)),
        sample("steps", 9000.0, "count", at_local(day(2), 12)),
    ];

    let steps = aggregate_samples(&samples, 7).steps.expect("steps summary");

    assert_eq!(steps.average_per_day, 8000.0);
    assert_eq!(steps.total, 16000.0);
    assert_eq!(steps.days_counted, 2);
}

#[test]
fn one_night_of_450_minutes_is_seven_and_a_half_hours() {
    let samples = vec![sample("sleep", 450.0, "minutes", at_local(day(4), 7))];

    let summary = aggregate_samples(&samples, 7);

    assert_eq!(summary.sleep.as_ref().expect("sleep summary").average_hours_per_night, 7.5);
    assert!(summary.heart_rate.is_none());
    assert!(!render_wearable_summary(&summary).contains("Heart Rate"));
}
