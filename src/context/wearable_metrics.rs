use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::wearables::fetch_samples_between;
use crate::models::wearable::{
    ActivitySummary, HeartRateSummary, MetricKind, SeriesPoint, SleepSummary, Spo2Summary,
    StepsSummary, WearableSample, WearableSummary,
};

/// Start of a trailing window of `window_days` calendar days ending at `now`.
///
/// Today is the last day of the window, so the start is local midnight of
/// `today - (window_days - 1)`.
pub fn window_start(now: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    let first_day = bucket_date(now) - Duration::days(window_days.max(1) - 1);
    // Midnight can be skipped by a DST change
    local_time(first_day, 0, 0)
        .or_else(|| local_time(first_day, 1, 0))
        .unwrap_or_else(|| now - Duration::days(window_days))
}

/// Calendar date of a sample in server-local time.
pub fn bucket_date(recorded_at: DateTime<Utc>) -> NaiveDate {
    recorded_at.with_timezone(&Local).date_naive()
}

/// Parse a device-supplied timestamp.
///
/// Accepts RFC 3339, naive ISO date-times (server-local), bare dates (local
/// noon) and unix epochs in seconds or milliseconds between 2000 and 2100.
/// Anything else is treated as `now`; the second value reports whether that
/// fallback was taken. A missing timestamp means "now" and is not a fallback.
pub fn parse_recorded_at(raw: Option<&str>, now: DateTime<Utc>) -> (DateTime<Utc>, bool) {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return (now, false);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return (ts.with_timezone(&Utc), false);
    }

    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            if let Some(local) = Local.from_local_datetime(&naive).earliest() {
                return (local.with_timezone(&Utc), false);
            }
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(local) = local_noon(date) {
            return (local, false);
        }
    }

    if let Some(ts) = raw.parse::<i64>().ok().and_then(epoch_timestamp) {
        return (ts, false);
    }

    tracing::warn!("Unparseable sample timestamp '{}', bucketing as now", raw);
    (now, true)
}

// 2000-01-01 and 2100-01-01 in unix seconds
const EPOCH_MIN_SECS: i64 = 946_684_800;
const EPOCH_MAX_SECS: i64 = 4_102_444_800;

/// Unix seconds, or milliseconds as most browsers and devices send them.
/// Numbers outside both plausible ranges are not timestamps.
fn epoch_timestamp(value: i64) -> Option<DateTime<Utc>> {
    if (EPOCH_MIN_SECS..EPOCH_MAX_SECS).contains(&value) {
        DateTime::from_timestamp(value, 0)
    } else if (EPOCH_MIN_SECS * 1000..EPOCH_MAX_SECS * 1000).contains(&value) {
        DateTime::from_timestamp_millis(value)
    } else {
        None
    }
}

/// `hour:minute` on `date` in server-local time
pub fn local_time(date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let naive = date.and_time(NaiveTime::from_hms_opt(hour, minute, 0)?);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Noon on `date` in server-local time, used for day-level samples.
pub fn local_noon(date: NaiveDate) -> Option<DateTime<Utc>> {
    local_time(date, 12, 0)
}

/// `[start, end)` of a local calendar day
pub fn local_day_bounds(date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = local_time(date, 0, 0)?;
    let end = local_time(date.succ_opt()?, 0, 0)?;
    Some((start, end))
}

/// Sleep values normalised to hours. The unit wins; with no unit the
/// metric name decides (`sleep_minutes`), otherwise hours are assumed.
pub fn sleep_hours(value: f64, unit: &str, metric: &str) -> f64 {
    let unit = unit.trim().to_lowercase();
    let unit = if unit.is_empty() && metric.eq_ignore_ascii_case("sleep_minutes") {
        "minutes".to_string()
    } else {
        unit
    };

    match unit.as_str() {
        "min" | "mins" | "minute" | "minutes" => value / 60.0,
        "s" | "sec" | "secs" | "second" | "seconds" => value / 3600.0,
        _ => value,
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Aggregate the samples of one window into per-family figures.
///
/// Steps and sleep are summed per calendar day first and then averaged over
/// the days that have data. Families without samples stay `None`. Output is
/// rounded to one decimal and depends only on the input order, so the same
/// rows always produce the same summary.
pub fn aggregate_samples(samples: &[WearableSample], window_days: i64) -> WearableSummary {
    let mut steps_by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut sleep_by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut heart_rate: Vec<f64> = Vec::new();
    let mut resting: Vec<f64> = Vec::new();
    let mut spo2: Vec<f64> = Vec::new();
    let mut active_minutes: Vec<f64> = Vec::new();
    let mut other_metrics: BTreeMap<String, usize> = BTreeMap::new();

    for sample in samples {
        match sample.kind() {
            MetricKind::Steps => {
                *steps_by_day.entry(bucket_date(sample.recorded_at)).or_insert(0.0) += sample.value;
            }
            MetricKind::Sleep => {
                *sleep_by_day.entry(bucket_date(sample.recorded_at)).or_insert(0.0) +=
                    sleep_hours(sample.value, &sample.unit, &sample.metric);
            }
            MetricKind::HeartRate => heart_rate.push(sample.value),
            MetricKind::RestingHeartRate => resting.push(sample.value),
            MetricKind::SpO2 => spo2.push(sample.value),
            MetricKind::ActiveMinutes => active_minutes.push(sample.value),
            MetricKind::Other(name) => *other_metrics.entry(name).or_insert(0) += 1,
        }
    }

    if !other_metrics.is_empty() {
        tracing::debug!("Samples outside the aggregated families: {:?}", other_metrics);
    }

    let steps = (!steps_by_day.is_empty()).then(|| {
        let total: f64 = steps_by_day.values().sum();
        StepsSummary {
            average_per_day: round1(total / steps_by_day.len() as f64),
            total: round1(total),
            days_counted: steps_by_day.len(),
        }
    });

    let sleep = (!sleep_by_day.is_empty()).then(|| {
        let total: f64 = sleep_by_day.values().sum();
        SleepSummary {
            average_hours_per_night: round1(total / sleep_by_day.len() as f64),
            nights_counted: sleep_by_day.len(),
        }
    });

    let heart_rate_summary = if heart_rate.is_empty() && resting.is_empty() {
        None
    } else {
        Some(HeartRateSummary {
            average: mean(&heart_rate).map(round1),
            min: heart_rate.iter().copied().reduce(f64::min).map(round1),
            max: heart_rate.iter().copied().reduce(f64::max).map(round1),
            resting_average: mean(&resting).map(round1),
            samples: heart_rate.len(),
            resting_samples: resting.len(),
        })
    };

    let spo2_summary = mean(&spo2).map(|avg| Spo2Summary {
        average_percent: round1(avg),
        samples: spo2.len(),
    });

    let activity = (!active_minutes.is_empty()).then(|| ActivitySummary {
        active_minutes_total: round1(active_minutes.iter().sum()),
        samples: active_minutes.len(),
    });

    WearableSummary {
        window_days,
        steps,
        sleep,
        heart_rate: heart_rate_summary,
        spo2: spo2_summary,
        activity,
        other_metrics,
    }
}

/// One bullet per non-empty family, in a fixed order.
pub fn summary_bullet_lines(summary: &WearableSummary) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(steps) = &summary.steps {
        lines.push(format!(
            "- Steps: {:.0} average per day over {} day(s) ({:.0} total)",
            steps.average_per_day, steps.days_counted, steps.total
        ));
    }
    if let Some(sleep) = &summary.sleep {
        lines.push(format!(
            "- Sleep: {:.1} hours average per night over {} night(s)",
            sleep.average_hours_per_night, sleep.nights_counted
        ));
    }
    if let Some(hr) = &summary.heart_rate {
        if let (Some(avg), Some(min), Some(max)) = (hr.average, hr.min, hr.max) {
            lines.push(format!(
                "- Heart Rate: {:.0} bpm average (range {:.0}-{:.0} bpm)",
                avg, min, max
            ));
        }
        if let Some(resting) = hr.resting_average {
            lines.push(format!("- Resting Heart Rate: {:.0} bpm average", resting));
        }
    }
    if let Some(spo2) = &summary.spo2 {
        lines.push(format!("- SpO2: {:.1}% average", spo2.average_percent));
    }
    if let Some(activity) = &summary.activity {
        lines.push(format!(
            "- Active Minutes: {:.0} total",
            activity.active_minutes_total
        ));
    }

    lines
}

/// Text block for the prompt; empty when no family has data.
pub fn render_wearable_summary(summary: &WearableSummary) -> String {
    let lines = summary_bullet_lines(summary);
    if lines.is_empty() {
        return String::new();
    }
    format!(
        "Wearable Data (last {} days):\n{}",
        summary.window_days,
        lines.join("\n")
    )
}

/// Per-day values for one metric family: daily totals for steps, sleep
/// (in hours) and active minutes, daily means for everything else.
pub fn daily_series(samples: &[WearableSample], metric: &MetricKind) -> Vec<SeriesPoint> {
    let mut by_day: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

    for sample in samples.iter().filter(|s| &s.kind() == metric) {
        let value = match metric {
            MetricKind::Sleep => sleep_hours(sample.value, &sample.unit, &sample.metric),
            _ => sample.value,
        };
        let entry = by_day.entry(bucket_date(sample.recorded_at)).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    by_day
        .into_iter()
        .map(|(date, (sum, count))| SeriesPoint {
            date,
            value: if metric.is_daily_total() {
                round1(sum)
            } else {
                round1(sum / count as f64)
            },
        })
        .collect()
}

/// Load the window's samples and aggregate them.
#[tracing::instrument(
    name = "Summarize wearable metrics",
    skip(pool),
    fields(user_id = %user_id, window_days = window_days)
)]
pub async fn load_wearable_summary(
    pool: &PgPool,
    user_id: Uuid,
    window_days: i64,
    now: DateTime<Utc>,
) -> Result<(WearableSummary, Vec<WearableSample>), sqlx::Error> {
    let samples = fetch_samples_between(pool, user_id, window_start(now, window_days), now).await?;
    let summary = aggregate_samples(&samples, window_days);
    Ok((summary, samples))
}
