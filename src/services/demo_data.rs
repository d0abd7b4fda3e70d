use chrono::{DateTime, Duration, Local, Utc};
use rand::Rng;
use serde_json::json;

use crate::context::wearable_metrics::local_time;
use crate::models::wearable::NewWearableSample;

pub const DEMO_SOURCE: &str = "demo";
pub const DEFAULT_DEMO_DAYS: i64 = 14;
pub const MAX_DEMO_DAYS: i64 = 90;

fn sample(metric: &str, value: f64, unit: &str, recorded_at: DateTime<Utc>) -> NewWearableSample {
    NewWearableSample {
        metric: metric.to_string(),
        value,
        unit: unit.to_string(),
        source: DEMO_SOURCE.to_string(),
        metadata: Some(json!({ "generated": true })),
        recorded_at,
    }
}

/// Plausible synthetic samples for the `days` calendar days ending today.
/// Nothing is generated later than `now`.
pub fn generate_demo_samples<R: Rng>(days: i64, now: DateTime<Utc>, rng: &mut R) -> Vec<NewWearableSample> {
    let today = now.with_timezone(&Local).date_naive();
    let mut samples = Vec::new();

    for offset in (0..days).rev() {
        let date = today - Duration::days(offset);
        let at = |hour: u32, minute: u32| local_time(date, hour, minute).filter(|ts| *ts <= now);

        // Steps arrive in three chunks across the day
        let daily_target: f64 = rng.gen_range(5000.0..12000.0);
        for (hour, share) in [(9, 0.3), (14, 0.4), (19, 0.3)] {
            if let Some(ts) = at(hour, 0) {
                samples.push(sample("steps", (daily_target * share).round(), "count", ts));
            }
        }

        if let Some(ts) = at(7, 0) {
            let minutes: f64 = rng.gen_range(360.0..510.0);
            samples.push(sample("sleep_minutes", minutes.round(), "minutes", ts));
            let efficiency: f64 = rng.gen_range(78.0..97.0);
            samples.push(sample("sleep_efficiency", efficiency.round(), "%", ts));
            let resting: f64 = rng.gen_range(55.0..70.0);
            samples.push(sample("resting_heart_rate", resting.round(), "bpm", ts));
        }

        for hour in [8, 12, 16, 20] {
            if let Some(ts) = at(hour, 30) {
                let bpm: f64 = rng.gen_range(62.0..105.0);
                samples.push(sample("heart_rate", bpm.round(), "bpm", ts));
            }
        }

        if let Some(ts) = at(6, 0) {
            let spo2: f64 = rng.gen_range(94.5..99.5);
            samples.push(sample("spo2", (spo2 * 10.0).round() / 10.0, "%", ts));
        }

        if let Some(ts) = at(21, 0) {
            let active: f64 = rng.gen_range(15.0..90.0);
            samples.push(sample("active_minutes", active.round(), "minutes", ts));
            let calories: f64 = rng.gen_range(1800.0..2900.0);
            samples.push(sample("calories", calories.round(), "kcal", ts));
            let distance: f64 = rng.gen_range(3.0..9.0);
            samples.push(sample("distance", (distance * 100.0).round() / 100.0, "km", ts));
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn demo_samples_never_lie_in_the_future() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(7);
        let samples = generate_demo_samples(5, now, &mut rng);

        assert!(!samples.is_empty());
        assert!(samples.iter().all(|s| s.recorded_at <= now));
        assert!(samples.iter().all(|s| s.source == DEMO_SOURCE));
    }
}
