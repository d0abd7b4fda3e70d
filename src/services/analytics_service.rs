use crate::context::wearable_metrics::{daily_series, mean, round1};
use crate::models::analytics::{
    ActivityTrends, DashboardSummary, HeartTrends, MetricTrend, SleepTrends, TrendDirection, Trends,
};
use crate::models::wearable::{MetricKind, SeriesPoint, WearableSample, WearableSummary};

/// Relative change between the two halves that still counts as stable
pub const TREND_THRESHOLD: f64 = 0.05;

fn series_values(series: &[SeriesPoint]) -> Vec<f64> {
    series.iter().map(|p| p.value).collect()
}

fn other(name: &str) -> MetricKind {
    MetricKind::from_name(name)
}

/// Dashboard headline figures from an already aggregated window.
pub fn dashboard_summary(summary: &WearableSummary, samples: &[WearableSample]) -> DashboardSummary {
    let efficiency = series_values(&daily_series(samples, &other("sleep_efficiency")));
    let calories = series_values(&daily_series(samples, &other("calories")));
    let distance = series_values(&daily_series(samples, &other("distance")));

    DashboardSummary {
        avg_steps: summary.steps.as_ref().map(|s| s.average_per_day),
        avg_sleep_hours: summary.sleep.as_ref().map(|s| s.average_hours_per_night),
        avg_sleep_efficiency: mean(&efficiency).map(round1),
        avg_calories: mean(&calories).map(round1),
        total_distance_km: (!distance.is_empty()).then(|| round1(distance.iter().sum())),
        avg_heart_rate: summary.heart_rate.as_ref().and_then(|h| h.average),
        avg_resting_heart_rate: summary.heart_rate.as_ref().and_then(|h| h.resting_average),
        avg_spo2: summary.spo2.as_ref().map(|s| s.average_percent),
        total_active_minutes: summary.activity.as_ref().map(|a| a.active_minutes_total),
    }
}

/// Compare the first and second half of a daily series.
///
/// With an odd number of points the middle one belongs to the second half.
/// For metrics where lower is better (heart rate) a fall is an improvement.
pub fn compute_trend(metric: &str, series: Vec<SeriesPoint>, lower_is_better: bool) -> MetricTrend {
    let values = series_values(&series);
    if values.len() < 2 {
        return MetricTrend {
            metric: metric.to_string(),
            direction: TrendDirection::InsufficientData,
            first_half_average: None,
            second_half_average: None,
            series,
        };
    }

    let (first, second) = values.split_at(values.len() / 2);
    let first_avg = mean(first).unwrap_or(0.0);
    let second_avg = mean(second).unwrap_or(0.0);

    let change = if first_avg.abs() < f64::EPSILON {
        if second_avg.abs() < f64::EPSILON { 0.0 } else { second_avg.signum() }
    } else {
        (second_avg - first_avg) / first_avg.abs()
    };

    let rising = change > TREND_THRESHOLD;
    let falling = change < -TREND_THRESHOLD;
    let direction = match (rising, falling, lower_is_better) {
        (true, _, false) | (_, true, true) => TrendDirection::Improving,
        (true, _, true) | (_, true, false) => TrendDirection::Declining,
        _ => TrendDirection::Stable,
    };

    MetricTrend {
        metric: metric.to_string(),
        direction,
        first_half_average: Some(round1(first_avg)),
        second_half_average: Some(round1(second_avg)),
        series,
    }
}

/// Daily series and trend labels for every charted metric.
pub fn build_trends(samples: &[WearableSample]) -> Trends {
    let metrics: [(&str, MetricKind, bool); 8] = [
        ("steps", MetricKind::Steps, false),
        ("calories", other("calories"), false),
        ("active_minutes", MetricKind::ActiveMinutes, false),
        ("sleep_hours", MetricKind::Sleep, false),
        ("sleep_efficiency", other("sleep_efficiency"), false),
        ("heart_rate", MetricKind::HeartRate, true),
        ("resting_heart_rate", MetricKind::RestingHeartRate, true),
        ("spo2", MetricKind::SpO2, false),
    ];

    let trends: Vec<MetricTrend> = metrics
        .into_iter()
        .map(|(name, kind, lower_is_better)| {
            compute_trend(name, daily_series(samples, &kind), lower_is_better)
        })
        .collect();

    let values_of = |name: &str| {
        trends
            .iter()
            .find(|t| t.metric == name)
            .map(|t| series_values(&t.series))
            .unwrap_or_default()
    };

    Trends {
        activity: ActivityTrends {
            steps: values_of("steps"),
            calories: values_of("calories"),
            active_minutes: values_of("active_minutes"),
        },
        sleep: SleepTrends {
            sleep_hours: values_of("sleep_hours"),
            efficiency: values_of("sleep_efficiency"),
        },
        heart: HeartTrends {
            heart_rate: values_of("heart_rate"),
            resting_heart_rate: values_of("resting_heart_rate"),
            spo2: values_of("spo2"),
        },
        metrics: trends,
    }
}
