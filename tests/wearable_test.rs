use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::json;

mod common;
use common::utils::{create_test_user_and_login, get_authed, post_authed, spawn_app};

#[tokio::test]
async fn demo_connection_and_data_show_up_in_status() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;
    let base = format!("{}/wearables", &test_app.address);

    let status: serde_json::Value = get_authed(&client, &format!("{}/status", base), &user.token).await.json().await.unwrap();
    assert_eq!(status["connected"], false);
    assert_eq!(status["sample_count"], 0);

    let connect = post_authed(&client, &format!("{}/connect", base), &user.token, json!({ "provider": "demo" })).await;
    assert_eq!(connect.status().as_u16(), 200);
    let connect: serde_json::Value = connect.json().await.unwrap();
    assert_eq!(connect["status"], "active");

    let demo = post_authed(&client, &format!("{}/demo-data", base), &user.token, json!({ "days": 14 })).await;
    assert_eq!(demo.status().as_u16(), 201);
    let demo: serde_json::Value = demo.json().await.unwrap();
    let created = demo["samples_created"].as_i64().unwrap();
    assert!(created > 0);

    let status: serde_json::Value = get_authed(&client, &format!("{}/status", base), &user.token).await.json().await.unwrap();
    assert_eq!(status["connected"], true);
    assert_eq!(status["provider"], "demo");
    assert_eq!(status["sample_count"].as_i64().unwrap(), created);
}

#[tokio::test]
async fn demo_days_out_of_range_are_rejected() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;
    let url = format!("{}/wearables/demo-data", &test_app.address);

    for days in [0, 91] {
        let response = post_authed(&client, &url, &user.token, json!({ "days": days })).await;
        assert_eq!(response.status().as_u16(), 400, "days {}", days);
    }
}

#[tokio::test]
async fn summary_window_is_validated() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;
    let base = format!("{}/wearables/summary", &test_app.address);

    for query in ["?days=0", "?days=-3", "?days=366", "?days=abc"] {
        let response = get_authed(&client, &format!("{}{}", base, query), &user.token).await;
        assert_eq!(response.status().as_u16(), 400, "query {}", query);
    }

    let response = get_authed(&client, &base, &user.token).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["summary"]["window_days"], 7);
    assert_eq!(body["text"], "");
}

#[tokio::test]
async fn ingested_metrics_feed_the_summary() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;
    let base = format!("{}/wearables", &test_app.address);

    for steps in [4000, 6000] {
        let response = post_authed(
            &client,
            &format!("{}/metrics", base),
            &user.token,
            json!({ "metric_type": "steps", "value": steps, "unit": "count" }),
        )
        .await;
        assert_eq!(response.status().as_u16(), 201);
    }

    let body: serde_json::Value = get_authed(&client, &format!("{}/summary?days=1", base), &user.token)
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["summary"]["steps"]["total"], 10000.0);
    assert_eq!(body["summary"]["steps"]["days_counted"], 1);
    assert!(body["text"].as_str().unwrap().starts_with("Wearable Data (last 1 days):"));
}

#[tokio::test]
async fn malformed_timestamp_is_stored_as_now_and_flagged() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;

    let response = post_authed(
        &client,
        &format!("{}/wearables/metrics", &test_app.address),
        &user.token,
        json!({ "metric_type": "heart_rate", "value": 72, "recorded_at": "last tuesday" }),
    )
    .await;

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["timestamp_fallback"], true);

    let (metadata,): (serde_json::Value,) = sqlx::query_as(
        "SELECT metadata FROM wearable_samples WHERE user_id = $1",
    )
    .bind(user.user_id)
    .fetch_one(&test_app.db_pool)
    .await
    .expect("Failed to fetch sample.");

    assert_eq!(metadata["timestamp_fallback"], true);
    assert_eq!(metadata["original_recorded_at"], "last tuesday");
}

#[tokio::test]
async fn future_samples_stay_out_of_the_summary() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;
    let base = format!("{}/wearables", &test_app.address);
    let next_week = (Utc::now() + Duration::days(7)).to_rfc3339();

    for (steps, recorded_at) in [(4000, None), (9000, Some(next_week))] {
        let response = post_authed(
            &client,
            &format!("{}/metrics", base),
            &user.token,
            json!({ "metric_type": "steps", "value": steps, "recorded_at": recorded_at }),
        )
        .await;
        assert_eq!(response.status().as_u16(), 201);
    }

    let body: serde_json::Value = get_authed(&client, &format!("{}/summary?days=7", base), &user.token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["summary"]["steps"]["total"], 4000.0);
    assert_eq!(body["summary"]["steps"]["days_counted"], 1);

    let series: serde_json::Value = get_authed(&client, &format!("{}/timeseries?metric=steps&days=7", base), &user.token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(series["series"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn timeseries_returns_one_point_per_day() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;
    let base = format!("{}/wearables", &test_app.address);

    post_authed(&client, &format!("{}/demo-data", base), &user.token, json!({ "days": 5 })).await;

    let body: serde_json::Value = get_authed(&client, &format!("{}/timeseries?metric=steps&days=10", base), &user.token)
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["metric"], "steps");
    let series = body["series"].as_array().unwrap();
    assert!(!series.is_empty() && series.len() <= 6);
    let dates: Vec<&str> = series.iter().map(|p| p["date"].as_str().unwrap()).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(dates, sorted);
}

#[tokio::test]
async fn fitbit_without_credentials_is_unavailable() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;

    let response = post_authed(
        &client,
        &format!("{}/wearables/connect", &test_app.address),
        &user.token,
        json!({ "provider": "fitbit" }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 503);

    let unknown = post_authed(
        &client,
        &format!("{}/wearables/connect", &test_app.address),
        &user.token,
        json!({ "provider": "garmin" }),
    )
    .await;
    assert_eq!(unknown.status().as_u16(), 400);
}

#[tokio::test]
async fn disconnect_marks_connections_inactive() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;
    let base = format!("{}/wearables", &test_app.address);

    post_authed(&client, &format!("{}/connect", base), &user.token, json!({ "provider": "demo" })).await;
    let response = post_authed(&client, &format!("{}/disconnect", base), &user.token, json!({})).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["disconnected"], 1);

    let status: serde_json::Value = get_authed(&client, &format!("{}/status", base), &user.token).await.json().await.unwrap();
    assert_eq!(status["connected"], false);
}

#[tokio::test]
async fn recommendations_fall_back_with_summary() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;
    let base = format!("{}/wearables", &test_app.address);

    post_authed(&client, &format!("{}/demo-data", base), &user.token, json!({ "days": 7 })).await;

    let body: serde_json::Value = get_authed(&client, &format!("{}/recommendations", base), &user.token)
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["fallback"], true);
    assert!(body["summary"]["steps"].is_object());
    assert!(body["recommendations"].as_str().unwrap().contains("- Steps: "));
}
