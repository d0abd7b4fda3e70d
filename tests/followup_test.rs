use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde_json::json;

mod common;
use common::utils::{create_test_user_and_login, get_authed, post_authed, spawn_app};

fn parse_time(value: &serde_json::Value) -> DateTime<Utc> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .expect("timestamp")
}

#[tokio::test]
async fn create_validates_title_and_frequency() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;
    let url = format!("{}/followups", &test_app.address);

    let no_title = post_authed(&client, &url, &user.token, json!({ "title": " ", "frequency": "daily" })).await;
    assert_eq!(no_title.status().as_u16(), 400);
    let body: serde_json::Value = no_title.json().await.unwrap();
    assert_eq!(body["error"], "Title is required");

    let bad_frequency = post_authed(&client, &url, &user.token, json!({ "title": "Blood pressure", "frequency": "hourly" })).await;
    assert_eq!(bad_frequency.status().as_u16(), 400);
}

#[tokio::test]
async fn complete_records_history_and_moves_next_due() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;
    let url = format!("{}/followups", &test_app.address);

    let created = post_authed(
        &client,
        &url,
        &user.token,
        json!({ "title": "Check blood pressure", "frequency": "weekly", "notes": "Morning" }),
    )
    .await;
    assert_eq!(created.status().as_u16(), 201);
    let created: serde_json::Value = created.json().await.unwrap();
    let id = created["id"].as_str().expect("follow-up id").to_string();

    let before = Utc::now();
    let completed = post_authed(
        &client,
        &format!("{}/{}/complete", url, id),
        &user.token,
        json!({ "notes": "128/82" }),
    )
    .await;
    assert_eq!(completed.status().as_u16(), 200);
    let completed: serde_json::Value = completed.json().await.unwrap();
    assert_eq!(completed["fallback"], true);
    assert!(completed["ai_response"].as_str().unwrap().contains("Check blood pressure"));

    let next_due = parse_time(&completed["next_due"]);
    assert!(next_due >= before + Duration::days(7) - Duration::seconds(1));
    assert!(next_due <= Utc::now() + Duration::days(7));

    let list: serde_json::Value = get_authed(&client, &url, &user.token).await.json().await.unwrap();
    let item = &list["followups"][0];
    assert_eq!(item["completion_count"], 1);
    assert_eq!(item["is_overdue"], false);
    assert!(!item["last_completed"].is_null());

    let history: serde_json::Value = get_authed(&client, &format!("{}/{}/history", url, id), &user.token)
        .await
        .json()
        .await
        .unwrap();
    let entries = history["history"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["notes"], "128/82");
}

#[tokio::test]
async fn deleted_followups_disappear_from_the_list() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;
    let url = format!("{}/followups", &test_app.address);

    let created: serde_json::Value = post_authed(&client, &url, &user.token, json!({ "title": "Hydration", "frequency": "daily" }))
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let deleted = client
        .delete(&format!("{}/{}", url, id))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);

    let list: serde_json::Value = get_authed(&client, &url, &user.token).await.json().await.unwrap();
    assert!(list["followups"].as_array().unwrap().is_empty());

    let again = client
        .delete(&format!("{}/{}", url, id))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 404);

    let complete = post_authed(&client, &format!("{}/{}/complete", url, id), &user.token, json!({})).await;
    assert_eq!(complete.status().as_u16(), 404);
}

#[tokio::test]
async fn followups_of_other_users_are_not_visible() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let owner = create_test_user_and_login(&test_app.address).await;
    let stranger = create_test_user_and_login(&test_app.address).await;
    let url = format!("{}/followups", &test_app.address);

    let created: serde_json::Value = post_authed(&client, &url, &owner.token, json!({ "title": "Weigh in", "frequency": "monthly" }))
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let response = post_authed(&client, &format!("{}/{}/complete", url, id), &stranger.token, json!({})).await;
    assert_eq!(response.status().as_u16(), 404);
}
