use reqwest::Client;
use serde_json::json;

mod common;
use common::utils::{create_test_user_and_login, get_authed, post_authed, spawn_app};

#[tokio::test]
async fn chat_without_model_returns_fallback_and_is_saved() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;

    let response = post_authed(
        &client,
        &format!("{}/chat", &test_app.address),
        &user.token,
        json!({ "message": "How can I sleep better?" }),
    )
    .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let reply = body["response"].as_str().expect("response text");
    assert_eq!(body["fallback"], true);
    assert!(reply.contains("not medical advice"));
    assert!(reply.contains("\"How can I sleep better?\""));

    let history: serde_json::Value = get_authed(&client, &format!("{}/chat/history", &test_app.address), &user.token)
        .await
        .json()
        .await
        .unwrap();
    let entries = history["history"].as_array().expect("history array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["message"], "How can I sleep better?");
    assert_eq!(entries[0]["response"], reply);
}

#[tokio::test]
async fn fallback_reflects_recent_wearable_data() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;

    let demo = post_authed(
        &client,
        &format!("{}/wearables/demo-data", &test_app.address),
        &user.token,
        json!({ "days": 7 }),
    )
    .await;
    assert_eq!(demo.status().as_u16(), 201);

    let body: serde_json::Value = post_authed(
        &client,
        &format!("{}/chat", &test_app.address),
        &user.token,
        json!({ "message": "How am I doing?" }),
    )
    .await
    .json()
    .await
    .unwrap();

    let reply = body["response"].as_str().unwrap();
    assert!(reply.contains("summary of your recent wearable data (last 7 days)"));
    assert!(reply.contains("- Steps: "));
    assert!(reply.contains("- Sleep: "));
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;

    let response = post_authed(
        &client,
        &format!("{}/chat", &test_app.address),
        &user.token,
        json!({ "message": "   " }),
    )
    .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Message is required");
}

#[tokio::test]
async fn history_is_newest_first_and_per_user() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;
    let other = create_test_user_and_login(&test_app.address).await;

    for message in ["first", "second", "third"] {
        post_authed(
            &client,
            &format!("{}/chat", &test_app.address),
            &user.token,
            json!({ "message": message }),
        )
        .await;
    }

    let history: serde_json::Value = get_authed(&client, &format!("{}/chat/history", &test_app.address), &user.token)
        .await
        .json()
        .await
        .unwrap();
    let messages: Vec<&str> = history["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["message"].as_str().unwrap())
        .collect();
    assert_eq!(messages, vec!["third", "second", "first"]);

    let other_history: serde_json::Value = get_authed(&client, &format!("{}/chat/history", &test_app.address), &other.token)
        .await
        .json()
        .await
        .unwrap();
    assert!(other_history["history"].as_array().unwrap().is_empty());
}
