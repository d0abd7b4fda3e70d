use reqwest::Client;
use serde_json::json;

mod common;
use common::utils::{create_test_user_and_login, get_authed, spawn_app};

#[tokio::test]
async fn new_user_has_an_empty_profile() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;

    let response = get_authed(&client, &format!("{}/profile", &test_app.address), &user.token).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["full_name"].is_null());
    assert!(body["age"].is_null());
}

#[tokio::test]
async fn update_replaces_the_whole_profile() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;
    let url = format!("{}/profile", &test_app.address);

    let first = client
        .put(&url)
        .bearer_auth(&user.token)
        .json(&json!({
            "full_name": "Alex Doe",
            "age": "34",
            "allergies": "Pollen",
            "health_goals": "Sleep better"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 200);

    // Fields left out of the second update are cleared
    let second = client
        .put(&url)
        .bearer_auth(&user.token)
        .json(&json!({ "full_name": "Alex Doe", "age": 35 }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 200);

    let body: serde_json::Value = get_authed(&client, &url, &user.token).await.json().await.unwrap();
    assert_eq!(body["full_name"], "Alex Doe");
    assert_eq!(body["age"], 35);
    assert!(body["allergies"].is_null());
    assert!(body["health_goals"].is_null());
}

#[tokio::test]
async fn out_of_range_age_is_rejected() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app.address).await;

    let response = client
        .put(&format!("{}/profile", &test_app.address))
        .bearer_auth(&user.token)
        .json(&json!({ "age": 200 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}
