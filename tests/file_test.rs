//! Document endpoints. The upload round trip needs the MinIO instance from
//! `configuration/local.yml`; validation failures are rejected before storage.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use sha2::{Digest, Sha256};

mod common;
use common::utils::{create_test_user_and_login, get_authed, spawn_app};

async fn upload(
    client: &Client,
    address: &str,
    token: &str,
    filename: &str,
    mime: &str,
    content: Vec<u8>,
) -> reqwest::Response {
    let part = Part::bytes(content)
        .file_name(filename.to_string())
        .mime_str(mime)
        .expect("Invalid mime type");
    let form = Form::new()
        .part("file", part)
        .text("description", "Blood test results");

    client
        .post(&format!("{}/files/upload", address))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute upload request.")
}

#[tokio::test]
async fn disallowed_file_type_is_rejected() {
    let app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&app.address).await;

    let response = upload(&client, &app.address, &user.token, "script.exe", "application/octet-stream", vec![0u8; 32]).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("File type not allowed"));
}

#[tokio::test]
async fn upload_list_analyze_and_delete_document() {
    let app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&app.address).await;
    let content = b"Hemoglobin: 13.9 g/dL\nLDL: 162 mg/dL\n".to_vec();
    let expected_hash = hex::encode(Sha256::digest(&content));

    let response = upload(&client, &app.address, &user.token, "labs.txt", "text/plain", content).await;
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let file = &body["file"];
    let file_id = file["id"].as_str().unwrap().to_string();
    assert_eq!(file["filename"], "labs.txt");
    assert_eq!(file["file_type"], "txt");
    assert_eq!(file["sha256"], expected_hash.as_str());
    assert_eq!(file["description"], "Blood test results");

    let list: serde_json::Value = get_authed(&client, &format!("{}/files", &app.address), &user.token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(list["files"].as_array().unwrap().len(), 1);

    let analysis = client
        .post(&format!("{}/files/analyze/{}", &app.address, file_id))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(analysis.status().as_u16(), 200);
    let analysis: serde_json::Value = analysis.json().await.unwrap();
    assert_eq!(analysis["fallback"], true);
    assert!(analysis["analysis"].as_str().unwrap().contains("labs.txt"));

    let deleted = client
        .delete(&format!("{}/files/{}", &app.address, file_id))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);

    let list: serde_json::Value = get_authed(&client, &format!("{}/files", &app.address), &user.token)
        .await
        .json()
        .await
        .unwrap();
    assert!(list["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_document_is_not_found() {
    let app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&app.address).await;

    let response = client
        .delete(&format!("{}/files/{}", &app.address, uuid::Uuid::new_v4()))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}
