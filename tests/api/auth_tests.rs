//! Signup API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use identity_service::application::dto::RegisteredAccount;
use identity_service::domain::CredentialHasher;
use identity_service::presentation::http::responses::ErrorResponse;
use identity_service::shared::error::{ErrorCode, SERVER_ERROR_FRIENDLY_MESSAGE};

use crate::common::{
    body_json, fake_name, fast_hasher, signup_body, unique_email, TestApp, STRONG_PASSWORD,
};

#[tokio::test]
async fn test_signup_with_valid_data_creates_account() {
    let app = TestApp::new();

    let response = app.signup(&signup_body("a@b.com", "User")).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let account: RegisteredAccount = body_json(response).await;
    assert_eq!(account.email, "a@b.com");
    assert_eq!(account.name, "User");
    assert_eq!(account.role, "user");
    assert!(uuid::Uuid::parse_str(&account.public_id).is_ok());
    assert!(account.created_at.ends_with('Z'));
}

#[tokio::test]
async fn test_signup_stores_only_the_hash() {
    let app = TestApp::new();

    let response = app.signup(&signup_body(&unique_email(), &fake_name())).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let rows = app.store.accounts();
    assert_eq!(rows.len(), 1);
    assert_ne!(rows[0].password_hash, STRONG_PASSWORD);
    assert!(rows[0].password_hash.starts_with("$argon2id$"));
    assert!(fast_hasher().compare(&rows[0].password_hash, STRONG_PASSWORD));
}

#[tokio::test]
async fn test_second_signup_with_same_email_conflicts() {
    let app = TestApp::new();

    let first = app.signup(&signup_body("a@b.com", "User")).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.signup(&signup_body("A@B.COM", "Other User")).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let body: ErrorResponse = body_json(second).await;
    assert_eq!(body.code, ErrorCode::Conflict);
    assert_eq!(body.message, "User with this email already exists.");
    assert_eq!(app.store.accounts().len(), 1);
}

#[tokio::test]
async fn test_blank_name_is_bad_request_without_persistence() {
    let app = TestApp::new();

    let response = app.signup(&signup_body("a@b.com", "   ")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = body_json(response).await;
    assert_eq!(body.code, ErrorCode::BadRequest);
    let fields = body.fields.expect("field map");
    assert_eq!(fields.get("name"), Some(&vec!["must not be blank".to_string()]));
    assert_eq!(app.store.find_calls(), 0);
    assert_eq!(app.store.insert_calls(), 0);
}

#[tokio::test]
async fn test_weak_password_reports_each_rule() {
    let app = TestApp::new();

    let response = app
        .signup(&json!({"email": "a@b.com", "password": "short", "name": "User"}))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = body_json(response).await;
    assert_eq!(
        body.fields.unwrap().get("password"),
        Some(&vec![
            "must be at least 8 characters".to_string(),
            "must contain at least one uppercase letter".to_string(),
            "must contain at least one number".to_string(),
            "must contain at least one special character".to_string(),
        ])
    );
}

#[tokio::test]
async fn test_confirmation_mismatch_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .signup(&json!({
            "email": "a@b.com",
            "password": STRONG_PASSWORD,
            "password_confirm": "Different1!",
            "name": "User",
        }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = body_json(response).await;
    assert!(body.fields.unwrap().contains_key("password_confirm"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();

    let response = app.post_json(crate::common::SIGNUP_URI, "{not json").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = body_json(response).await;
    assert_eq!(body.code, ErrorCode::BadRequest);
    assert_eq!(app.store.insert_calls(), 0);
}

#[tokio::test]
async fn test_store_failure_returns_generic_message() {
    let app = TestApp::new();
    app.store.fail_next_insert();

    let response = app.signup(&signup_body("a@b.com", "User")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = body_json(response).await;
    assert_eq!(body.code, ErrorCode::Internal);
    assert_eq!(body.message, SERVER_ERROR_FRIENDLY_MESSAGE);
    assert!(body.fields.is_none());
    assert!(app.store.accounts().is_empty());
    assert_eq!(app.store.open_transactions(), 0);
}
