//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::Response,
    Router,
};
use fake::{
    faker::{internet::en::SafeEmail, name::en::Name},
    Fake,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;

use identity_service::config::{HashingSettings, Settings};
use identity_service::infrastructure::repositories::InMemoryAccountStore;
use identity_service::infrastructure::security::Argon2CredentialHasher;
use identity_service::startup::{build_router, AppState};

pub const SIGNUP_URI: &str = "/api/v1/auth/signup";
pub const STRONG_PASSWORD: &str = "Sup3r$ecretZ";

/// Test application backed by an in-memory account store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryAccountStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let settings = Settings::in_memory().expect("test settings");
        let store = Arc::new(InMemoryAccountStore::new());
        let state = AppState::in_memory(settings, Arc::clone(&store)).expect("test state");

        Self {
            router: build_router(state),
            store,
        }
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: &str) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn signup(&self, body: &Value) -> Response {
        self.post_json(SIGNUP_URI, &body.to_string()).await
    }
}

/// Decode a JSON response body
pub async fn body_json<T: DeserializeOwned>(response: Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Signup body with a strong password
pub fn signup_body(email: &str, name: &str) -> Value {
    json!({
        "email": email,
        "password": STRONG_PASSWORD,
        "name": name,
    })
}

/// Generate a unique test email
pub fn unique_email() -> String {
    let local: String = SafeEmail().fake();
    format!("{}_{}", uuid::Uuid::new_v4().simple(), local)
}

pub fn fake_name() -> String {
    Name().fake()
}

/// Argon2 hasher with a minimal work factor
pub fn fast_hasher() -> Argon2CredentialHasher {
    Argon2CredentialHasher::new(&HashingSettings {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("valid argon2 params")
}
