//! Common test utilities for integration tests
//!
//! Every test builds its own router over a fresh in-memory backend, registers local
//! accounts and signs requests with locally minted access tokens.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use projectdesk_api::app::{build_router, AppState};
use projectdesk_api::config::{Config, DEV_JWT_SECRET};
use projectdesk_shared::auth::Identity;
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse battery";

/// A registered user and their bearer token
pub struct TestUser {
    pub identity: Identity,
    pub token: String,
}

impl TestUser {
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Test context containing the app and its backend
pub struct TestContext {
    pub state: AppState,
    pub app: Router,
}

impl TestContext {
    pub async fn new() -> Self {
        let state = AppState::connect(Config::memory(DEV_JWT_SECRET))
            .await
            .expect("memory backend");
        let app = build_router(state.clone());
        Self { state, app }
    }

    /// Registers a local account named `name` with email `{name}@example.com`
    pub async fn user(&self, name: &str) -> TestUser {
        let accounts = self.state.backend.local_auth().expect("local accounts");
        let identity = accounts
            .register(
                &format!("{}@example.com", name.to_lowercase()),
                PASSWORD,
                Some(name.to_string()),
            )
            .await
            .expect("registration failed");
        let token = accounts.issue_access_token(&identity).expect("token");
        TestUser { identity, token }
    }

    /// Sends a request and returns the status and JSON body (`Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, user.auth_header());
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.call(request).await
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(user), Some(body)).await
    }

    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    /// Creates a project through the API and returns its id
    pub async fn create_project(&self, user: &TestUser, title: &str) -> String {
        let (status, body) = self
            .post(
                "/v1/projects",
                user,
                serde_json::json!({
                    "title": title,
                    "description": format!("{} description", title),
                    "deadline": "2024-12-31"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

/// Builds a multipart/form-data body from text fields and an optional file
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> (String, Vec<u8>) {
    let boundary = "projectdesk-test-boundary";
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }

    if let Some((file_name, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                boundary, file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}
