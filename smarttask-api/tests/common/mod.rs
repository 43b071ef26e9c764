//! Common test utilities for integration tests
//!
//! Every context gets its own in-memory store and a scripted text
//! generator, so tests run in parallel without a database.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use serde_json::Value;
use smarttask_api::app::{build_router, AppState};
use smarttask_api::config::Config;
use smarttask_shared::ai::{MockGenerator, TextGenerator};
use smarttask_shared::store::{memory::InMemoryStore, Stores};
use std::sync::Arc;
use tower::ServiceExt as _;
use uuid::Uuid;

pub const PASSWORD: &str = "secret1";

/// Test context containing the router and its backing handles
pub struct TestContext {
    pub app: axum::Router,
    pub memory: Arc<InMemoryStore>,
    pub generator: Arc<MockGenerator>,
    pub config: Config,
}

/// A registered account
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
    /// `name=value` pairs from the register response's `Set-Cookie` headers
    pub cookies: Vec<String>,
}

impl Session {
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
    }
}

/// Decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookies: Vec<String>,
    pub body: Value,
}

impl TestContext {
    /// Context whose generator answers every prompt with `reply`
    pub fn new() -> Self {
        Self::with_generator(MockGenerator::replying("Mock insight"))
    }

    pub fn with_generator(generator: MockGenerator) -> Self {
        let memory = Arc::new(InMemoryStore::new());
        let generator = Arc::new(generator);
        let config = Config::for_testing();

        let state = AppState::new(
            Stores::from_memory(memory.clone()),
            generator.clone() as Arc<dyn TextGenerator>,
            config.clone(),
        )
        .expect("test config is valid");

        Self {
            app: build_router(state),
            memory,
            generator,
            config,
        }
    }

    /// Sends a request through the router
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        decode(response).await
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    /// Registers a fresh account with a unique email
    pub async fn register(&self) -> Session {
        let email = format!("user-{}@example.com", Uuid::new_v4());
        self.register_as(&email).await
    }

    pub async fn register_as(&self, email: &str) -> Session {
        let response = self
            .request(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": PASSWORD,
                    "name": "Test User"
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        Session {
            user_id: response.body["user"]["id"]
                .as_str()
                .and_then(|id| id.parse().ok())
                .expect("user id in register response"),
            email: email.to_string(),
            access_token: response.body["accessToken"]
                .as_str()
                .expect("access token in register response")
                .to_string(),
            cookies: response.set_cookies.iter().map(|c| cookie_pair(c)).collect(),
        }
    }

    /// Creates a task and returns its JSON
    pub async fn create_task(&self, session: &Session, body: Value) -> Value {
        let response = self
            .request("POST", "/api/tasks", Some(&session.access_token), Some(body))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }
}

/// `name=value` part of a `Set-Cookie` header
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

async fn decode(response: Response<Body>) -> TestResponse {
    let status = response.status();
    let set_cookies = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect();

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

    TestResponse {
        status,
        set_cookies,
        body,
    }
}
