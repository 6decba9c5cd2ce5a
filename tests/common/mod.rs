#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use storage_service::{
    auth::AccountRole, build_router, config::AppConfig, db, AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// A caller with a signed bearer token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

/// Router over a fresh in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // One connection so every query sees the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = build_router(state.clone());

        Self { router, state }
    }

    fn user(&self, role: AccountRole) -> TestUser {
        let id = Uuid::new_v4();
        let token = self
            .state
            .auth
            .issue_token(id, role)
            .expect("issue test token");
        TestUser { id, token }
    }

    pub fn customer(&self) -> TestUser {
        self.user(AccountRole::Customer)
    }

    pub fn employee(&self) -> TestUser {
        self.user(AccountRole::Employee)
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn request_as(
        &self,
        user: &TestUser,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(&user.token)).await
    }

    /// Creates a box and returns its id.
    pub async fn create_box(&self, user: &TestUser, payload: Value) -> Uuid {
        let response = self
            .request_as(user, Method::POST, "/api/v1/boxes", Some(payload))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        created_id(response).await
    }

    pub async fn create_sort_box(&self, user: &TestUser) -> Uuid {
        self.create_box(user, json!({"packing_mode": "sort"})).await
    }

    /// Adds an item to a box and returns its id.
    pub async fn add_item(&self, user: &TestUser, box_id: Uuid, payload: Value) -> Uuid {
        let response = self
            .request_as(
                user,
                Method::POST,
                &format!("/api/v1/boxes/{}/items", box_id),
                Some(payload),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        created_id(response).await
    }

    pub async fn get_box_json(&self, user: &TestUser, box_id: Uuid) -> Value {
        let response = self
            .request_as(user, Method::GET, &format!("/api/v1/boxes/{}", box_id), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        response_json(response).await
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub async fn created_id(response: Response) -> Uuid {
    let body = response_json(response).await;
    body["id"]
        .as_str()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .expect("created response carries an id")
}
