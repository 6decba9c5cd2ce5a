//! Storage Service Library
//!
//! Customers create storage boxes, staff pick them up and pack them, and the
//! boxes move through a shipping and storage lifecycle. Every box belongs to a
//! single user; every item belongs to a box and inherits its owner.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod migrator;
pub mod openapi;
pub mod repositories;
pub mod services;
pub mod telemetry;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::timeout::TimeoutLayer;

use crate::{
    auth::AuthService,
    db::DbPool,
    services::{BoxService, ItemService},
};

/// Shared state handed to every API handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub auth: Arc<AuthService>,
    pub box_service: BoxService,
    pub item_service: ItemService,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: config::AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(auth::AuthConfig::from(&config)));
        Self {
            box_service: BoxService::new(db.clone()),
            item_service: ItemService::new(db.clone()),
            db,
            config,
            auth,
        }
    }
}

/// Authenticated `/api/v1` routes.
///
/// The auth middleware is attached as a route layer so unmatched paths still
/// fall through to a plain 404.
pub fn api_v1_routes(auth: Arc<AuthService>) -> Router<AppState> {
    use handlers::{boxes, items};

    Router::new()
        .route("/boxes", get(boxes::list_boxes).post(boxes::create_box))
        .route("/boxes/:id", get(boxes::get_box).delete(boxes::delete_box))
        .route("/boxes/:id/status", patch(boxes::update_box_status))
        .route(
            "/boxes/:id/items",
            get(items::list_items).post(items::add_item),
        )
        .route("/boxes/:id/items/:item_id", patch(items::update_box_item))
        .route(
            "/items/:id",
            get(items::get_item)
                .patch(items::update_item)
                .delete(items::delete_item),
        )
        .route_layer(middleware::from_fn_with_state(
            auth,
            crate::auth::auth_middleware,
        ))
}

/// Full application router: API, health checks, docs and the shared HTTP layers.
///
/// CORS and compression depend on deployment settings and are added by the
/// server binary.
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let body_limit = state.config.max_body_size;

    Router::new()
        .nest("/api/v1", api_v1_routes(state.auth.clone()))
        .with_state(state.clone())
        .merge(health::health_routes(state.db.clone()))
        .merge(openapi::swagger_ui())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(telemetry::configure_http_tracing())
        .layer(middleware::from_fn(telemetry::request_id_middleware))
}
