/*!
 * # Health Check Module
 *
 * - Liveness (`/healthz`): the process is up and serving requests
 * - Readiness (`/readyz`): the database answers a ping
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::warn;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<HealthStatus>,
}

#[derive(Clone)]
pub struct HealthState {
    pub db_pool: Arc<DatabaseConnection>,
    pub start_time: SystemTime,
}

impl HealthState {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self {
            db_pool,
            start_time: SystemTime::now(),
        }
    }

    fn info(&self, status: HealthStatus, database: Option<HealthStatus>) -> HealthInfo {
        HealthInfo {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            uptime_seconds: self
                .start_time
                .elapsed()
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            database,
        }
    }
}

async fn liveness(State(state): State<HealthState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.info(HealthStatus::Up, None)))
}

async fn readiness(State(state): State<HealthState>) -> impl IntoResponse {
    match crate::db::check_connection(&state.db_pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(state.info(HealthStatus::Up, Some(HealthStatus::Up))),
        ),
        Err(e) => {
            warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(state.info(HealthStatus::Down, Some(HealthStatus::Down))),
            )
        }
    }
}

pub fn health_routes(db_pool: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/healthz", get(liveness))
        .route("/readyz", get(readiness))
        .with_state(HealthState::new(db_pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_db;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_reports_up_with_live_database() {
        let app = health_routes(Arc::new(memory_db().await));

        for path in ["/healthz", "/readyz"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", path);
        }
    }

    #[tokio::test]
    async fn readiness_fails_when_database_is_closed() {
        let db = memory_db().await;
        let handle = Arc::new(db.clone());
        crate::db::close_pool(db).await.unwrap();

        let response = health_routes(handle)
            .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
