use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: String,
    pub timestamp: String,
}

/// Liveness/readiness probe: reports healthy only when the database
/// answers a trivial query.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.db.get_database_backend();
    let probe = Statement::from_string(backend, "SELECT 1".to_string());

    let db_ok = state.db.execute(probe).await.is_ok();

    let response = HealthResponse {
        status: if db_ok {
            ComponentStatus::Up
        } else {
            ComponentStatus::Down
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    let code = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}
