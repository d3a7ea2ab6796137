use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::{errors::ServiceError, AppState};

async fn summary(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.services.dashboard.summary().await?;
    Ok(Json(summary))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(summary))
}
