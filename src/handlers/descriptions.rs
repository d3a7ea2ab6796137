use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};

use crate::services::descriptions::DescriptionRequest;
use crate::{errors::ServiceError, AppState};

async fn generate(
    State(state): State<AppState>,
    Json(request): Json<DescriptionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let description = state.services.descriptions.generate(request).await?;
    Ok(Json(description))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(generate))
}
