use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::services::clients::ClientInput;
use crate::{errors::ServiceError, AppState, ListQuery};

async fn create_client(
    State(state): State<AppState>,
    Json(request): Json<ClientInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let client = state.services.clients.create_client(request).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let client = state
        .services
        .clients
        .get_client(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Client {} not found", id)))?;
    Ok(Json(client))
}

async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let clients = state
        .services
        .clients
        .list_clients(query.page, query.limit)
        .await?;
    Ok(Json(clients))
}

async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ClientInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let client = state.services.clients.update_client(id, request).await?;
    Ok(Json(client))
}

async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.clients.delete_client(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_client))
        .route("/", get(list_clients))
        .route("/:id", get(get_client))
        .route("/:id", put(update_client))
        .route("/:id", delete(delete_client))
}
