use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::services::materials::{CreateMaterialRequest, UpdateMaterialRequest};
use crate::{errors::ServiceError, AppState, ListQuery};

async fn create_material(
    State(state): State<AppState>,
    Json(request): Json<CreateMaterialRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let material = state.services.materials.create_material(request).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

async fn get_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let material = state
        .services
        .materials
        .get_material(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Material {} not found", id)))?;
    Ok(Json(material))
}

async fn list_materials(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let materials = state
        .services
        .materials
        .list_materials(query.page, query.limit)
        .await?;
    Ok(Json(materials))
}

async fn update_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMaterialRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let material = state
        .services
        .materials
        .update_material(id, request)
        .await?;
    Ok(Json(material))
}

async fn delete_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.materials.delete_material(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_material))
        .route("/", get(list_materials))
        .route("/:id", get(get_material))
        .route("/:id", put(update_material))
        .route("/:id", delete(delete_material))
}
