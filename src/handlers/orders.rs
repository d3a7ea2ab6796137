use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::documents;
use crate::entities::order::OrderStatus;
use crate::pricing::CatalogSnapshot;
use crate::services::orders::{OrderRequest, OrderResponse};
use crate::{errors::ServiceError, AppState};

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub status: Option<OrderStatus>,
}

/// Resolves an order identifier that may be a UUID or a sequential order
/// number.
async fn resolve_order(state: &AppState, id: &str) -> Result<OrderResponse, ServiceError> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        if let Some(order) = state.services.orders.get_order(uuid).await? {
            return Ok(order);
        }
    } else if let Ok(number) = id.parse::<i64>() {
        if let Some(order) = state.services.orders.get_order_by_number(number).await? {
            return Ok(order);
        }
    }
    Err(ServiceError::NotFound(format!("Order {} not found", id)))
}

async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<OrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = resolve_order(&state, &id).await?;
    Ok(Json(order))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state
        .services
        .orders
        .list_orders(query.page, query.limit, query.status)
        .await?;
    Ok(Json(orders))
}

async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<OrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.update_order(id, request).await?;
    Ok(Json(order))
}

async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.cancel_order(id).await?;
    Ok(Json(order))
}

async fn order_document(
    state: &AppState,
    id: &str,
) -> Result<documents::OrderDocument, ServiceError> {
    let order = resolve_order(state, id).await?;

    let client = state
        .services
        .clients
        .get_client(order.client_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Client for order not found".to_string()))?;

    let material_ids: Vec<Uuid> = order
        .items
        .iter()
        .flat_map(|item| item.materials.iter().map(|(_, s)| s.material_id))
        .collect();
    let materials = state
        .services
        .materials
        .get_materials_by_ids(&material_ids)
        .await?;
    let catalog = CatalogSnapshot::from_models(materials);

    Ok(documents::build_order_document(
        &state.config.business_name,
        &order,
        &client,
        &catalog,
    ))
}

async fn get_order_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let doc = order_document(&state, &id).await?;
    Ok(Json(doc))
}

async fn get_order_document_text(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let doc = order_document(&state, &id).await?;
    Ok(documents::render_text(&doc))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/", get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id", put(update_order))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/document", get(get_order_document))
        .route("/:id/document.txt", get(get_order_document_text))
}
