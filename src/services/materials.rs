use crate::{
    db::DbPool,
    entities::material::{
        self, ActiveModel as MaterialActiveModel, Entity as MaterialEntity,
        MaterialCategory, Model as MaterialModel, UnitOfMeasure,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateMaterialRequest {
    #[validate(length(min = 1, max = 50, message = "Material code is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 255, message = "Material name is required"))]
    pub name: String,
    pub category: MaterialCategory,
    pub unit: UnitOfMeasure,
    #[serde(default)]
    pub stock: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateMaterialRequest {
    #[validate(length(min = 1, max = 50, message = "Material code is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 255, message = "Material name is required"))]
    pub name: String,
    pub category: MaterialCategory,
    pub unit: UnitOfMeasure,
    pub stock: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MaterialListResponse {
    pub materials: Vec<MaterialModel>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Catalog management for shop materials.
#[derive(Clone)]
pub struct MaterialService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl MaterialService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    fn validate_stock(stock: Decimal) -> Result<(), ServiceError> {
        if stock < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Stock must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_material(
        &self,
        request: CreateMaterialRequest,
    ) -> Result<MaterialModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        Self::validate_stock(request.stock)?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let material_id = Uuid::new_v4();

        let active_model = MaterialActiveModel {
            id: Set(material_id),
            code: Set(request.code),
            name: Set(request.name),
            category: Set(request.category),
            unit: Set(request.unit),
            stock: Set(request.stock),
            description: Set(request.description),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let model = active_model.insert(db).await.map_err(|e| {
            error!(error = %e, material_id = %material_id, "Failed to create material");
            ServiceError::DatabaseError(e)
        })?;

        info!(material_id = %material_id, "Material created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::MaterialCreated(material_id)).await {
                warn!(error = %e, material_id = %material_id, "Failed to send material created event");
            }
        }

        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_material(
        &self,
        material_id: Uuid,
    ) -> Result<Option<MaterialModel>, ServiceError> {
        let db = &*self.db_pool;
        let material = MaterialEntity::find_by_id(material_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(material)
    }

    #[instrument(skip(self))]
    pub async fn list_materials(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<MaterialListResponse, ServiceError> {
        let db = &*self.db_pool;

        let paginator = MaterialEntity::find()
            .order_by_asc(material::Column::Name)
            .paginate(db, per_page);

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let materials = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(MaterialListResponse {
            materials,
            total,
            page,
            per_page,
        })
    }

    /// Bulk lookup used when assembling order documents.
    #[instrument(skip(self, ids))]
    pub async fn get_materials_by_ids(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<MaterialModel>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let db = &*self.db_pool;
        let materials = MaterialEntity::find()
            .filter(material::Column::Id.is_in(ids.to_vec()))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(materials)
    }

    /// Materials whose stock is at or below `threshold`, for the dashboard.
    #[instrument(skip(self))]
    pub async fn low_stock_materials(
        &self,
        threshold: Decimal,
    ) -> Result<Vec<MaterialModel>, ServiceError> {
        let db = &*self.db_pool;
        let materials = MaterialEntity::find()
            .filter(material::Column::Stock.lte(threshold))
            .order_by_asc(material::Column::Stock)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(materials)
    }

    #[instrument(skip(self, request), fields(material_id = %material_id))]
    pub async fn update_material(
        &self,
        material_id: Uuid,
        request: UpdateMaterialRequest,
    ) -> Result<MaterialModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        Self::validate_stock(request.stock)?;

        let db = &*self.db_pool;

        let material = MaterialEntity::find_by_id(material_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Material not found".to_string()))?;

        let mut active_model: MaterialActiveModel = material.into();
        active_model.code = Set(request.code);
        active_model.name = Set(request.name);
        active_model.category = Set(request.category);
        active_model.unit = Set(request.unit);
        active_model.stock = Set(request.stock);
        active_model.description = Set(request.description);
        active_model.updated_at = Set(Some(Utc::now()));

        let model = active_model
            .update(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(material_id = %material_id, "Material updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::MaterialUpdated(material_id)).await {
                warn!(error = %e, material_id = %material_id, "Failed to send material updated event");
            }
        }

        Ok(model)
    }

    /// Deletes a material from the catalog. Orders referencing it keep
    /// their stored selections; nothing guards the dangling reference.
    #[instrument(skip(self), fields(material_id = %material_id))]
    pub async fn delete_material(&self, material_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let result = MaterialEntity::delete_by_id(material_id)
            .exec(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Material not found".to_string()));
        }

        info!(material_id = %material_id, "Material deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::MaterialDeleted(material_id)).await {
                warn!(error = %e, material_id = %material_id, "Failed to send material deleted event");
            }
        }

        Ok(())
    }
}
