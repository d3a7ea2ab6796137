use crate::{
    db::DbPool,
    entities::client::{
        self, ActiveModel as ClientActiveModel, Entity as ClientEntity, Model as ClientModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ClientInput {
    #[validate(length(min = 1, max = 255, message = "Client name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientListResponse {
    pub clients: Vec<ClientModel>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Clone)]
pub struct ClientService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ClientService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_client(&self, request: ClientInput) -> Result<ClientModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let client_id = Uuid::new_v4();

        let active_model = ClientActiveModel {
            id: Set(client_id),
            name: Set(request.name),
            phone: Set(request.phone),
            email: Set(request.email),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let model = active_model
            .insert(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(client_id = %client_id, "Client created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ClientCreated(client_id)).await {
                warn!(error = %e, client_id = %client_id, "Failed to send client created event");
            }
        }

        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_client(&self, client_id: Uuid) -> Result<Option<ClientModel>, ServiceError> {
        let db = &*self.db_pool;
        let model = ClientEntity::find_by_id(client_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn list_clients(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<ClientListResponse, ServiceError> {
        let db = &*self.db_pool;

        let paginator = ClientEntity::find()
            .order_by_asc(client::Column::Name)
            .paginate(db, per_page);

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let clients = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(ClientListResponse {
            clients,
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self, request), fields(client_id = %client_id))]
    pub async fn update_client(
        &self,
        client_id: Uuid,
        request: ClientInput,
    ) -> Result<ClientModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let model = ClientEntity::find_by_id(client_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Client not found".to_string()))?;

        let mut active_model: ClientActiveModel = model.into();
        active_model.name = Set(request.name);
        active_model.phone = Set(request.phone);
        active_model.email = Set(request.email);
        active_model.updated_at = Set(Some(Utc::now()));

        let model = active_model
            .update(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(client_id = %client_id, "Client updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ClientUpdated(client_id)).await {
                warn!(error = %e, client_id = %client_id, "Failed to send client updated event");
            }
        }

        Ok(model)
    }

    /// Deletes a client. Existing orders keep their client_id reference;
    /// the core does not guard the dangling reference.
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub async fn delete_client(&self, client_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let result = ClientEntity::delete_by_id(client_id)
            .exec(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Client not found".to_string()));
        }

        info!(client_id = %client_id, "Client deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ClientDeleted(client_id)).await {
                warn!(error = %e, client_id = %client_id, "Failed to send client deleted event");
            }
        }

        Ok(())
    }
}
