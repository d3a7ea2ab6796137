use crate::{
    db::DbPool,
    entities::user::{self, ActiveModel as UserActiveModel, Entity as UserEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 100, message = "Username must be 3-100 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    /// Shop-issued invite token; signup is closed without it.
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
}

/// Minimal credential store: usernames with SHA-256 password digests.
/// Credential comparison is the only contract the rest of the system
/// relies on.
#[derive(Clone)]
pub struct AuthService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    signup_token: Option<String>,
}

pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    hex::encode(digest)
}

impl AuthService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        signup_token: Option<String>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            signup_token,
        }
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn signup(&self, request: SignupRequest) -> Result<UserResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let expected = self.signup_token.as_deref().ok_or_else(|| {
            ServiceError::AuthError("Signup is disabled".to_string())
        })?;
        if request.token != expected {
            return Err(ServiceError::AuthError("Invalid signup token".to_string()));
        }

        let db = &*self.db_pool;
        let username = request.username.to_lowercase();

        let existing = UserEntity::find()
            .filter(user::Column::Username.eq(username.clone()))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict("Username already taken".to_string()));
        }

        let user_id = Uuid::new_v4();
        let active = UserActiveModel {
            id: Set(user_id),
            username: Set(username.clone()),
            password_hash: Set(hash_password(&request.password)),
            created_at: Set(Utc::now()),
        };

        let model = active
            .insert(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(user_id = %user_id, "User registered");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::UserRegistered(user_id)).await {
                warn!(error = %e, user_id = %user_id, "Failed to send user registered event");
            }
        }

        Ok(UserResponse {
            id: model.id,
            username: model.username,
        })
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> Result<UserResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let username = request.username.to_lowercase();

        let user = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::AuthError("Invalid credentials".to_string()))?;

        if user.password_hash != hash_password(&request.password) {
            return Err(ServiceError::AuthError("Invalid credentials".to_string()));
        }

        info!(user_id = %user.id, "User logged in");

        Ok(UserResponse {
            id: user.id,
            username: user.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_stable_hex_digest() {
        let a = hash_password("secret");
        let b = hash_password("secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_password("Secret"));
    }
}
