pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod descriptions;
pub mod health;
pub mod materials;
pub mod orders;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub materials: Arc<crate::services::materials::MaterialService>,
    pub clients: Arc<crate::services::clients::ClientService>,
    pub orders: Arc<crate::services::orders::OrderService>,
    pub auth: Arc<crate::services::auth::AuthService>,
    pub descriptions: Arc<crate::services::descriptions::DescriptionService>,
    pub dashboard: Arc<crate::services::dashboard::DashboardService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        Self {
            materials: Arc::new(crate::services::materials::MaterialService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            clients: Arc::new(crate::services::clients::ClientService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            orders: Arc::new(crate::services::orders::OrderService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            auth: Arc::new(crate::services::auth::AuthService::new(
                db_pool.clone(),
                Some(event_sender),
                config.signup_token.clone(),
            )),
            descriptions: Arc::new(crate::services::descriptions::DescriptionService::new(
                config.description_api_url.clone(),
                config.description_api_key.clone(),
            )),
            dashboard: Arc::new(crate::services::dashboard::DashboardService::new(db_pool)),
        }
    }
}
