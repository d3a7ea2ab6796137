use crate::{
    db::DbPool,
    entities::material::{self, Entity as MaterialEntity, Model as MaterialModel},
    entities::order::{self, Entity as OrderEntity, OrderStatus},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

const LOW_STOCK_THRESHOLD: Decimal = dec!(5);

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub quotes: u64,
    pub in_production: u64,
    pub completed: u64,
    pub canceled: u64,
    /// Sum of totals over all non-canceled orders.
    pub revenue: Decimal,
    pub low_stock: Vec<MaterialModel>,
}

/// Aggregates for the landing view: order counts per status, revenue, and
/// materials running low.
#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn count_status(&self, status: OrderStatus) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;
        OrderEntity::find()
            .filter(order::Column::Status.eq(status))
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<DashboardSummary, ServiceError> {
        let db = &*self.db_pool;

        let quotes = self.count_status(OrderStatus::Quote).await?;
        let in_production = self.count_status(OrderStatus::InProduction).await?;
        let completed = self.count_status(OrderStatus::Completed).await?;
        let canceled = self.count_status(OrderStatus::Canceled).await?;

        let active_orders = OrderEntity::find()
            .filter(order::Column::Status.ne(OrderStatus::Canceled))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        let revenue = active_orders.iter().map(|o| o.total).sum();

        let low_stock = MaterialEntity::find()
            .filter(material::Column::Stock.lte(LOW_STOCK_THRESHOLD))
            .order_by_asc(material::Column::Stock)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(DashboardSummary {
            quotes,
            in_production,
            completed,
            canceled,
            revenue,
            low_stock,
        })
    }
}
