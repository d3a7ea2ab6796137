use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category a catalog material belongs to. An order item selects at most
/// one material per category.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum MaterialCategory {
    #[sea_orm(string_value = "Frame")]
    Frame,
    #[sea_orm(string_value = "Glass")]
    Glass,
    #[sea_orm(string_value = "Mdf")]
    Mdf,
    #[sea_orm(string_value = "Paper")]
    Paper,
    #[sea_orm(string_value = "Backing")]
    Backing,
    #[sea_orm(string_value = "Other")]
    Other,
}

/// How a material is sold and therefore how its consumption is measured.
///
/// Linear-meter materials (frame moulding) are consumed by perimeter,
/// square-meter materials (glass, backing board) by area, and sheet/unit
/// materials as whole pieces regardless of dimensions.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum UnitOfMeasure {
    #[sea_orm(string_value = "LinearMeter")]
    LinearMeter,
    #[sea_orm(string_value = "SquareMeter")]
    SquareMeter,
    #[sea_orm(string_value = "Sheet")]
    Sheet,
    #[sea_orm(string_value = "Unit")]
    Unit,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "materials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: MaterialCategory,
    pub unit: UnitOfMeasure,
    /// Current stock on hand, in the material's unit of measure.
    pub stock: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        }

        if let ActiveValue::NotSet = active_model.updated_at {
            active_model.updated_at = Set(Some(now));
        }

        Ok(active_model)
    }
}
