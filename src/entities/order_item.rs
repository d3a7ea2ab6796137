use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::material::MaterialCategory;

/// One material chosen for an item, together with the per-piece consumption
/// computed by the pricing engine. `quantity_used` is never taken from the
/// client as authoritative; it is refreshed during normalization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSelection {
    pub material_id: Uuid,
    pub quantity_used: Decimal,
}

/// Material selections keyed by category. Using the category as the map key
/// makes "at most one material per category" structural: inserting a
/// selection for a category replaces any prior one.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, FromJsonQueryResult)]
pub struct MaterialSelections(pub BTreeMap<MaterialCategory, MaterialSelection>);

impl MaterialSelections {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MaterialCategory, &MaterialSelection)> {
        self.0.iter()
    }

    /// Selects `material_id` for `category`, replacing any prior selection.
    pub fn select(&mut self, category: MaterialCategory, selection: MaterialSelection) {
        self.0.insert(category, selection);
    }

    pub fn clear_category(&mut self, category: MaterialCategory) {
        self.0.remove(&category);
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    /// Entry order within the order; meaningful for display.
    pub position: i32,
    pub description: String,
    pub width_cm: Decimal,
    pub height_cm: Decimal,
    /// Count of identical physical pieces.
    pub quantity: i32,
    pub unit_price: Decimal,
    #[sea_orm(column_type = "Json")]
    pub materials: MaterialSelections,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        Ok(self)
    }
}
