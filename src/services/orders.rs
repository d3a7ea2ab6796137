use crate::{
    db::DbPool,
    entities::material::{self, Entity as MaterialEntity},
    entities::order::{
        self, ActiveModel as OrderActiveModel, DiscountType, Entity as OrderEntity,
        Model as OrderModel, OrderStatus,
    },
    entities::order_item::{
        self, ActiveModel as OrderItemActiveModel, Entity as OrderItemEntity,
        MaterialSelection, MaterialSelections, Model as OrderItemModel,
    },
    entities::payment_installment::{
        self, ActiveModel as InstallmentActiveModel, Entity as InstallmentEntity,
        Model as InstallmentModel, PaymentMethod, PaymentStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    pricing::{self, CatalogSnapshot, Discount, PricedLine},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountInput {
    #[serde(rename = "type")]
    pub kind: DiscountType,
    pub value: Decimal,
}

impl Default for DiscountInput {
    fn default() -> Self {
        Self {
            kind: DiscountType::Fixed,
            value: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    #[serde(default)]
    pub description: String,
    pub width_cm: Decimal,
    pub height_cm: Decimal,
    pub quantity: i32,
    pub unit_price: Decimal,
    /// Materials selected for this item, by catalog id. The category comes
    /// from the catalog entry; a later selection for the same category
    /// replaces the earlier one.
    #[serde(default)]
    pub materials: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentInput {
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub method: PaymentMethod,
    #[serde(default = "default_payment_status")]
    pub status: PaymentStatus,
}

fn default_payment_status() -> PaymentStatus {
    PaymentStatus::Pending
}

fn default_order_status() -> OrderStatus {
    OrderStatus::Quote
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderRequest {
    pub client_id: Uuid,
    #[serde(default = "default_order_status")]
    pub status: OrderStatus,
    pub entry_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub discount: DiscountInput,
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub installments: Vec<InstallmentInput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: i64,
    pub client_id: Uuid,
    pub status: OrderStatus,
    pub notes: String,
    pub entry_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub discount: DiscountInput,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub installments_total: Decimal,
    /// Difference between the total and the installment plan. Informational
    /// only; a non-zero value never blocks saving.
    pub remaining_to_pay: Decimal,
    pub items: Vec<OrderItemModel>,
    pub installments: Vec<InstallmentModel>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: i64,
    pub client_id: Uuid,
    pub status: OrderStatus,
    pub entry_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub total: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderSummary>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Items with their resolved selections, ready for persistence.
struct ResolvedItem {
    input: OrderItemInput,
    selections: MaterialSelections,
}

/// Service for managing orders: persistence, stock movement, and invocation
/// of the pricing engine.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Boundary validation the engine itself deliberately does not perform:
    /// dimensions and quantities must be positive before the calculator
    /// ever sees them.
    fn validate_request(request: &OrderRequest) -> Result<(), ServiceError> {
        if request.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order must have at least one item".to_string(),
            ));
        }

        for (index, item) in request.items.iter().enumerate() {
            if item.width_cm <= Decimal::ZERO || item.height_cm <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Item {}: width and height must be positive",
                    index + 1
                )));
            }
            if item.quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "Item {}: quantity must be positive",
                    index + 1
                )));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Item {}: unit price must not be negative",
                    index + 1
                )));
            }
        }

        Ok(())
    }

    /// Loads a read-only snapshot of every material the request references.
    async fn load_catalog<C: ConnectionTrait>(
        conn: &C,
        request: &OrderRequest,
    ) -> Result<CatalogSnapshot, ServiceError> {
        let ids: Vec<Uuid> = request
            .items
            .iter()
            .flat_map(|item| item.materials.iter().copied())
            .collect();

        if ids.is_empty() {
            return Ok(CatalogSnapshot::default());
        }

        let materials = MaterialEntity::find()
            .filter(material::Column::Id.is_in(ids))
            .all(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(CatalogSnapshot::from_models(materials))
    }

    /// Resolves each item's material ids against the catalog and runs the
    /// final normalization pass so stored usage values can never be stale.
    fn resolve_items(
        request: &OrderRequest,
        catalog: &CatalogSnapshot,
    ) -> Result<Vec<ResolvedItem>, ServiceError> {
        let mut resolved = Vec::with_capacity(request.items.len());

        for (index, item) in request.items.iter().enumerate() {
            let mut selections = MaterialSelections::default();

            for material_id in &item.materials {
                let material = catalog.get(*material_id).ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Item {}: unknown material {}",
                        index + 1,
                        material_id
                    ))
                })?;
                selections.select(
                    material.category,
                    MaterialSelection {
                        material_id: material.id,
                        quantity_used: Decimal::ZERO,
                    },
                );
            }

            pricing::normalize_selections(item.width_cm, item.height_cm, &mut selections, catalog);

            resolved.push(ResolvedItem {
                input: item.clone(),
                selections,
            });
        }

        Ok(resolved)
    }

    fn totals_for(request: &OrderRequest) -> pricing::OrderTotals {
        let lines: Vec<PricedLine> = request
            .items
            .iter()
            .map(|item| PricedLine {
                unit_price: item.unit_price,
                quantity: item.quantity,
            })
            .collect();

        pricing::order_totals(
            &lines,
            Discount {
                kind: request.discount.kind,
                value: request.discount.value,
            },
        )
    }

    /// Total material consumption across all items, keyed by material id.
    fn consumption(items: &[ResolvedItem]) -> HashMap<Uuid, Decimal> {
        let mut map: HashMap<Uuid, Decimal> = HashMap::new();
        for item in items {
            for (_, selection) in item.selections.iter() {
                let amount =
                    pricing::total_consumption(selection.quantity_used, item.input.quantity);
                *map.entry(selection.material_id).or_default() += amount;
            }
        }
        map
    }

    fn stored_consumption(items: &[OrderItemModel]) -> HashMap<Uuid, Decimal> {
        let mut map: HashMap<Uuid, Decimal> = HashMap::new();
        for item in items {
            for (_, selection) in item.materials.iter() {
                let amount = pricing::total_consumption(selection.quantity_used, item.quantity);
                *map.entry(selection.material_id).or_default() += amount;
            }
        }
        map
    }

    /// Applies a stock delta per material. Negative deltas deduct, positive
    /// restore. Materials deleted from the catalog in the meantime are
    /// skipped.
    async fn apply_stock_delta<C: ConnectionTrait>(
        conn: &C,
        deltas: &HashMap<Uuid, Decimal>,
    ) -> Result<(), ServiceError> {
        for (material_id, delta) in deltas {
            if delta.is_zero() {
                continue;
            }

            let Some(material) = MaterialEntity::find_by_id(*material_id)
                .one(conn)
                .await
                .map_err(ServiceError::DatabaseError)?
            else {
                warn!(material_id = %material_id, "Stock adjustment skipped: material no longer exists");
                continue;
            };

            let new_stock = material.stock + *delta;
            if new_stock < Decimal::ZERO {
                warn!(material_id = %material_id, stock = %new_stock, "Material stock went negative");
            }

            let mut active: material::ActiveModel = material.into();
            active.stock = Set(new_stock);
            active.updated_at = Set(Some(Utc::now()));
            active.update(conn).await.map_err(ServiceError::DatabaseError)?;
        }
        Ok(())
    }

    async fn next_order_number<C: ConnectionTrait>(conn: &C) -> Result<i64, ServiceError> {
        let last = OrderEntity::find()
            .order_by_desc(order::Column::OrderNumber)
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(last.map(|o| o.order_number).unwrap_or(0) + 1)
    }

    #[instrument(skip(self, request), fields(client_id = %request.client_id))]
    pub async fn create_order(&self, request: OrderRequest) -> Result<OrderResponse, ServiceError> {
        Self::validate_request(&request)?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let catalog = Self::load_catalog(&txn, &request).await?;
        let resolved = Self::resolve_items(&request, &catalog)?;
        let totals = Self::totals_for(&request);
        let order_number = Self::next_order_number(&txn).await?;

        let order_active_model = OrderActiveModel {
            id: Set(order_id),
            order_number: Set(order_number),
            client_id: Set(request.client_id),
            status: Set(request.status),
            notes: Set(request.notes.clone()),
            entry_date: Set(request.entry_date),
            due_date: Set(request.due_date),
            discount_type: Set(request.discount.kind),
            discount_value: Set(request.discount.value),
            subtotal: Set(totals.subtotal),
            discount_amount: Set(totals.discount_amount),
            total: Set(totals.total),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let order_model = order_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to create order");
            ServiceError::DatabaseError(e)
        })?;

        let items = Self::insert_items(&txn, order_id, &resolved, now).await?;
        let installments =
            Self::insert_installments(&txn, order_id, &request.installments, now).await?;

        // Stock is held from creation; cancellation gives it back.
        let consumption = Self::consumption(&resolved);
        if request.status != OrderStatus::Canceled {
            let deltas = consumption.iter().map(|(id, qty)| (*id, -*qty)).collect();
            Self::apply_stock_delta(&txn, &deltas).await?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, order_number = order_number, "Order created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCreated(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order created event");
            }
            for (material_id, quantity) in &consumption {
                let _ = event_sender
                    .send(Event::StockDeducted {
                        material_id: *material_id,
                        quantity: *quantity,
                        order_id,
                    })
                    .await;
            }
        }

        Ok(Self::build_response(order_model, items, installments))
    }

    async fn insert_items<C: ConnectionTrait>(
        conn: &C,
        order_id: Uuid,
        resolved: &[ResolvedItem],
        now: chrono::DateTime<Utc>,
    ) -> Result<Vec<OrderItemModel>, ServiceError> {
        let mut models = Vec::with_capacity(resolved.len());

        for (position, item) in resolved.iter().enumerate() {
            let active = OrderItemActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                position: Set(position as i32),
                description: Set(item.input.description.clone()),
                width_cm: Set(item.input.width_cm),
                height_cm: Set(item.input.height_cm),
                quantity: Set(item.input.quantity),
                unit_price: Set(item.input.unit_price),
                materials: Set(item.selections.clone()),
                created_at: Set(now),
                updated_at: Set(Some(now)),
            };
            let model = active
                .insert(conn)
                .await
                .map_err(ServiceError::DatabaseError)?;
            models.push(model);
        }

        Ok(models)
    }

    async fn insert_installments<C: ConnectionTrait>(
        conn: &C,
        order_id: Uuid,
        installments: &[InstallmentInput],
        now: chrono::DateTime<Utc>,
    ) -> Result<Vec<InstallmentModel>, ServiceError> {
        let mut models = Vec::with_capacity(installments.len());

        for (position, installment) in installments.iter().enumerate() {
            let active = InstallmentActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                position: Set(position as i32),
                amount: Set(installment.amount),
                due_date: Set(installment.due_date),
                method: Set(installment.method),
                status: Set(installment.status),
                created_at: Set(now),
            };
            let model = active
                .insert(conn)
                .await
                .map_err(ServiceError::DatabaseError)?;
            models.push(model);
        }

        Ok(models)
    }

    async fn load_children<C: ConnectionTrait>(
        conn: &C,
        order_id: Uuid,
    ) -> Result<(Vec<OrderItemModel>, Vec<InstallmentModel>), ServiceError> {
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::Position)
            .all(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let installments = InstallmentEntity::find()
            .filter(payment_installment::Column::OrderId.eq(order_id))
            .order_by_asc(payment_installment::Column::Position)
            .all(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((items, installments))
    }

    fn build_response(
        order: OrderModel,
        items: Vec<OrderItemModel>,
        installments: Vec<InstallmentModel>,
    ) -> OrderResponse {
        let amounts: Vec<Decimal> = installments.iter().map(|i| i.amount).collect();
        let plan = pricing::reconcile_installments(order.total, &amounts);

        OrderResponse {
            id: order.id,
            order_number: order.order_number,
            client_id: order.client_id,
            status: order.status,
            notes: order.notes,
            entry_date: order.entry_date,
            due_date: order.due_date,
            discount: DiscountInput {
                kind: order.discount_type,
                value: order.discount_value,
            },
            subtotal: order.subtotal,
            discount_amount: order.discount_amount,
            total: order.total,
            installments_total: plan.installments_total,
            remaining_to_pay: plan.remaining_to_pay,
            items,
            installments,
        }
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let Some(order) = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
        else {
            return Ok(None);
        };

        let (items, installments) = Self::load_children(db, order_id).await?;
        Ok(Some(Self::build_response(order, items, installments)))
    }

    /// Looks an order up by its human-facing sequential number.
    #[instrument(skip(self))]
    pub async fn get_order_by_number(
        &self,
        order_number: i64,
    ) -> Result<Option<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let Some(order) = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
        else {
            return Ok(None);
        };

        let order_id = order.id;
        let (items, installments) = Self::load_children(db, order_id).await?;
        Ok(Some(Self::build_response(order, items, installments)))
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
        status: Option<OrderStatus>,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = OrderEntity::find().order_by_desc(order::Column::OrderNumber);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query.paginate(db, per_page);
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        let summaries = orders
            .into_iter()
            .map(|o| OrderSummary {
                id: o.id,
                order_number: o.order_number,
                client_id: o.client_id,
                status: o.status,
                entry_date: o.entry_date,
                due_date: o.due_date,
                total: o.total,
            })
            .collect();

        Ok(OrderListResponse {
            orders: summaries,
            total,
            page,
            per_page,
        })
    }

    /// Replaces the order's content wholesale: items and installments are
    /// rewritten, usage values renormalized, totals recomputed, and the
    /// stock held by the previous revision is exchanged for the new one.
    /// `order_number` never changes. Status may be set to any value here;
    /// the only transition with side effects (into or out of Canceled) is
    /// detected by comparing against the stored status.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: Uuid,
        request: OrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        Self::validate_request(&request)?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let old_status = order.status;
        let (old_items, _) = Self::load_children(&txn, order_id).await?;

        if old_status != OrderStatus::Canceled {
            Self::apply_stock_delta(&txn, &Self::stored_consumption(&old_items)).await?;
        }

        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        InstallmentEntity::delete_many()
            .filter(payment_installment::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let catalog = Self::load_catalog(&txn, &request).await?;
        let resolved = Self::resolve_items(&request, &catalog)?;
        let totals = Self::totals_for(&request);

        let mut order_active: OrderActiveModel = order.into();
        order_active.client_id = Set(request.client_id);
        order_active.status = Set(request.status);
        order_active.notes = Set(request.notes.clone());
        order_active.entry_date = Set(request.entry_date);
        order_active.due_date = Set(request.due_date);
        order_active.discount_type = Set(request.discount.kind);
        order_active.discount_value = Set(request.discount.value);
        order_active.subtotal = Set(totals.subtotal);
        order_active.discount_amount = Set(totals.discount_amount);
        order_active.total = Set(totals.total);
        order_active.updated_at = Set(Some(now));

        let order_model = order_active
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let items = Self::insert_items(&txn, order_id, &resolved, now).await?;
        let installments =
            Self::insert_installments(&txn, order_id, &request.installments, now).await?;

        if request.status != OrderStatus::Canceled {
            let deltas = Self::consumption(&resolved)
                .into_iter()
                .map(|(id, qty)| (id, -qty))
                .collect();
            Self::apply_stock_delta(&txn, &deltas).await?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order update");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, "Order updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderUpdated(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order updated event");
            }
            if old_status != request.status {
                let _ = event_sender
                    .send(Event::OrderStatusChanged {
                        order_id,
                        old_status: old_status.to_string(),
                        new_status: request.status.to_string(),
                    })
                    .await;
            }
        }

        Ok(Self::build_response(order_model, items, installments))
    }

    /// Cancels an order and restores the stock it held. Canceling an
    /// already-Canceled order is a no-op, short-circuited before any
    /// mutation.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        if order.status == OrderStatus::Canceled {
            info!(order_id = %order_id, "Order already canceled; nothing to do");
            let (items, installments) = Self::load_children(db, order_id).await?;
            return Ok(Self::build_response(order, items, installments));
        }

        let old_status = order.status;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let (items, installments) = Self::load_children(&txn, order_id).await?;
        let restored = Self::stored_consumption(&items);
        Self::apply_stock_delta(&txn, &restored).await?;

        let mut order_active: OrderActiveModel = order.into();
        order_active.status = Set(OrderStatus::Canceled);
        order_active.updated_at = Set(Some(Utc::now()));
        let order_model = order_active
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order cancellation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, from = %old_status, "Order canceled");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCancelled(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order cancelled event");
            }
            for (material_id, quantity) in &restored {
                let _ = event_sender
                    .send(Event::StockRestored {
                        material_id: *material_id,
                        quantity: *quantity,
                        order_id,
                    })
                    .await;
            }
        }

        Ok(Self::build_response(order_model, items, installments))
    }
}
