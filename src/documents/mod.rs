//! Printable order document assembly.
//!
//! Builds the fixed-layout invoice for an order (business header, client
//! block, itemized table with per-item material listing, totals block,
//! installment table, notes footer) from already-computed order data.
//! Output is a structured value plus a plain-text rendering; actual
//! printing/PDF/share mechanics live outside this crate.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::entities::client::Model as ClientModel;
use crate::pricing::CatalogSnapshot;
use crate::services::orders::OrderResponse;

#[derive(Debug, Serialize)]
pub struct DocumentLineMaterial {
    pub category: String,
    pub name: String,
    /// Per-piece consumption in the material's unit of measure.
    pub quantity_used: Decimal,
    pub unit: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentLine {
    pub position: i32,
    pub description: String,
    pub width_cm: Decimal,
    pub height_cm: Decimal,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub materials: Vec<DocumentLineMaterial>,
}

#[derive(Debug, Serialize)]
pub struct DocumentInstallment {
    pub amount: Decimal,
    pub due_date: String,
    pub method: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct OrderDocument {
    pub business_name: String,
    pub order_number: i64,
    pub status: String,
    pub entry_date: String,
    pub due_date: Option<String>,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: String,
    pub lines: Vec<DocumentLine>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub installments: Vec<DocumentInstallment>,
    pub installments_total: Decimal,
    pub remaining_to_pay: Decimal,
    pub notes: String,
}

/// Rounds a money value to two decimal places for display. Stored values
/// keep full precision; rounding happens only here.
fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Assembles the printable document for an order.
///
/// Material names come from the catalog snapshot; a selection whose
/// material has since been deleted is listed with a placeholder name
/// rather than dropped, so the document still reflects what was ordered.
pub fn build_order_document(
    business_name: &str,
    order: &OrderResponse,
    client: &ClientModel,
    catalog: &CatalogSnapshot,
) -> OrderDocument {
    let lines = order
        .items
        .iter()
        .map(|item| {
            let materials = item
                .materials
                .iter()
                .map(|(category, selection)| {
                    let (name, unit) = catalog
                        .get(selection.material_id)
                        .map(|m| (m.name.clone(), m.unit.to_string()))
                        .unwrap_or_else(|| ("(removed material)".to_string(), String::new()));
                    DocumentLineMaterial {
                        category: category.to_string(),
                        name,
                        quantity_used: selection.quantity_used,
                        unit,
                    }
                })
                .collect();

            DocumentLine {
                position: item.position + 1,
                description: item.description.clone(),
                width_cm: item.width_cm,
                height_cm: item.height_cm,
                quantity: item.quantity,
                unit_price: money(item.unit_price),
                line_total: money(item.unit_price * Decimal::from(item.quantity)),
                materials,
            }
        })
        .collect();

    let installments = order
        .installments
        .iter()
        .map(|installment| DocumentInstallment {
            amount: money(installment.amount),
            due_date: installment.due_date.to_string(),
            method: installment.method.to_string(),
            status: installment.status.to_string(),
        })
        .collect();

    OrderDocument {
        business_name: business_name.to_string(),
        order_number: order.order_number,
        status: order.status.to_string(),
        entry_date: order.entry_date.to_string(),
        due_date: order.due_date.map(|d| d.to_string()),
        client_name: client.name.clone(),
        client_phone: client.phone.clone(),
        client_email: client.email.clone(),
        lines,
        subtotal: money(order.subtotal),
        discount_amount: money(order.discount_amount),
        total: money(order.total),
        installments,
        installments_total: money(order.installments_total),
        remaining_to_pay: money(order.remaining_to_pay),
        notes: order.notes.clone(),
    }
}

/// Renders the document as plain text with the invoice's fixed layout.
pub fn render_text(doc: &OrderDocument) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", doc.business_name));
    out.push_str(&format!("Order #{} ({})\n", doc.order_number, doc.status));
    out.push_str(&format!("Entry date: {}\n", doc.entry_date));
    if let Some(due) = &doc.due_date {
        out.push_str(&format!("Due date: {}\n", due));
    }
    out.push('\n');

    out.push_str(&format!(
        "Client: {}\nPhone: {}\nEmail: {}\n\n",
        doc.client_name, doc.client_phone, doc.client_email
    ));

    out.push_str("Items\n");
    for line in &doc.lines {
        out.push_str(&format!(
            "  {}. {}, {} x {} cm, qty {} @ {} = {}\n",
            line.position,
            if line.description.is_empty() {
                "(no description)"
            } else {
                &line.description
            },
            line.width_cm,
            line.height_cm,
            line.quantity,
            line.unit_price,
            line.line_total,
        ));
        for m in &line.materials {
            out.push_str(&format!(
                "       {}: {} ({} {})\n",
                m.category, m.name, m.quantity_used, m.unit
            ));
        }
    }
    out.push('\n');

    out.push_str(&format!("Subtotal:  {}\n", doc.subtotal));
    out.push_str(&format!("Discount:  -{}\n", doc.discount_amount));
    out.push_str(&format!("Total:     {}\n\n", doc.total));

    if !doc.installments.is_empty() {
        out.push_str("Payment plan\n");
        for installment in &doc.installments {
            out.push_str(&format!(
                "  {} due {}, {} ({})\n",
                installment.amount, installment.due_date, installment.method, installment.status
            ));
        }
        out.push_str(&format!("Paid/planned: {}\n", doc.installments_total));
        out.push_str(&format!("Remaining:    {}\n\n", doc.remaining_to_pay));
    }

    if !doc.notes.is_empty() {
        out.push_str(&format!("Notes: {}\n", doc.notes));
    }

    out
}
