mod common;

use axum::http::StatusCode;
use common::{dec, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

fn order_body(client_id: &str, items: serde_json::Value) -> serde_json::Value {
    json!({
        "client_id": client_id,
        "entry_date": "2026-08-29",
        "items": items,
    })
}

#[tokio::test]
async fn create_order_computes_usage_totals_and_deducts_stock() {
    let app = TestApp::spawn().await;

    let frame = app.create_material("FR-1", "Frame", "LinearMeter", "100").await;
    let glass = app.create_material("GL-1", "Glass", "SquareMeter", "50").await;
    let backing = app.create_material("BK-1", "Backing", "Sheet", "20").await;
    let client_id = app.create_client("Ana Souza").await;

    let (status, order) = app
        .post(
            "/api/v1/orders",
            json!({
                "client_id": client_id,
                "entry_date": "2026-08-29",
                "due_date": "2026-09-10",
                "notes": "Wedding photo",
                "discount": { "type": "percentage", "value": "10" },
                "items": [{
                    "description": "60x80 canvas",
                    "width_cm": "60",
                    "height_cm": "80",
                    "quantity": 2,
                    "unit_price": "50.00",
                    "materials": [frame, glass, backing],
                }],
                "installments": [
                    { "amount": "45.00", "due_date": "2026-08-29", "method": "Cash" },
                    { "amount": "45.00", "due_date": "2026-09-29", "method": "CreditCard" },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);

    assert_eq!(order["order_number"], 1);
    assert_eq!(order["status"], "Quote");
    assert_eq!(dec(&order["subtotal"]), dec!(100));
    assert_eq!(dec(&order["discount_amount"]), dec!(10));
    assert_eq!(dec(&order["total"]), dec!(90));
    assert_eq!(dec(&order["installments_total"]), dec!(90));
    assert_eq!(dec(&order["remaining_to_pay"]), dec!(0));

    // Per-piece consumption: perimeter for the moulding, area for the
    // glass, one whole sheet for the backing.
    let materials = &order["items"][0]["materials"];
    assert_eq!(dec(&materials["Frame"]["quantity_used"]), dec!(2.8));
    assert_eq!(dec(&materials["Glass"]["quantity_used"]), dec!(0.48));
    assert_eq!(dec(&materials["Backing"]["quantity_used"]), dec!(1));

    // Stock held for two pieces.
    assert_eq!(app.stock_of(&frame).await, dec!(94.4));
    assert_eq!(app.stock_of(&glass).await, dec!(49.04));
    assert_eq!(app.stock_of(&backing).await, dec!(18));

    // The order resolves by UUID and by its sequential number.
    let id = order["id"].as_str().unwrap();
    let (status, by_id) = app.get(&format!("/api/v1/orders/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, by_number) = app.get("/api/v1/orders/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["id"], by_number["id"]);
}

#[tokio::test]
async fn later_selection_replaces_earlier_one_in_same_category() {
    let app = TestApp::spawn().await;

    let oak = app.create_material("FR-OAK", "Frame", "LinearMeter", "100").await;
    let pine = app.create_material("FR-PINE", "Frame", "LinearMeter", "100").await;
    let client_id = app.create_client("Bruno Lima").await;

    let (status, order) = app
        .post(
            "/api/v1/orders",
            order_body(
                &client_id,
                json!([{
                    "width_cm": "50",
                    "height_cm": "50",
                    "quantity": 1,
                    "unit_price": "30.00",
                    "materials": [oak, pine],
                }]),
            ),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);

    let materials = &order["items"][0]["materials"];
    assert_eq!(materials["Frame"]["material_id"], pine.as_str());

    // Only the winning selection holds stock.
    assert_eq!(app.stock_of(&oak).await, dec!(100));
    assert_eq!(app.stock_of(&pine).await, dec!(98));
}

#[tokio::test]
async fn update_order_renormalizes_usage_and_exchanges_stock() {
    let app = TestApp::spawn().await;

    let frame = app.create_material("FR-1", "Frame", "LinearMeter", "100").await;
    let client_id = app.create_client("Carla Dias").await;

    let (status, order) = app
        .post(
            "/api/v1/orders",
            order_body(
                &client_id,
                json!([{
                    "width_cm": "60",
                    "height_cm": "80",
                    "quantity": 1,
                    "unit_price": "50.00",
                    "materials": [frame],
                }]),
            ),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    assert_eq!(app.stock_of(&frame).await, dec!(97.2));

    let id = order["id"].as_str().unwrap();
    let (status, updated) = app
        .put(
            &format!("/api/v1/orders/{}", id),
            order_body(
                &client_id,
                json!([{
                    "width_cm": "100",
                    "height_cm": "100",
                    "quantity": 1,
                    "unit_price": "80.00",
                    "materials": [frame],
                }]),
            ),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);

    // Usage follows the new dimensions; the old hold is released first.
    assert_eq!(
        dec(&updated["items"][0]["materials"]["Frame"]["quantity_used"]),
        dec!(4)
    );
    assert_eq!(dec(&updated["total"]), dec!(80));
    assert_eq!(app.stock_of(&frame).await, dec!(96));

    // The sequential number survives the rewrite.
    assert_eq!(updated["order_number"], order["order_number"]);
}

#[tokio::test]
async fn cancel_restores_stock_and_is_idempotent() {
    let app = TestApp::spawn().await;

    let frame = app.create_material("FR-1", "Frame", "LinearMeter", "100").await;
    let client_id = app.create_client("Diego Reis").await;

    let (status, order) = app
        .post(
            "/api/v1/orders",
            order_body(
                &client_id,
                json!([{
                    "width_cm": "60",
                    "height_cm": "80",
                    "quantity": 1,
                    "unit_price": "50.00",
                    "materials": [frame],
                }]),
            ),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    assert_eq!(app.stock_of(&frame).await, dec!(97.2));

    let id = order["id"].as_str().unwrap();
    let (status, canceled) = app
        .post(&format!("/api/v1/orders/{}/cancel", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", canceled);
    assert_eq!(canceled["status"], "Canceled");
    assert_eq!(app.stock_of(&frame).await, dec!(100));

    // A second cancellation changes nothing.
    let (status, canceled_again) = app
        .post(&format!("/api/v1/orders/{}/cancel", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(canceled_again["status"], "Canceled");
    assert_eq!(app.stock_of(&frame).await, dec!(100));
}

#[tokio::test]
async fn fixed_discount_may_exceed_subtotal() {
    let app = TestApp::spawn().await;
    let client_id = app.create_client("Elisa Melo").await;

    let (status, order) = app
        .post(
            "/api/v1/orders",
            json!({
                "client_id": client_id,
                "entry_date": "2026-08-29",
                "discount": { "type": "fixed", "value": "50" },
                "items": [{
                    "width_cm": "10",
                    "height_cm": "10",
                    "quantity": 1,
                    "unit_price": "10.00",
                }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);

    // The engine never clamps; negative totals are the caller's problem.
    assert_eq!(dec(&order["subtotal"]), dec!(10));
    assert_eq!(dec(&order["total"]), dec!(-40));
    assert_eq!(dec(&order["remaining_to_pay"]), dec!(-40));
}

#[tokio::test]
async fn order_validation_rejects_bad_input() {
    let app = TestApp::spawn().await;
    let client_id = app.create_client("Fábio Nunes").await;

    // No items at all.
    let (status, _) = app
        .post("/api/v1/orders", order_body(&client_id, json!([])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Non-positive quantity.
    let (status, _) = app
        .post(
            "/api/v1/orders",
            order_body(
                &client_id,
                json!([{
                    "width_cm": "10",
                    "height_cm": "10",
                    "quantity": 0,
                    "unit_price": "10.00",
                }]),
            ),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Material id that is not in the catalog.
    let (status, body) = app
        .post(
            "/api/v1/orders",
            order_body(
                &client_id,
                json!([{
                    "width_cm": "10",
                    "height_cm": "10",
                    "quantity": 1,
                    "unit_price": "10.00",
                    "materials": ["7f1d6a52-0000-0000-0000-000000000000"],
                }]),
            ),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
}

#[tokio::test]
async fn order_numbers_are_sequential_and_listing_filters_by_status() {
    let app = TestApp::spawn().await;
    let client_id = app.create_client("Gina Prado").await;

    let item = json!([{
        "width_cm": "20",
        "height_cm": "30",
        "quantity": 1,
        "unit_price": "15.00",
    }]);

    let (_, first) = app
        .post("/api/v1/orders", order_body(&client_id, item.clone()))
        .await;
    let (_, second) = app
        .post(
            "/api/v1/orders",
            json!({
                "client_id": client_id,
                "status": "InProduction",
                "entry_date": "2026-08-29",
                "items": item,
            }),
        )
        .await;

    assert_eq!(first["order_number"], 1);
    assert_eq!(second["order_number"], 2);

    let (status, listing) = app.get("/api/v1/orders?status=InProduction").await;
    assert_eq!(status, StatusCode::OK, "{}", listing);
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["orders"][0]["order_number"], 2);

    let (_, all) = app.get("/api/v1/orders").await;
    assert_eq!(all["total"], 2);
    // Newest first.
    assert_eq!(all["orders"][0]["order_number"], 2);
}
