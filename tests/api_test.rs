mod common;

use axum::http::StatusCode;
use common::{dec, TestApp, SIGNUP_TOKEN};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn material_crud_and_validation() {
    let app = TestApp::spawn().await;

    let (status, created) = app
        .post(
            "/api/v1/materials",
            json!({
                "code": "GL-AR",
                "name": "Anti-reflective glass",
                "category": "Glass",
                "unit": "SquareMeter",
                "stock": "12.5",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(dec(&created["stock"]), dec!(12.5));

    let (status, fetched) = app.get(&format!("/api/v1/materials/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Anti-reflective glass");

    let (status, updated) = app
        .put(
            &format!("/api/v1/materials/{}", id),
            json!({
                "code": "GL-AR",
                "name": "Anti-reflective glass 2mm",
                "category": "Glass",
                "unit": "SquareMeter",
                "stock": "20",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(dec(&updated["stock"]), dec!(20));

    let (status, listing) = app.get("/api/v1/materials").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["total"], 1);

    let (status, _) = app.delete(&format!("/api/v1/materials/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/api/v1/materials/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Negative stock is rejected at the boundary.
    let (status, body) = app
        .post(
            "/api/v1/materials",
            json!({
                "code": "BAD",
                "name": "Bad stock",
                "category": "Other",
                "unit": "Unit",
                "stock": "-1",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    // So is an empty name.
    let (status, _) = app
        .post(
            "/api/v1/materials",
            json!({
                "code": "EMPTY",
                "name": "",
                "category": "Other",
                "unit": "Unit",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn client_crud() {
    let app = TestApp::spawn().await;

    let (status, created) = app
        .post(
            "/api/v1/clients",
            json!({
                "name": "Helena Costa",
                "phone": "555-0199",
                "email": "helena@example.com",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .put(
            &format!("/api/v1/clients/{}", id),
            json!({
                "name": "Helena Costa",
                "phone": "555-0200",
                "email": "helena@example.com",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "555-0200");

    let (status, listing) = app.get("/api/v1/clients").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["total"], 1);

    let (status, _) = app.delete(&format!("/api/v1/clients/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/api/v1/clients/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn signup_requires_invite_token_and_login_checks_credentials() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/api/v1/auth/signup",
            json!({ "username": "Framer", "password": "secret1", "token": "wrong" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", body);

    let (status, user) = app
        .post(
            "/api/v1/auth/signup",
            json!({ "username": "Framer", "password": "secret1", "token": SIGNUP_TOKEN }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", user);
    assert_eq!(user["username"], "framer");

    // Usernames are case-insensitive unique.
    let (status, _) = app
        .post(
            "/api/v1/auth/signup",
            json!({ "username": "FRAMER", "password": "secret2", "token": SIGNUP_TOKEN }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(
            "/api/v1/auth/login",
            json!({ "username": "framer", "password": "nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, logged_in) = app
        .post(
            "/api/v1/auth/login",
            json!({ "username": "framer", "password": "secret1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logged_in["id"], user["id"]);
}

#[tokio::test]
async fn description_endpoint_uses_static_fallback() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/api/v1/descriptions",
            json!({
                "width_cm": "60",
                "height_cm": "80",
                "materials": ["Oak moulding", "Museum glass"],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let text = body["description"].as_str().unwrap();
    assert!(text.contains("60 x 80 cm"), "{}", text);
    assert!(text.contains("Oak moulding"), "{}", text);

    let (status, _) = app
        .post(
            "/api/v1/descriptions",
            json!({ "width_cm": "60", "height_cm": "80", "materials": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_reports_counts_revenue_and_low_stock() {
    let app = TestApp::spawn().await;

    let frame = app.create_material("FR-1", "Frame", "LinearMeter", "3").await;
    let client_id = app.create_client("Igor Paz").await;

    let item = json!([{
        "width_cm": "20",
        "height_cm": "30",
        "quantity": 1,
        "unit_price": "40.00",
    }]);
    let (_, first) = app
        .post(
            "/api/v1/orders",
            json!({ "client_id": client_id, "entry_date": "2026-08-29", "items": item }),
        )
        .await;
    let (_, second) = app
        .post(
            "/api/v1/orders",
            json!({ "client_id": client_id, "entry_date": "2026-08-29", "items": item }),
        )
        .await;
    assert_eq!(first["order_number"], 1);
    let id = second["id"].as_str().unwrap();
    let (status, _) = app
        .post(&format!("/api/v1/orders/{}/cancel", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, summary) = app.get("/api/v1/dashboard").await;
    assert_eq!(status, StatusCode::OK, "{}", summary);
    assert_eq!(summary["quotes"], 1);
    assert_eq!(summary["canceled"], 1);
    // Canceled orders do not count toward revenue.
    assert_eq!(dec(&summary["revenue"]), dec!(40));
    assert_eq!(summary["low_stock"][0]["id"], frame.as_str());
}

#[tokio::test]
async fn order_document_renders_header_items_and_payment_plan() {
    let app = TestApp::spawn().await;

    let frame = app.create_material("FR-1", "Frame", "LinearMeter", "100").await;
    let client_id = app.create_client("Joana Brito").await;

    let (status, order) = app
        .post(
            "/api/v1/orders",
            json!({
                "client_id": client_id,
                "entry_date": "2026-08-29",
                "notes": "Pick up after 5pm",
                "items": [{
                    "description": "Poster",
                    "width_cm": "60",
                    "height_cm": "80",
                    "quantity": 2,
                    "unit_price": "50.00",
                    "materials": [frame],
                }],
                "installments": [
                    { "amount": "100.00", "due_date": "2026-08-29", "method": "Cash", "status": "Paid" },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);

    let (status, doc) = app.get("/api/v1/orders/1/document").await;
    assert_eq!(status, StatusCode::OK, "{}", doc);
    assert_eq!(doc["order_number"], 1);
    assert_eq!(doc["client_name"], "Joana Brito");
    assert_eq!(dec(&doc["lines"][0]["line_total"]), dec!(100));
    assert_eq!(doc["lines"][0]["materials"][0]["category"], "Frame");
    assert_eq!(dec(&doc["installments_total"]), dec!(100));
    assert_eq!(doc["notes"], "Pick up after 5pm");

    let (status, text) = app.get("/api/v1/orders/1/document.txt").await;
    assert_eq!(status, StatusCode::OK);
    let rendered = text.as_str().unwrap();
    assert!(rendered.contains("Order #1"), "{}", rendered);
    assert!(rendered.contains("Joana Brito"), "{}", rendered);
    assert!(rendered.contains("Payment plan"), "{}", rendered);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}
