#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;

use frameshop_api as api;

pub const SIGNUP_TOKEN: &str = "test-invite-token";

/// A fully wired application with its own throwaway SQLite database.
pub struct TestApp {
    pub router: Router,
    pub db: Arc<DatabaseConnection>,
    _tmp: tempfile::TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let db_path = tmp.path().join("test.db");
        let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let mut config = api::config::AppConfig::new(
            database_url,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        config.signup_token = Some(SIGNUP_TOKEN.to_string());

        let db = api::db::establish_connection_from_app_config(&config)
            .await
            .expect("connect to test database");
        api::db::run_migrations(&db).await.expect("run migrations");
        let db = Arc::new(db);

        let (event_tx, event_rx) = tokio::sync::mpsc::channel(64);
        let event_sender = api::events::EventSender::new(event_tx);
        tokio::spawn(api::events::process_events(event_rx));

        let services =
            api::handlers::AppServices::new(db.clone(), Arc::new(event_sender.clone()), &config);
        let state = api::AppState {
            db: db.clone(),
            config,
            event_sender,
            services,
        };

        Self {
            router: api::app_router(state),
            db,
            _tmp: tmp,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("send request");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, None).await
    }

    /// Creates a catalog material and returns its id.
    pub async fn create_material(
        &self,
        code: &str,
        category: &str,
        unit: &str,
        stock: &str,
    ) -> String {
        let (status, body) = self
            .post(
                "/api/v1/materials",
                json!({
                    "code": code,
                    "name": format!("Material {}", code),
                    "category": category,
                    "unit": unit,
                    "stock": stock,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create material: {}", body);
        body["id"].as_str().expect("material id").to_string()
    }

    /// Creates a client and returns its id.
    pub async fn create_client(&self, name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/clients",
                json!({
                    "name": name,
                    "phone": "555-0100",
                    "email": "client@example.com",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create client: {}", body);
        body["id"].as_str().expect("client id").to_string()
    }

    /// Current stock of a material, for asserting on stock movement.
    pub async fn stock_of(&self, material_id: &str) -> Decimal {
        let (status, body) = self.get(&format!("/api/v1/materials/{}", material_id)).await;
        assert_eq!(status, StatusCode::OK, "get material: {}", body);
        dec(&body["stock"])
    }
}

/// Parses a JSON value produced by the API into a `Decimal`. Money and
/// quantity fields are serialized as strings.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected a decimal value, got {}", other),
    }
}
