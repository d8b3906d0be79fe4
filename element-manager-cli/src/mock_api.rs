//! Mock object catalog API
//!
//! Serves `/objects` from a [`MemoryStore`] so the client can be exercised without
//! the public service. With writes not persisted, POST and PUT answer normally but
//! later reads do not see the change, like the public catalog.

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use element_manager_core::{Element, MemoryStore, RemoteStore, StoreError, WritePayload};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Mock API server configuration
#[derive(Debug, Clone)]
pub struct MockApiConfig {
    pub host: String,
    pub port: u16,
    pub persist_writes: bool,
}

impl Default for MockApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            persist_writes: true,
        }
    }
}

impl MockApiConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Seeded store for a long-running server, so no call log is kept.
    pub fn store(&self) -> MemoryStore {
        let store = if self.persist_writes {
            MemoryStore::new(seed_catalog())
        } else {
            MemoryStore::non_persisting(seed_catalog())
        };
        store.without_call_log()
    }
}

/// A handful of devices in the catalog's own shape.
pub fn seed_catalog() -> Vec<Element> {
    let raw = json!([
        {"id": "1", "name": "Google Pixel 6 Pro", "data": {"color": "Cloudy White", "capacity": "128 GB"}},
        {"id": "2", "name": "Apple iPhone 12 Mini, 256GB, Blue", "data": null},
        {"id": "3", "name": "Apple iPhone 12 Pro Max", "data": {"color": "Cloudy White", "capacity GB": 512}},
        {"id": "4", "name": "Apple iPhone 11, 64GB", "data": {"price": 389.99, "color": "Purple"}},
        {"id": "5", "name": "Samsung Galaxy Z Fold2", "data": {"price": 689.99, "color": "Brown"}},
        {"id": "6", "name": "Apple AirPods", "data": {"generation": "3rd", "price": 120}},
        {"id": "7", "name": "Apple MacBook Pro 16", "data": {
            "year": 2019, "price": 1849.99, "CPU model": "Intel Core i9", "Hard disk size": "1 TB"
        }}
    ]);
    serde_json::from_value(raw).unwrap_or_default()
}

pub fn router(store: Arc<MemoryStore>) -> Router {
    Router::new()
        .route("/objects", get(list_objects).post(create_object))
        .route(
            "/objects/:id",
            get(get_object).put(update_object).delete(delete_object),
        )
        .with_state(store)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve in the background. Port 0 picks a free port.
pub async fn spawn(store: Arc<MemoryStore>, addr: &str) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind mock API on {}", addr))?;
    let local_addr = listener
        .local_addr()
        .context("Failed to read mock API address")?;
    let app = router(store);

    let handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!(error = %err, "mock API stopped");
        }
    });
    Ok((local_addr, handle))
}

/// Serve until the process is stopped.
pub async fn serve(config: MockApiConfig) -> Result<()> {
    let store = Arc::new(config.store());
    let listener = TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("Failed to bind mock API on {}", config.addr()))?;

    info!(
        addr = %config.addr(),
        persist_writes = config.persist_writes,
        "mock catalog API listening"
    );
    axum::serve(listener, router(store))
        .await
        .context("Mock API server failed")
}

struct ApiError(StoreError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self
            .0
            .status()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match self.0 {
            StoreError::Status { body, .. } => body,
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

async fn list_objects(
    State(store): State<Arc<MemoryStore>>,
) -> Result<Json<Vec<Element>>, ApiError> {
    Ok(Json(store.list().await?))
}

async fn get_object(
    State(store): State<Arc<MemoryStore>>,
    Path(id): Path<String>,
) -> Result<Json<Element>, ApiError> {
    store.get(&id).await.map(Json).ok_or_else(|| {
        ApiError(StoreError::Status {
            status: 404,
            body: format!("Object with id = {} was not found.", id),
        })
    })
}

async fn create_object(
    State(store): State<Arc<MemoryStore>>,
    Json(payload): Json<WritePayload>,
) -> Result<Json<Element>, ApiError> {
    Ok(Json(store.create(&payload).await?))
}

async fn update_object(
    State(store): State<Arc<MemoryStore>>,
    Path(id): Path<String>,
    Json(payload): Json<WritePayload>,
) -> Result<Json<Element>, ApiError> {
    Ok(Json(store.update(&id, &payload).await?))
}

async fn delete_object(
    State(store): State<Arc<MemoryStore>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    store.delete(&id).await?;
    Ok(Json(json!({
        "message": format!("Object with id = {} has been deleted.", id)
    })))
}
