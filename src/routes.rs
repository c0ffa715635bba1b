use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use fincra_core::cra::{cra_router, ConfigStore, CraService};
use serde_json::json;
use std::sync::Arc;

const SERVICE_NAME: &str = "fincra-cra-api";

/// CRA endpoints plus health are served both at the root and under `/api`.
pub(crate) fn with_cra_routes<S>(service: Arc<CraService<S>>) -> Router
where
    S: ConfigStore + 'static,
{
    let api = cra_router(service).route("/health", get(healthcheck));

    Router::new()
        .nest("/api", api.clone())
        .merge(api)
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
