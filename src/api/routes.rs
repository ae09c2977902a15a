use crate::error::AppError;
use crate::workflows::maintenance::requests::{OutboxStatusSummary, RequestRepository};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn with_operational_routes<R>(router: axum::Router, outbox: Arc<R>) -> axum::Router
where
    R: RequestRepository + 'static,
{
    router
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/maintenance/outbox",
            axum::routing::get(outbox_endpoint::<R>),
        )
        .layer(Extension(outbox))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
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

/// Queue depth of undelivered notifications, for operators watching dispatch health.
pub(crate) async fn outbox_endpoint<R>(
    Extension(store): Extension<Arc<R>>,
) -> Result<Json<OutboxStatusSummary>, AppError>
where
    R: RequestRepository + 'static,
{
    Ok(Json(store.outbox_status()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryRequestStore;

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn outbox_endpoint_reports_empty_queue() {
        let store = Arc::new(InMemoryRequestStore::default());
        let Json(summary) = outbox_endpoint(Extension(store))
            .await
            .expect("summary builds");
        assert_eq!(summary, OutboxStatusSummary::default());
    }
}
