//! HTTP routes and handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use poclass_core::{Classification, Stage};
use poclass_store::{summarize, ClassificationRecord, RecordSummary, ReviewAction};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/v1/classify", post(classify))
        .route("/v1/records", post(record_review))
        .route("/v1/stats", get(stats))
        .fallback(fallback)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct ClassifyRequest {
    po_description: String,
    #[serde(default)]
    supplier: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClassifyResponse {
    #[serde(flatten)]
    classification: Classification,
    source: Stage,
    latency_us: u64,
}

async fn classify(
    State(state): State<AppState>,
    Json(req): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    let description = req.po_description.trim();
    if description.is_empty() {
        return Err(AppError::InvalidRequest(
            "po_description must not be empty".to_string(),
        ));
    }
    let supplier = req
        .supplier
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let result = state.cascade.classify_detailed(description, supplier).await;
    debug!(source = %result.stage, "Classify request served");

    Ok(Json(ClassifyResponse {
        classification: result.classification,
        source: result.stage,
        latency_us: result.latency_us,
    }))
}

#[derive(Debug, Deserialize)]
struct RecordRequest {
    classification: Classification,
    #[serde(default)]
    supplier: Option<String>,
    action: ReviewAction,
}

async fn record_review(
    State(state): State<AppState>,
    Json(req): Json<RecordRequest>,
) -> Result<(StatusCode, Json<ClassificationRecord>), AppError> {
    if req.classification.po_description.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "classification.po_description must not be empty".to_string(),
        ));
    }

    let supplier = req
        .supplier
        .unwrap_or_else(|| poclass_core::NOT_PROVIDED.to_string());
    let record = ClassificationRecord::from_classification(&req.classification, supplier, req.action);
    state
        .records
        .append(&record)
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    info!(id = %record.id, action = ?record.action, "Recorded review");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn stats(State(state): State<AppState>) -> Result<Json<RecordSummary>, AppError> {
    let records = state
        .records
        .load_all()
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    Ok(Json(summarize(&records)))
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Error handling
#[derive(Debug)]
enum AppError {
    InvalidRequest(String),
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, kind) = match self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg, "invalid_request_error"),
            AppError::InternalError(msg) => {
                error!("Request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg, "internal_error")
            }
        };

        let body = json!({
            "error": {
                "message": message,
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use poclass_classifiers::ClassificationCascade;
    use poclass_core::{Taxonomy, Triple};
    use poclass_store::JsonlRecordStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        let taxonomy = Taxonomy::new(
            "test",
            vec![
                Triple::new("IT", "Hardware", "Laptop"),
                Triple::new("IT", "Software", "Subscription"),
            ],
        )
        .unwrap();

        AppState {
            cascade: Arc::new(ClassificationCascade::builder(Arc::new(taxonomy)).build()),
            records: Arc::new(JsonlRecordStore::new(dir.path().join("records.jsonl"))),
            metrics: None,
        }
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = create_router(test_state(&dir))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_classify_reports_source() {
        let dir = tempfile::tempdir().unwrap();
        let response = create_router(test_state(&dir))
            .oneshot(post_json(
                "/v1/classify",
                json!({"po_description": "Purchase laptop for new hire", "supplier": "Dell"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["L1"], "IT");
        assert_eq!(body["L3"], "Laptop");
        assert_eq!(body["source"], "rules");
        assert_eq!(body["taxonomy_version"], "test");
    }

    #[tokio::test]
    async fn test_classify_without_supplier_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let response = create_router(test_state(&dir))
            .oneshot(post_json("/v1/classify", json!({"po_description": "Office plants"})))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["L1"], "Not sure");
        assert_eq!(body["source"], "fallback");
    }

    #[tokio::test]
    async fn test_empty_description_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let response = create_router(test_state(&dir))
            .oneshot(post_json("/v1/classify", json!({"po_description": "   "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_records_feed_stats() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let classification = json!({
            "po_description": "Annual seat renewal",
            "L1": "IT", "L2": "Software", "L3": "Subscription",
            "confidence": 0.9, "reason": "Supplier hint",
            "taxonomy_version": "test"
        });
        let response = create_router(state.clone())
            .oneshot(post_json(
                "/v1/records",
                json!({"classification": classification, "supplier": "Microsoft", "action": "Approved"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = create_router(state)
            .oneshot(Request::get("/v1/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["actions"]["approved"], 1);
        assert_eq!(body["categories"][0]["L2"], "Software");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let dir = tempfile::tempdir().unwrap();
        let response = create_router(test_state(&dir))
            .oneshot(Request::get("/v2/nothing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
