use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::{filing::AlarmHandler, metrics as bridge_metrics, runtime::error_body, Error};

const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn metrics() -> Response {
    match bridge_metrics::gather_metrics() {
        Ok(text) => text.into_response(),
        Err(e) => {
            error!(error = %e, "metrics_encode_failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn invoke(
    State(handler): State<Arc<AlarmHandler>>,
    headers: HeaderMap,
    Json(event): Json<Value>,
) -> Response {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    match handler.handle(event, Some(request_id)).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            let status = match e {
                Error::UnsupportedEventShape(_) => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(error_body(&e))).into_response()
        }
    }
}
