//! POST /internal/inventory/events — enqueue a stock-change delivery
//!
//! Thin bridge from HTTP onto the intake channel. The response mirrors the
//! broker contract: 202 when the delivery was durably ingested, 422 when it
//! was rejected (the producer should redeliver), 503 when intake is down.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use http::StatusCode;

use crate::intake::{Delivery, Disposition};
use crate::state::AppState;

pub async fn enqueue(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    let (delivery, done) = Delivery::new(body.to_vec());

    if state.intake_tx.send(delivery).await.is_err() {
        tracing::error!("Intake channel closed, dropping delivery");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"status": "unavailable"})),
        );
    }

    match done.await {
        Ok(Disposition::Ack) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({"status": "accepted"})),
        ),
        Ok(Disposition::Reject) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"status": "rejected"})),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"status": "unavailable"})),
        ),
    }
}
