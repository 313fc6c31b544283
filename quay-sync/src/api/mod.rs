//! Internal ops surface
//!
//! Health check plus the HTTP enqueue adapter that bridges deliveries onto
//! the intake channel. Marketplace-facing routes live elsewhere in the
//! platform; nothing here is exposed publicly.

pub mod events;
pub mod health;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/internal/inventory/events", post(events::enqueue))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
