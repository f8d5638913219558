use axum::{routing::{get, post}, Router};
use tower_http::trace::TraceLayer;

use crate::config::AppState;
use crate::handlers::rates::{health, index, list_rates, not_found, set_base, status};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/rates", get(list_rates))
        .route("/rates/base", post(set_base))
        .route("/status", get(status))
        .route("/healthz", get(health))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
