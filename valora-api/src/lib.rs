use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod decisions;
pub mod error;
pub mod jobs;
pub mod quotes;
pub mod signals;
pub mod state;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/health", get(health))
        .route("/v1/products/{id}/quote", get(quotes::quote_product))
        .route("/v1/products/{id}/decisions", get(decisions::decision_history))
        .route("/v1/decisions/stream", get(decisions::stream_decisions))
        .route("/v1/signals/view", post(signals::record_view))
        .route("/v1/signals/purchase", post(signals::record_purchase))
        .route("/v1/signals/stock", post(signals::record_stock))
        .route("/v1/signals/competitor", post(signals::record_competitor))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
