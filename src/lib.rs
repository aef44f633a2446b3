// src/lib.rs
pub mod engine;
pub mod error;
pub mod routes;
pub mod state;
pub mod types;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    http, // <-- for http::Method
    routing::{get, post},
};
use state::AppState;
use std::{sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub fn build_app(state: Arc<AppState>) -> Router {
    // --- v1 API ---
    let v1 = Router::new()
        // health/readiness
        .route("/healthz", get(routes::health))
        .route("/readyz", get(routes::ready))
        // streaming data profiling engine
        .route("/profile/sessions", post(routes::create_session))
        .route("/profile/sessions/{id}/chunks", post(routes::upload_chunk))
        .route(
            "/profile/sessions/{id}/finalize",
            post(routes::finalize_session),
        )
        .route("/profile/sessions/{id}/cancel", post(routes::cancel_session))
        .route("/profile/compare", post(routes::compare))
        .route("/profile/delta", post(routes::delta))
        .route("/profile/trend", post(routes::trend))
        .route("/profile/schemas/merge", post(routes::schemas_merge))
        .route("/profile/pooled-merge", post(routes::pooled_merge))
        .with_state(state.clone());

    // --- root router ---
    #[allow(unused_mut)]
    let mut root = Router::new()
        .nest("/api/v1", v1)
        // always expose OpenAPI JSON if you have it
        .route("/openapi.json", get(routes::openapi))
        // middleware layers
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_methods([http::Method::GET, http::Method::POST, http::Method::OPTIONS])
                .allow_origin(Any)
                .allow_headers(Any),
        )
        .layer(DefaultBodyLimit::max(25 * 1024 * 1024)) // allow larger CSV uploads
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    // Optional docs UI (e.g., ReDoc/Swagger) behind "docs" feature
    #[cfg(feature = "docs")]
    {
        root = root.route("/docs", get(routes::docs_ui));
    }

    // Optional Prometheus metrics behind "metrics" feature
    #[cfg(feature = "metrics")]
    {
        root = root.route("/metrics", get(routes::prom_metrics));
    }

    root
}
