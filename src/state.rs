//! # Shared Application State
//!
//! This module defines the [`AppState`] struct — the central shared state
//! passed to all Axum route handlers in the `stats_rs` microservice.
//!
//! ## Overview
//!
//! The state is wrapped in an [`Arc`](std::sync::Arc) and cloned into
//! each request handler via Axum’s `.with_state()` mechanism.
//!
//! While currently empty, this struct serves as a foundation for adding
//! shared resources such as:
//!
//! - Database connection pools (e.g., PostgreSQL, MongoDB, SQLite)
//! - Cached models or compiled statistical kernels
//! - Configuration data or feature flags
//! - Global rate limiter or metrics handles
//!
//! Example usage from [`lib.rs`](crate::build_app):
//!
//! ```rust,ignore
//! let state = Arc::new(AppState::default());
//! let app = build_app(state);
//! ```
//!
//! Each handler that needs shared context can extract it with:
//!
//! ```rust,ignore
//! async fn handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
//!     // access shared resources here
//! }
//! ```

/// Global shared state for the `stats_rs` service.
///
/// Cloned and shared across all request handlers.
/// Implements [`Clone`] and [`Default`] for convenience in both testing
/// and production.
///
/// Holds one in-flight profiling [`Session`](crate::engine::session::Session)
/// per `session_id`, keyed the way the engine's concurrency model (SPEC_FULL
/// §5) expects: one host task (here, the Axum request handlers) driving each
/// session cooperatively, with no background workers. A `std::sync::Mutex`
/// is sufficient — handlers only ever hold the lock across a single
/// synchronous `process_chunk`/`finalize`/`cancel` call, never across an
/// `.await`.
#[derive(Clone, Default)]
pub struct AppState {
    pub sessions: std::sync::Arc<std::sync::Mutex<std::collections::HashMap<uuid::Uuid, crate::engine::session::Session>>>,
}
