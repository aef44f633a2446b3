//! # Error Handling Module for `stats_rs`
//!
//! This module defines the core [`ServiceError`] enum used across the `stats_rs`
//! microservice's HTTP layer to represent high-level service errors — the thin
//! translation from an [`EngineError`] (or a missing session lookup) into an
//! HTTP status and a structured JSON body. The enum implements [`IntoResponse`]
//! so it can be returned directly from Axum handlers.

use crate::engine::error::EngineError;
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No profiling session exists for the given id, or it expired.
    #[error("profiling session not found")]
    SessionNotFound,

    /// The profiling engine rejected the request or the input it was given.
    ///
    /// Fatal engine errors (`UnsupportedFormat`, `MalformedHeader`,
    /// `FileTooLarge`, `AccumulatorOverflow`, `Cancelled`) map to `400`;
    /// the engine never emits 5xx-worthy conditions of its own, so there is
    /// no variant mapped to `500` here.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl IntoResponse for ServiceError {
    /// Converts a [`ServiceError`] into an Axum `Response`.
    ///
    /// The response body is JSON with a single `"error"` key, e.g.:
    ///
    /// ```json
    /// { "error": "profiling session not found" }
    /// ```
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            ServiceError::Engine(_) => StatusCode::BAD_REQUEST,
            ServiceError::SessionNotFound => StatusCode::NOT_FOUND,
        };

        let body = json!({ "error": self.to_string() });

        (status, Json(body)).into_response()
    }
}
