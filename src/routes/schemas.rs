//! JSON Schema & OpenAPI exposure.

use axum::Json;
use axum::response::IntoResponse;
use schemars::schema_for;
use serde_json::json;

/// Minimal OpenAPI 3.0 document generated from `schemars` schemas.
///
/// Exposes the service surface used by Swagger/ReDoc UIs.
/// The document includes paths, summaries, and request/response schemas.
///
/// This is a **lightweight** OpenAPI; for production you may want a fuller
/// doc (e.g., with examples, tags, error schemas, etc.).
pub async fn openapi() -> impl IntoResponse {
    // --- Profiling engine schemas ---
    let s_create_session_in = schema_for!(crate::types::CreateSessionRequest);
    let s_create_session_out = schema_for!(crate::types::CreateSessionResponse);
    let s_chunk_ack = schema_for!(crate::types::ChunkAck);
    let s_profile_result = schema_for!(crate::engine::profile::ProfileResult);
    let s_compare_in = schema_for!(crate::types::CompareRequest);
    let s_compare_out = schema_for!(crate::engine::comparison::CompareResult);
    let s_delta_in = schema_for!(crate::types::DeltaRequest);
    let s_delta_out = schema_for!(crate::engine::comparison::DeltaResult);
    let s_trend_in = schema_for!(crate::types::TrendRequest);
    let s_trend_out = schema_for!(crate::engine::comparison::TrendEntry);
    let s_schema_merge_in = schema_for!(crate::types::SchemaMergeRequest);
    let s_schema_merge_out = schema_for!(crate::engine::comparison::SchemaMergeResult);
    let s_pooled_merge_in = schema_for!(crate::types::PooledMergeRequest);
    let s_pooled_merge_out = schema_for!(crate::engine::comparison::PooledMergeResult);

    Json(json!({
      "openapi": "3.0.3",
      "info": { "title": "stats_rs", "version": env!("CARGO_PKG_VERSION") },
      "paths": {
        // --- health ---
        "/api/v1/healthz": { "get": { "summary": "Liveness probe",  "responses": { "200": { "description": "OK" }}} },
        "/api/v1/readyz":  { "get": { "summary": "Readiness probe", "responses": { "200": { "description": "OK" }}} },

        // --- Profiling sessions ---
        "/api/v1/profile/sessions": {
          "post": {"summary": "Open a new streaming profiling session",
            "requestBody": {"required": false, "content": {"application/json": {"schema": s_create_session_in}}},
            "responses":   {"200": {"description": "OK", "content": {"application/json": {"schema": s_create_session_out}}}}
          }
        },
        "/api/v1/profile/sessions/{id}/chunks": {
          "post": {"summary": "Feed the next byte chunk into an open session",
            "requestBody": {"required": true, "content": {"application/octet-stream": {"schema": {"type": "string", "format": "binary"}}}},
            "responses":   {"200": {"description": "OK", "content": {"application/json": {"schema": s_chunk_ack}}}, "404": {"description": "Unknown session"}}
          }
        },
        "/api/v1/profile/sessions/{id}/finalize": {
          "post": {"summary": "Close a session and return its column profiles",
            "responses": {"200": {"description": "OK", "content": {"application/json": {"schema": s_profile_result}}}, "404": {"description": "Unknown session"}}
          }
        },
        "/api/v1/profile/sessions/{id}/cancel": {
          "post": {"summary": "Abandon a session and discard its state",
            "responses": {"204": {"description": "No Content"}, "404": {"description": "Unknown session"}}
          }
        },

        // --- Comparison & aggregation ---
        "/api/v1/profile/compare": {
          "post": {"summary": "Pairwise column diff between two profiles",
            "requestBody": {"required": true, "content": {"application/json": {"schema": s_compare_in}}},
            "responses":   {"200": {"description": "OK", "content": {"application/json": {"schema": s_compare_out}}}}
          }
        },
        "/api/v1/profile/delta": {
          "post": {"summary": "Per-metric delta of a baseline against N candidates",
            "requestBody": {"required": true, "content": {"application/json": {"schema": s_delta_in}}},
            "responses":   {"200": {"description": "OK", "content": {"application/json": {"schema": {"type": "array", "items": s_delta_out}}}}}
          }
        },
        "/api/v1/profile/trend": {
          "post": {"summary": "Classify stable/volatile/improving/degrading trends across candidates",
            "requestBody": {"required": true, "content": {"application/json": {"schema": s_trend_in}}},
            "responses":   {"200": {"description": "OK", "content": {"application/json": {"schema": {"type": "array", "items": s_trend_out}}}}}
          }
        },
        "/api/v1/profile/schemas/merge": {
          "post": {"summary": "Validate schema compatibility across profiles",
            "requestBody": {"required": true, "content": {"application/json": {"schema": s_schema_merge_in}}},
            "responses":   {"200": {"description": "OK", "content": {"application/json": {"schema": s_schema_merge_out}}}}
          }
        },
        "/api/v1/profile/pooled-merge": {
          "post": {"summary": "Pool column statistics across named profiles",
            "requestBody": {"required": true, "content": {"application/json": {"schema": s_pooled_merge_in}}},
            "responses":   {"200": {"description": "OK", "content": {"application/json": {"schema": s_pooled_merge_out}}}}
          }
        }
      }
    }))
}
