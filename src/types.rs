//! # Data Transfer Types for `stats_rs`
//!
//! This module defines all request and response payloads exchanged
//! between clients and the `stats_rs` profiling microservice.
//!
//! Each struct derives [`Serialize`], [`Deserialize`], and [`JsonSchema`],
//! allowing automatic JSON (de)serialization and OpenAPI schema generation.
//!
//! The models are grouped by their corresponding endpoints:
//! - `/profile/sessions*` → [`CreateSessionRequest`], [`CreateSessionResponse`], [`ChunkAck`]
//! - `/profile/compare` → [`CompareRequest`]
//! - `/profile/delta` → [`DeltaRequest`]
//! - `/profile/trend` → [`TrendRequest`]
//! - `/profile/schemas/merge` → [`SchemaMergeRequest`]
//! - `/profile/pooled-merge` → [`PooledMergeRequest`]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ---- `/api/v1/profile/sessions` ----
/// Request body to open a new streaming profiling session.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CreateSessionRequest {
    /// Engine configuration; omit for all-defaults auto-detection.
    #[serde(default)]
    pub config: Option<crate::engine::config::SessionConfig>,
    /// Original filename, used as a hint for format auto-detection.
    #[serde(default)]
    pub filename: Option<String>,
}

/// Response identifying the newly created session.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CreateSessionResponse {
    /// Opaque session id to use in subsequent `/chunks`, `/finalize`, `/cancel` calls.
    pub session_id: String,
}

/// Response for a `POST .../chunks` call.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ChunkAck {
    /// Total bytes received by this session so far.
    pub bytes_received: u64,
}

/// ---- `/api/v1/profile/compare` ----
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CompareRequest {
    pub baseline: crate::engine::profile::ProfileResult,
    pub candidate: crate::engine::profile::ProfileResult,
}

/// ---- `/api/v1/profile/delta` ----
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct DeltaRequest {
    pub baseline: crate::engine::profile::ProfileResult,
    pub candidates: Vec<crate::engine::profile::ProfileResult>,
}

/// ---- `/api/v1/profile/trend` ----
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct TrendRequest {
    pub baseline: crate::engine::profile::ProfileResult,
    pub candidates: Vec<crate::engine::profile::ProfileResult>,
}

/// ---- `/api/v1/profile/schemas/merge` ----
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SchemaMergeRequest {
    pub profiles: Vec<crate::engine::profile::ProfileResult>,
}

/// ---- `/api/v1/profile/pooled-merge` ----
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct PooledMergeRequest {
    /// `(source_label, profile)` pairs; labels are diagnostic only — columns
    /// are matched by name across profiles.
    pub profiles: Vec<(String, crate::engine::profile::ProfileResult)>,
}
