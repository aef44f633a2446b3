//! `/api/v1/profile/*` — the streaming data profiling engine's HTTP surface
//! (SPEC_FULL.md §6). Session routes drive one [`Session`](crate::engine::session::Session)
//! per upload; the comparison routes are pure functions over already-frozen
//! [`ProfileResult`](crate::engine::profile::ProfileResult)s and hold no state.

use crate::{
    engine::comparison,
    engine::config::SessionConfig,
    engine::session::Session,
    error::ServiceError,
    state::AppState,
    types::{
        ChunkAck, CompareRequest, CreateSessionRequest, CreateSessionResponse, DeltaRequest,
        PooledMergeRequest, SchemaMergeRequest, TrendRequest,
    },
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

fn parse_session_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw).map_err(|_| ServiceError::SessionNotFound)
}

/// `POST /api/v1/profile/sessions`: open a new session in `Ready` state.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ServiceError> {
    let config = req.config.unwrap_or_default();
    let session = Session::init(config, req.filename);
    let id = Uuid::new_v4();
    state
        .sessions
        .lock()
        .expect("session map mutex poisoned")
        .insert(id, session);
    Ok(Json(CreateSessionResponse {
        session_id: id.to_string(),
    }))
}

/// `POST /api/v1/profile/sessions/{id}/chunks`: feed one raw byte chunk.
pub async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ChunkAck>, ServiceError> {
    let id = parse_session_id(&id)?;
    let mut sessions = state.sessions.lock().expect("session map mutex poisoned");
    let session = sessions.get_mut(&id).ok_or(ServiceError::SessionNotFound)?;
    session.process_chunk(&body)?;
    Ok(Json(ChunkAck {
        bytes_received: body.len() as u64,
    }))
}

/// `POST /api/v1/profile/sessions/{id}/finalize`: flush and freeze into a
/// [`ProfileResult`](crate::engine::profile::ProfileResult). The session
/// stays in the map afterward (`Finalized` state) so the result can be
/// re-fetched or fed into a comparison route without re-running it.
pub async fn finalize_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<crate::engine::profile::ProfileResult>, ServiceError> {
    let id = parse_session_id(&id)?;
    let mut sessions = state.sessions.lock().expect("session map mutex poisoned");
    let session = sessions.get_mut(&id).ok_or(ServiceError::SessionNotFound)?;
    let profile = session.finalize()?;
    Ok(Json(profile))
}

/// `POST /api/v1/profile/sessions/{id}/cancel`: terminal; removes the
/// session from the map (§4.9 — cancellation is terminal, nothing left to
/// inspect afterward).
pub async fn cancel_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    let id = parse_session_id(&id)?;
    let mut sessions = state.sessions.lock().expect("session map mutex poisoned");
    if let Some(mut session) = sessions.remove(&id) {
        session.cancel();
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServiceError::SessionNotFound)
    }
}

/// `POST /api/v1/profile/compare`: pairwise column diff between two profiles.
pub async fn compare(
    Json(req): Json<CompareRequest>,
) -> Json<comparison::CompareResult> {
    Json(comparison::compare(&req.baseline, &req.candidate))
}

/// `POST /api/v1/profile/delta`: one baseline against K candidates.
pub async fn delta(Json(req): Json<DeltaRequest>) -> Json<Vec<comparison::DeltaResult>> {
    Json(comparison::delta(&req.baseline, &req.candidates))
}

/// `POST /api/v1/profile/trend`: per (column, metric) trend classification
/// across K candidates.
pub async fn trend(Json(req): Json<TrendRequest>) -> Json<Vec<comparison::TrendEntry>> {
    Json(comparison::trend(&req.baseline, &req.candidates))
}

/// `POST /api/v1/profile/schemas/merge`: schema compatibility across N profiles.
pub async fn schemas_merge(
    Json(req): Json<SchemaMergeRequest>,
) -> Json<comparison::SchemaMergeResult> {
    Json(comparison::merge_schemas(&req.profiles))
}

/// `POST /api/v1/profile/pooled-merge`: pooled aggregate stats across N
/// profiles, columns matched by name.
pub async fn pooled_merge(
    Json(req): Json<PooledMergeRequest>,
) -> Json<comparison::PooledMergeResult> {
    Json(comparison::pooled_merge(&req.profiles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SessionConfig as Cfg;

    #[tokio::test]
    async fn create_chunk_finalize_round_trip() {
        let state = Arc::new(AppState::default());
        let Json(created) = create_session(
            State(state.clone()),
            Json(CreateSessionRequest {
                config: Some(Cfg::default()),
                filename: Some("x.csv".into()),
            }),
        )
        .await
        .unwrap();

        upload_chunk(
            State(state.clone()),
            Path(created.session_id.clone()),
            Bytes::from_static(b"a\n1\n2\n3\n"),
        )
        .await
        .unwrap();

        let Json(profile) = finalize_session(State(state.clone()), Path(created.session_id))
            .await
            .unwrap();
        assert_eq!(profile.total_rows, 3);
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let state = Arc::new(AppState::default());
        let err = finalize_session(State(state), Path(Uuid::new_v4().to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::SessionNotFound));
    }
}
