use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use stats_rs::{build_app, state::AppState};

fn make_app() -> axum::Router {
    build_app(Arc::new(AppState::default()))
}

async fn body_json(res: axum::response::Response) -> Value {
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_ok() {
    let app = make_app().into_service();

    let res = app
        .oneshot(Request::get("/api/v1/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn openapi_json_exists() {
    let app = make_app();

    let res = app
        .oneshot(Request::get("/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let v = body_json(res).await;
    assert_eq!(v["openapi"], "3.0.3");
    assert!(v["paths"]["/api/v1/profile/sessions"].is_object());
}

#[derive(Deserialize)]
struct CreateSessionResponse {
    session_id: String,
}

#[derive(Deserialize)]
struct ChunkAck {
    bytes_received: u64,
}

/// Full session lifecycle over HTTP: create -> upload -> finalize, mirroring
/// the literal E1 scenario (numeric column with a blank-line null).
#[tokio::test]
async fn profile_session_lifecycle_e1() {
    let app = make_app();

    let create_res = app
        .clone()
        .oneshot(
            Request::post("/api/v1/profile/sessions")
                .header("content-type", "application/json")
                .body(Body::from(json!({"filename": "prices.csv"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create_res.status(), StatusCode::OK);
    let created: CreateSessionResponse = serde_json::from_value(body_json(create_res).await).unwrap();

    let chunk_res = app
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/profile/sessions/{}/chunks", created.session_id))
                .header("content-type", "application/octet-stream")
                .body(Body::from("price\n10\n20\n\n30\n40\n"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(chunk_res.status(), StatusCode::OK);
    let ack: ChunkAck = serde_json::from_value(body_json(chunk_res).await).unwrap();
    assert!(ack.bytes_received > 0);

    let finalize_res = app
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/profile/sessions/{}/finalize", created.session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(finalize_res.status(), StatusCode::OK);
    let profile = body_json(finalize_res).await;
    let price = &profile["column_profiles"][0];
    assert_eq!(price["base_stats"]["count"], 4);
    assert_eq!(price["base_stats"]["missing"], 1);
    assert!((price["numeric_stats"]["mean"].as_f64().unwrap() - 25.0).abs() < 1e-9);
}

#[tokio::test]
async fn profile_finalize_unknown_session_is_404() {
    let app = make_app();

    let res = app
        .oneshot(
            Request::post("/api/v1/profile/sessions/00000000-0000-0000-0000-000000000000/finalize")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_cancel_then_finalize_is_404() {
    let app = make_app();

    let created: CreateSessionResponse = serde_json::from_value(
        body_json(
            app.clone()
                .oneshot(
                    Request::post("/api/v1/profile/sessions")
                        .header("content-type", "application/json")
                        .body(Body::from("{}"))
                        .unwrap(),
                )
                .await
                .unwrap(),
        )
        .await,
    )
    .unwrap();

    let cancel_res = app
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/profile/sessions/{}/cancel", created.session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(cancel_res.status(), StatusCode::NO_CONTENT);

    let finalize_res = app
        .oneshot(
            Request::post(format!("/api/v1/profile/sessions/{}/finalize", created.session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(finalize_res.status(), StatusCode::NOT_FOUND);
}

/// E5 over HTTP: pairwise diff between two finalized profiles.
#[tokio::test]
async fn profile_compare_e5_over_http() {
    async fn finalize(app: &axum::Router, csv: &'static str) -> Value {
        let created: CreateSessionResponse = serde_json::from_value(
            body_json(
                app.clone()
                    .oneshot(
                        Request::post("/api/v1/profile/sessions")
                            .header("content-type", "application/json")
                            .body(Body::from("{}"))
                            .unwrap(),
                    )
                    .await
                    .unwrap(),
            )
            .await,
        )
        .unwrap();
        app.clone()
            .oneshot(
                Request::post(format!("/api/v1/profile/sessions/{}/chunks", created.session_id))
                    .body(Body::from(csv))
                    .unwrap(),
            )
            .await
            .unwrap();
        body_json(
            app.clone()
                .oneshot(
                    Request::post(format!("/api/v1/profile/sessions/{}/finalize", created.session_id))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap(),
        )
        .await
    }

    let app = make_app();
    let baseline = finalize(&app, "a,b\n1,2.5\n2,3.5\n3,4.5\n").await;
    let candidate = finalize(&app, "a,c\n1,x\n2,y\n3,z\n").await;

    let res = app
        .oneshot(
            Request::post("/api/v1/profile/compare")
                .header("content-type", "application/json")
                .body(Body::from(json!({"baseline": baseline, "candidate": candidate}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let result = body_json(res).await;
    let diffs = result["diffs"].as_array().unwrap();
    let positions: Vec<&str> = diffs.iter().map(|d| d["name"].as_str().unwrap()).collect();
    assert_eq!(positions, vec!["b", "c", "a"]);
}
