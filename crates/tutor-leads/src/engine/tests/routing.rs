use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::{build_engine, now, online_math_profile};
use crate::engine::lead_router;
use crate::engine::{CloseReason, LeadEngine, TeachingMode};
use std::sync::Arc;

fn build_router() -> (Router, Arc<LeadEngine>) {
    let (engine, _) = build_engine();
    (lead_router(engine.clone()), engine)
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let request = match body {
        Some(payload) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&payload).expect("serialize payload"),
            ))
            .expect("request"),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request"),
    };

    router
        .clone()
        .oneshot(request)
        .await
        .expect("router dispatch")
}

async fn read_json_body(response: Response) -> Value {
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn profile_payload() -> Value {
    serde_json::to_value(online_math_profile()).expect("profile serializes")
}

fn requirement_payload() -> Value {
    json!({
        "parent_id": "parent-001",
        "details": {
            "subjects": ["Mathematics"],
            "grade_level": "10",
            "board": "CBSE",
            "modes": [TeachingMode::Online],
            "location": "Pune",
            "schedule_preferences": ["weekends"],
        },
    })
}

async fn register_and_fund(router: &Router, tutor_id: &str, credits: u32) {
    let response = send(
        router,
        "POST",
        "/api/v1/tutors",
        Some(json!({ "tutor_id": tutor_id, "profile": profile_payload() })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        router,
        "POST",
        &format!("/api/v1/tutors/{tutor_id}/activation"),
        Some(json!({ "payment_reference": "pay-0001" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    if credits > 0 {
        let response = send(
            router,
            "POST",
            &format!("/api/v1/tutors/{tutor_id}/credits"),
            Some(json!({ "amount": credits })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}

async fn post_requirement_over_http(router: &Router) -> String {
    let response = send(router, "POST", "/api/v1/requirements", Some(requirement_payload())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    body.get("requirement_id")
        .and_then(Value::as_str)
        .expect("requirement id")
        .to_string()
}

#[tokio::test]
async fn full_funnel_flows_through_the_router() {
    let (router, _) = build_router();
    register_and_fund(&router, "tutor-http", 3).await;
    let requirement_id = post_requirement_over_http(&router).await;

    let response = send(
        &router,
        "POST",
        &format!("/api/v1/requirements/{requirement_id}/distribution"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body.get("notified"), Some(&json!(["tutor-http"])));

    let response = send(
        &router,
        "POST",
        &format!("/api/v1/requirements/{requirement_id}/consumption"),
        Some(json!({ "tutor_id": "tutor-http" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body.get("outcome"), Some(&json!("charged")));

    let response = send(
        &router,
        "GET",
        &format!("/api/v1/requirements/{requirement_id}"),
        None,
    )
    .await;
    let body = read_json_body(response).await;
    assert_eq!(body.get("status"), Some(&json!("matched")));
    assert_eq!(body.get("applicants_count"), Some(&json!(1)));

    let response = send(&router, "GET", "/api/v1/tutors/tutor-http/balance", None).await;
    let body = read_json_body(response).await;
    assert_eq!(body.get("balance"), Some(&json!(2)));
}

#[tokio::test]
async fn replayed_consumption_returns_the_original_exposure() {
    let (router, _) = build_router();
    register_and_fund(&router, "tutor-replay", 3).await;
    let requirement_id = post_requirement_over_http(&router).await;
    let uri = format!("/api/v1/requirements/{requirement_id}/consumption");
    let payload = json!({ "tutor_id": "tutor-replay" });

    let first = send(&router, "POST", &uri, Some(payload.clone())).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = send(&router, "POST", &uri, Some(payload)).await;
    assert_eq!(second.status(), StatusCode::OK);
    let body = read_json_body(second).await;
    assert_eq!(body.get("outcome"), Some(&json!("already_unlocked")));

    let response = send(&router, "GET", "/api/v1/tutors/tutor-replay/balance", None).await;
    let body = read_json_body(response).await;
    assert_eq!(body.get("balance"), Some(&json!(2)));
}

#[tokio::test]
async fn insufficient_credit_maps_to_payment_required() {
    let (router, _) = build_router();
    register_and_fund(&router, "tutor-broke", 0).await;
    let requirement_id = post_requirement_over_http(&router).await;

    let response = send(
        &router,
        "POST",
        &format!("/api/v1/requirements/{requirement_id}/consumption"),
        Some(json!({ "tutor_id": "tutor-broke" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = read_json_body(response).await;
    assert!(body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .contains("insufficient"));
}

#[tokio::test]
async fn closed_requirement_maps_to_gone() {
    let (router, engine) = build_router();
    register_and_fund(&router, "tutor-late", 5).await;
    let requirement_id = post_requirement_over_http(&router).await;
    engine
        .close_requirement(
            &crate::engine::RequirementId(requirement_id.clone()),
            CloseReason::Administrative,
            now(),
        )
        .expect("close");

    let response = send(
        &router,
        "POST",
        &format!("/api/v1/requirements/{requirement_id}/consumption"),
        Some(json!({ "tutor_id": "tutor-late" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::GONE);
}

#[tokio::test]
async fn double_closure_maps_to_conflict() {
    let (router, _) = build_router();
    let requirement_id = post_requirement_over_http(&router).await;
    let uri = format!("/api/v1/requirements/{requirement_id}/closure");
    let payload = json!({ "reason": "administrative" });

    let first = send(&router, "POST", &uri, Some(payload.clone())).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = send(&router, "POST", &uri, Some(payload)).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_tutor_balance_maps_to_not_found() {
    let (router, _) = build_router();
    let response = send(&router, "GET", "/api/v1/tutors/ghost/balance", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn demo_flow_over_http() {
    let (router, engine) = build_router();
    register_and_fund(&router, "tutor-demo", 1).await;
    let requirement_id = post_requirement_over_http(&router).await;
    engine
        .consume(
            &crate::engine::TutorId("tutor-demo".to_string()),
            &crate::engine::RequirementId(requirement_id.clone()),
            now(),
        )
        .expect("consume");

    let response = send(
        &router,
        "POST",
        "/api/v1/demos",
        Some(json!({
            "requirement_id": requirement_id,
            "tutor_id": "tutor-demo",
            "student_name": "Asha",
            "subject": "Mathematics",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    let demo_id = body
        .get("demo_id")
        .and_then(Value::as_str)
        .expect("demo id")
        .to_string();

    let response = send(
        &router,
        "POST",
        &format!("/api/v1/demos/{demo_id}/transition"),
        Some(json!({
            "target": "scheduled",
            "scheduled_for": "2026-03-20T10:00:00Z",
            "mode": "online",
            "duration_minutes": 45,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body.get("status"), Some(&json!("scheduled")));
}
