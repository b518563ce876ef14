use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::activation::PaymentConfirmation;
use super::demo::{DemoCommand, DemoRequest};
use super::domain::{
    CloseReason, DemoId, MatchingProfile, ParentId, RequirementDetails, RequirementId, TutorId,
};
use super::error::EngineError;
use super::service::LeadEngine;

/// Router builder exposing the engine's operations. Handlers stamp the
/// current instant; the engine itself never reads the clock.
pub fn lead_router(engine: Arc<LeadEngine>) -> Router {
    Router::new()
        .route("/api/v1/tutors", post(register_tutor))
        .route(
            "/api/v1/tutors/:tutor_id/activation",
            post(activate_tutor).delete(deactivate_tutor),
        )
        .route("/api/v1/tutors/:tutor_id/profile", put(update_profile))
        .route("/api/v1/tutors/:tutor_id/credits", post(purchase_credits))
        .route("/api/v1/tutors/:tutor_id/balance", get(balance))
        .route("/api/v1/tutors/:tutor_id/ledger", get(ledger_history))
        .route("/api/v1/requirements", post(post_requirement))
        .route("/api/v1/requirements/:requirement_id", get(requirement_status))
        .route(
            "/api/v1/requirements/:requirement_id/distribution",
            post(distribute),
        )
        .route(
            "/api/v1/requirements/:requirement_id/consumption",
            post(consume),
        )
        .route(
            "/api/v1/requirements/:requirement_id/closure",
            post(close_requirement),
        )
        .route("/api/v1/demos", post(schedule_demo))
        .route("/api/v1/demos/:demo_id", get(demo_status))
        .route("/api/v1/demos/:demo_id/transition", post(transition_demo))
        .with_state(engine)
}

pub(crate) fn status_for(error: &EngineError) -> StatusCode {
    match error {
        EngineError::InsufficientCredit { .. } => StatusCode::PAYMENT_REQUIRED,
        EngineError::NotEligible { .. } => StatusCode::FORBIDDEN,
        EngineError::RequirementClosed { .. } => StatusCode::GONE,
        EngineError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::AlreadyRegistered { .. } => StatusCode::CONFLICT,
        EngineError::InvalidAmount => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_response(error: EngineError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (status_for(&error), Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
struct RegisterTutorRequest {
    tutor_id: String,
    profile: MatchingProfile,
}

async fn register_tutor(
    State(engine): State<Arc<LeadEngine>>,
    Json(request): Json<RegisterTutorRequest>,
) -> Response {
    let RegisterTutorRequest { tutor_id, profile } = request;
    match engine.register_tutor(TutorId(tutor_id), profile, Utc::now()) {
        Ok(account) => (StatusCode::CREATED, Json(account)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct ActivationRequest {
    payment_reference: String,
}

async fn activate_tutor(
    State(engine): State<Arc<LeadEngine>>,
    Path(tutor_id): Path<String>,
    Json(request): Json<ActivationRequest>,
) -> Response {
    let confirmation = PaymentConfirmation {
        reference: request.payment_reference,
    };
    match engine.activate(&TutorId(tutor_id), confirmation) {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn deactivate_tutor(
    State(engine): State<Arc<LeadEngine>>,
    Path(tutor_id): Path<String>,
) -> Response {
    match engine.deactivate(&TutorId(tutor_id)) {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn update_profile(
    State(engine): State<Arc<LeadEngine>>,
    Path(tutor_id): Path<String>,
    Json(profile): Json<MatchingProfile>,
) -> Response {
    match engine.update_profile(&TutorId(tutor_id), profile) {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct PurchaseRequest {
    amount: u32,
}

async fn purchase_credits(
    State(engine): State<Arc<LeadEngine>>,
    Path(tutor_id): Path<String>,
    Json(request): Json<PurchaseRequest>,
) -> Response {
    match engine.purchase_credits(&TutorId(tutor_id), request.amount, Utc::now()) {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn balance(State(engine): State<Arc<LeadEngine>>, Path(tutor_id): Path<String>) -> Response {
    let tutor_id = TutorId(tutor_id);
    match engine.balance(&tutor_id) {
        Ok(balance) => (
            StatusCode::OK,
            Json(json!({ "tutor_id": tutor_id.0, "balance": balance })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

async fn ledger_history(
    State(engine): State<Arc<LeadEngine>>,
    Path(tutor_id): Path<String>,
) -> Response {
    match engine.history(&TutorId(tutor_id)) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct PostRequirementRequest {
    parent_id: String,
    details: RequirementDetails,
}

async fn post_requirement(
    State(engine): State<Arc<LeadEngine>>,
    Json(request): Json<PostRequirementRequest>,
) -> Response {
    let PostRequirementRequest { parent_id, details } = request;
    match engine.post_requirement(ParentId(parent_id), details, Utc::now()) {
        Ok(requirement) => (StatusCode::CREATED, Json(requirement)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn requirement_status(
    State(engine): State<Arc<LeadEngine>>,
    Path(requirement_id): Path<String>,
) -> Response {
    match engine.requirement_view(&RequirementId(requirement_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn distribute(
    State(engine): State<Arc<LeadEngine>>,
    Path(requirement_id): Path<String>,
) -> Response {
    match engine.distribute(&RequirementId(requirement_id)) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct ConsumeRequest {
    tutor_id: String,
}

async fn consume(
    State(engine): State<Arc<LeadEngine>>,
    Path(requirement_id): Path<String>,
    Json(request): Json<ConsumeRequest>,
) -> Response {
    let tutor_id = TutorId(request.tutor_id);
    match engine.consume(&tutor_id, &RequirementId(requirement_id), Utc::now()) {
        Ok(outcome) => {
            let status = if outcome.newly_charged() {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(outcome)).into_response()
        }
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct CloseRequest {
    reason: CloseReason,
}

async fn close_requirement(
    State(engine): State<Arc<LeadEngine>>,
    Path(requirement_id): Path<String>,
    Json(request): Json<CloseRequest>,
) -> Response {
    match engine.close_requirement(&RequirementId(requirement_id), request.reason, Utc::now()) {
        Ok(requirement) => (StatusCode::OK, Json(requirement)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct ScheduleDemoRequest {
    requirement_id: String,
    tutor_id: String,
    student_name: String,
    subject: String,
}

async fn schedule_demo(
    State(engine): State<Arc<LeadEngine>>,
    Json(request): Json<ScheduleDemoRequest>,
) -> Response {
    let ScheduleDemoRequest {
        requirement_id,
        tutor_id,
        student_name,
        subject,
    } = request;
    let demo_request = DemoRequest {
        student_name,
        subject,
    };
    match engine.schedule_demo(
        &RequirementId(requirement_id),
        &TutorId(tutor_id),
        demo_request,
        Utc::now(),
    ) {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn demo_status(
    State(engine): State<Arc<LeadEngine>>,
    Path(demo_id): Path<String>,
) -> Response {
    match engine.demo(&DemoId(demo_id)) {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn transition_demo(
    State(engine): State<Arc<LeadEngine>>,
    Path(demo_id): Path<String>,
    Json(command): Json<DemoCommand>,
) -> Response {
    match engine.transition_demo(&DemoId(demo_id), command, Utc::now()) {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(error) => error_response(error),
    }
}
