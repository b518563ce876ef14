use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::engine::memory::{memory_stores, RecordingEventPublisher};
use crate::engine::{
    EngineConfig, LeadEngine, MatchingProfile, ParentId, PaymentConfirmation, RequirementDetails,
    RequirementId, TeachingMode, TutorId,
};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn build_engine() -> (Arc<LeadEngine>, RecordingEventPublisher) {
    build_engine_with_config(EngineConfig::default())
}

pub(super) fn build_engine_with_config(
    config: EngineConfig,
) -> (Arc<LeadEngine>, RecordingEventPublisher) {
    let events = RecordingEventPublisher::default();
    let engine = LeadEngine::new(memory_stores(), Arc::new(events.clone()), config);
    (Arc::new(engine), events)
}

pub(super) fn confirmation() -> PaymentConfirmation {
    PaymentConfirmation {
        reference: "pay-0001".to_string(),
    }
}

pub(super) fn online_math_profile() -> MatchingProfile {
    MatchingProfile {
        subjects: vec!["Mathematics".to_string()],
        grade_levels: vec!["9".to_string(), "10".to_string()],
        boards: vec!["CBSE".to_string()],
        modes: vec![TeachingMode::Online],
        service_areas: Vec::new(),
        availability: vec!["weekday evenings".to_string()],
    }
}

pub(super) fn offline_physics_profile() -> MatchingProfile {
    MatchingProfile {
        subjects: vec!["Physics".to_string()],
        grade_levels: vec!["11".to_string(), "12".to_string()],
        boards: vec!["ICSE".to_string()],
        modes: vec![TeachingMode::Offline],
        service_areas: vec!["Pune".to_string()],
        availability: Vec::new(),
    }
}

pub(super) fn math_requirement() -> RequirementDetails {
    RequirementDetails {
        subjects: vec!["Mathematics".to_string()],
        grade_level: "10".to_string(),
        board: "CBSE".to_string(),
        modes: vec![TeachingMode::Online],
        location: "Pune".to_string(),
        schedule_preferences: vec!["weekends".to_string()],
    }
}

/// Register, activate, and optionally fund a tutor in one step.
pub(super) fn active_tutor(
    engine: &LeadEngine,
    id: &str,
    profile: MatchingProfile,
    credits: u32,
) -> TutorId {
    let tutor = TutorId(id.to_string());
    engine
        .register_tutor(tutor.clone(), profile, now())
        .expect("tutor registers");
    engine
        .activate(&tutor, confirmation())
        .expect("tutor activates");
    if credits > 0 {
        engine
            .purchase_credits(&tutor, credits, now())
            .expect("credits purchased");
    }
    tutor
}

pub(super) fn post_requirement(engine: &LeadEngine) -> RequirementId {
    engine
        .post_requirement(ParentId("parent-001".to_string()), math_requirement(), now())
        .expect("requirement posts")
        .requirement_id
}
