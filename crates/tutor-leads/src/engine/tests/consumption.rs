use super::common::{
    active_tutor, build_engine, confirmation, now, online_math_profile, post_requirement,
};
use crate::engine::{
    CloseReason, EngineError, EntryType, RequirementId, TutorId,
};

#[test]
fn consume_with_zero_balance_is_rejected_without_side_effects() {
    let (engine, _) = build_engine();
    let tutor = active_tutor(&engine, "tutor-a", online_math_profile(), 0);
    let requirement = post_requirement(&engine);

    match engine.consume(&tutor, &requirement, now()) {
        Err(EngineError::InsufficientCredit { balance, .. }) => assert_eq!(balance, 0),
        other => panic!("expected insufficient credit, got {other:?}"),
    }

    assert_eq!(engine.balance(&tutor).expect("balance"), 0);
    let view = engine.requirement_view(&requirement).expect("view");
    assert_eq!(view.applicants_count, 0);
    assert_eq!(view.status, "open");
}

#[test]
fn successful_consume_debits_once_and_promotes_the_requirement() {
    let (engine, _) = build_engine();
    let tutor = active_tutor(&engine, "tutor-a", online_math_profile(), 3);
    let requirement = post_requirement(&engine);

    let outcome = engine.consume(&tutor, &requirement, now()).expect("consume");
    assert!(outcome.newly_charged());
    assert_eq!(outcome.exposure().tutor_id, tutor);
    assert_eq!(outcome.exposure().requirement_id, requirement);

    assert_eq!(engine.balance(&tutor).expect("balance"), 2);
    let view = engine.requirement_view(&requirement).expect("view");
    assert_eq!(view.applicants_count, 1);
    assert_eq!(view.status, "matched");
}

#[test]
fn consume_is_idempotent_per_tutor_and_requirement() {
    let (engine, _) = build_engine();
    let tutor = active_tutor(&engine, "tutor-a", online_math_profile(), 3);
    let requirement = post_requirement(&engine);

    let first = engine.consume(&tutor, &requirement, now()).expect("consume");
    let second = engine.consume(&tutor, &requirement, now()).expect("replay");

    assert!(first.newly_charged());
    assert!(!second.newly_charged());
    assert_eq!(first.exposure(), second.exposure());

    // Exactly one debit and one exposure.
    assert_eq!(engine.balance(&tutor).expect("balance"), 2);
    let debits = engine
        .history(&tutor)
        .expect("history")
        .into_iter()
        .filter(|entry| entry.entry_type == EntryType::Debit)
        .count();
    assert_eq!(debits, 1);
    let view = engine.requirement_view(&requirement).expect("view");
    assert_eq!(view.applicants_count, 1);
}

#[test]
fn consume_against_a_closed_requirement_is_rejected() {
    let (engine, _) = build_engine();
    let tutor = active_tutor(&engine, "tutor-a", online_math_profile(), 5);
    let requirement = post_requirement(&engine);
    engine
        .close_requirement(&requirement, CloseReason::Administrative, now())
        .expect("close");

    assert!(matches!(
        engine.consume(&tutor, &requirement, now()),
        Err(EngineError::RequirementClosed { .. })
    ));
    assert_eq!(engine.balance(&tutor).expect("balance"), 5);
}

#[test]
fn pending_tutor_is_not_eligible() {
    let (engine, _) = build_engine();
    let tutor = TutorId("tutor-pending".to_string());
    engine
        .register_tutor(tutor.clone(), online_math_profile(), now())
        .expect("register");
    let requirement = post_requirement(&engine);

    assert!(matches!(
        engine.consume(&tutor, &requirement, now()),
        Err(EngineError::NotEligible { .. })
    ));
}

#[test]
fn deactivated_tutor_is_not_eligible() {
    let (engine, _) = build_engine();
    let tutor = active_tutor(&engine, "tutor-a", online_math_profile(), 3);
    engine.deactivate(&tutor).expect("deactivate");
    let requirement = post_requirement(&engine);

    assert!(matches!(
        engine.consume(&tutor, &requirement, now()),
        Err(EngineError::NotEligible { .. })
    ));
    // The history survives deactivation.
    assert_eq!(engine.history(&tutor).expect("history").len(), 1);
}

#[test]
fn unknown_tutor_is_not_eligible() {
    let (engine, _) = build_engine();
    let requirement = post_requirement(&engine);

    assert!(matches!(
        engine.consume(&TutorId("ghost".to_string()), &requirement, now()),
        Err(EngineError::NotEligible { .. })
    ));
}

#[test]
fn unknown_requirement_is_not_found() {
    let (engine, _) = build_engine();
    let tutor = active_tutor(&engine, "tutor-a", online_math_profile(), 3);

    assert!(matches!(
        engine.consume(&tutor, &RequirementId("req-missing".to_string()), now()),
        Err(EngineError::NotFound { .. })
    ));
}

#[test]
fn reactivation_of_a_deactivated_tutor_is_rejected() {
    let (engine, _) = build_engine();
    let tutor = active_tutor(&engine, "tutor-a", online_math_profile(), 0);
    engine.deactivate(&tutor).expect("deactivate");

    assert!(matches!(
        engine.activate(&tutor, confirmation()),
        Err(EngineError::InvalidStateTransition { .. })
    ));
}

#[test]
fn registering_the_same_tutor_twice_is_rejected() {
    let (engine, _) = build_engine();
    let tutor = TutorId("tutor-a".to_string());
    engine
        .register_tutor(tutor.clone(), online_math_profile(), now())
        .expect("register");

    assert!(matches!(
        engine.register_tutor(tutor, online_math_profile(), now()),
        Err(EngineError::AlreadyRegistered { .. })
    ));
}

#[test]
fn administrative_grants_top_up_the_balance() {
    let (engine, _) = build_engine();
    let tutor = active_tutor(&engine, "tutor-a", online_math_profile(), 1);

    engine.grant_credits(&tutor, 2, now()).expect("grant");

    assert_eq!(engine.balance(&tutor).expect("balance"), 3);
    let history = engine.history(&tutor).expect("history");
    assert_eq!(history.last().expect("entry").reason.label(), "admin_adjustment");
}

#[test]
fn activating_an_active_tutor_is_a_no_op_success() {
    let (engine, events) = build_engine();
    let tutor = active_tutor(&engine, "tutor-a", online_math_profile(), 0);

    let account = engine.activate(&tutor, confirmation()).expect("replay");
    assert_eq!(account.activation.label(), "active");

    // Only the first activation emitted an event.
    let activations = events
        .events()
        .into_iter()
        .filter(|event| matches!(event, crate::engine::EngineEvent::TutorActivated { .. }))
        .count();
    assert_eq!(activations, 1);
}
