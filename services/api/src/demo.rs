use chrono::{Duration, Utc};
use clap::Args;
use std::sync::Arc;
use tutor_leads::engine::{
    memory_stores, CloseReason, DemoCommand, DemoRequest, EngineConfig, LeadEngine,
    MatchingProfile, ParentId, PaymentConfirmation, RecordingEventPublisher, RequirementDetails,
    TeachingMode, TutorId,
};
use tutor_leads::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Lead credits granted to the funded tutor (defaults to 3)
    #[arg(long)]
    pub(crate) credits: Option<u32>,
    /// Skip the demo-session portion of the walkthrough
    #[arg(long)]
    pub(crate) skip_demo_session: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        credits,
        skip_demo_session,
    } = args;
    let credits = credits.unwrap_or(3);
    let now = Utc::now();

    let events = RecordingEventPublisher::default();
    let engine = LeadEngine::new(
        memory_stores(),
        Arc::new(events.clone()),
        EngineConfig::default(),
    );

    println!("Lead engine demo (in-memory stores)");

    let funded = TutorId("tutor-meera".to_string());
    engine.register_tutor(funded.clone(), online_math_profile(), now)?;
    engine.activate(&funded, confirmation("pay-1001"))?;
    engine.purchase_credits(&funded, credits, now)?;

    let broke = TutorId("tutor-arjun".to_string());
    engine.register_tutor(broke.clone(), online_math_profile(), now)?;
    engine.activate(&broke, confirmation("pay-1002"))?;

    let pending = TutorId("tutor-dev".to_string());
    engine.register_tutor(pending.clone(), offline_physics_profile(), now)?;

    println!("\nTutor roster");
    for tutor in [&funded, &broke, &pending] {
        let account = engine.tutor(tutor)?;
        let balance = engine.balance(tutor)?;
        println!(
            "- {} | {} | {} credit(s)",
            account.tutor_id,
            account.activation.label(),
            balance
        );
    }

    let requirement = engine.post_requirement(
        ParentId("parent-kapoor".to_string()),
        math_requirement(),
        now,
    )?;
    println!(
        "\nPosted requirement {} ({} | grade {} | {})",
        requirement.requirement_id,
        requirement.details.subjects.join(", "),
        requirement.details.grade_level,
        requirement.details.location
    );

    let outcome = engine.distribute(&requirement.requirement_id)?;
    println!("Distribution notified {} tutor(s):", outcome.notified.len());
    for tutor in &outcome.notified {
        println!("- {tutor}");
    }

    println!("\nConsumption");
    let unlock = engine.consume(&funded, &requirement.requirement_id, now)?;
    println!(
        "- {} unlocked the lead ({} -> balance {})",
        funded,
        unlock.exposure().ledger_entry_id,
        engine.balance(&funded)?
    );

    let replay = engine.consume(&funded, &requirement.requirement_id, now)?;
    println!(
        "- {} revisited the lead: charged again = {}, balance {}",
        funded,
        replay.newly_charged(),
        engine.balance(&funded)?
    );

    match engine.consume(&broke, &requirement.requirement_id, now) {
        Err(err) => println!("- {broke} was turned away: {err}"),
        Ok(_) => println!("- {broke} unexpectedly unlocked the lead"),
    }
    match engine.consume(&pending, &requirement.requirement_id, now) {
        Err(err) => println!("- {pending} was turned away: {err}"),
        Ok(_) => println!("- {pending} unexpectedly unlocked the lead"),
    }

    let view = engine.requirement_view(&requirement.requirement_id)?;
    println!(
        "\nRequirement {} is {} with {} applicant(s)",
        view.requirement_id, view.status, view.applicants_count
    );

    if !skip_demo_session {
        println!("\nDemo session");
        let session = engine.schedule_demo(
            &requirement.requirement_id,
            &funded,
            DemoRequest {
                student_name: "Asha".to_string(),
                subject: "Mathematics".to_string(),
            },
            now,
        )?;
        println!("- {} requested", session.demo_id);

        let session = engine.transition_demo(
            &session.demo_id,
            DemoCommand::Scheduled {
                scheduled_for: now + Duration::days(2),
                mode: TeachingMode::Online,
                duration_minutes: 45,
                fee: Some(200),
            },
            now,
        )?;
        println!(
            "- {} scheduled for {}",
            session.demo_id,
            session
                .scheduled_for
                .map(|slot| slot.to_rfc3339())
                .unwrap_or_default()
        );

        let session = engine.transition_demo(
            &session.demo_id,
            DemoCommand::Completed { confirmed: true },
            now,
        )?;
        println!("- {} {}", session.demo_id, session.status.label());
    }

    engine.close_requirement(&requirement.requirement_id, CloseReason::ParentSelection, now)?;
    match engine.consume(&broke, &requirement.requirement_id, now) {
        Err(err) => println!("\nAfter closure, {broke} was turned away: {err}"),
        Ok(_) => println!("\nAfter closure, {broke} unexpectedly unlocked the lead"),
    }

    println!("\nLedger for {funded}");
    for entry in engine.history(&funded)? {
        let reference = entry
            .requirement_ref
            .as_ref()
            .map(|id| format!(" ({id})"))
            .unwrap_or_default();
        println!(
            "- {} | {} {} | {}{}",
            entry.entry_id,
            entry.entry_type.label(),
            entry.amount,
            entry.reason.label(),
            reference
        );
    }

    println!("\nEvents emitted to the notification seam");
    for event in events.events() {
        println!("- {event:?}");
    }

    Ok(())
}

fn confirmation(reference: &str) -> PaymentConfirmation {
    PaymentConfirmation {
        reference: reference.to_string(),
    }
}

fn online_math_profile() -> MatchingProfile {
    MatchingProfile {
        subjects: vec!["Mathematics".to_string()],
        grade_levels: vec!["9".to_string(), "10".to_string()],
        boards: vec!["CBSE".to_string()],
        modes: vec![TeachingMode::Online],
        service_areas: Vec::new(),
        availability: vec!["weekday evenings".to_string()],
    }
}

fn offline_physics_profile() -> MatchingProfile {
    MatchingProfile {
        subjects: vec!["Physics".to_string()],
        grade_levels: vec!["11".to_string(), "12".to_string()],
        boards: vec!["ICSE".to_string()],
        modes: vec![TeachingMode::Offline],
        service_areas: vec!["Pune".to_string()],
        availability: Vec::new(),
    }
}

fn math_requirement() -> RequirementDetails {
    RequirementDetails {
        subjects: vec!["Mathematics".to_string()],
        grade_level: "10".to_string(),
        board: "CBSE".to_string(),
        modes: vec![TeachingMode::Online],
        location: "Pune".to_string(),
        schedule_preferences: vec!["weekends".to_string()],
    }
}
