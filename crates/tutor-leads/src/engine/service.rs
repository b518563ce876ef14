use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::activation::{ActivationGate, PaymentConfirmation};
use super::config::EngineConfig;
use super::consumption::{ConsumeOutcome, ConsumptionGate};
use super::demo::{DemoCommand, DemoRequest, DemoScheduler};
use super::distribution::{DistributionEngine, DistributionOutcome};
use super::domain::{
    CloseReason, DemoId, DemoSession, MatchingProfile, ParentId, RequirementDetails, RequirementId,
    TuitionRequirement, TutorAccount, TutorId,
};
use super::error::EngineError;
use super::events::EventPublisher;
use super::ledger::{EntryReason, LedgerEntry, LedgerStore, TutorLocks};
use super::lifecycle::RequirementLifecycle;
use super::repository::{
    DemoRepository, ExposureRepository, LedgerRepository, RequirementRepository, TutorRepository,
};

/// The storage seams the engine needs, bundled to keep wiring readable.
#[derive(Clone)]
pub struct EngineStores {
    pub tutors: Arc<dyn TutorRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub exposures: Arc<dyn ExposureRepository>,
    pub requirements: Arc<dyn RequirementRepository>,
    pub demos: Arc<dyn DemoRepository>,
}

/// Snapshot of a requirement exposed to parents and dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct RequirementView {
    pub requirement_id: RequirementId,
    pub status: &'static str,
    pub applicants_count: u32,
    pub notified_count: usize,
    pub posted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<&'static str>,
}

/// Facade composing the activation gate, ledger store, distribution engine,
/// consumption gate, and the requirement and demo state machines. Stateless
/// per call; everything durable lives behind the storage seams.
pub struct LeadEngine {
    tutors: Arc<dyn TutorRepository>,
    ledger: Arc<LedgerStore>,
    activation: Arc<ActivationGate>,
    distribution: DistributionEngine,
    consumption: ConsumptionGate,
    lifecycle: Arc<RequirementLifecycle>,
    demos: DemoScheduler,
}

impl LeadEngine {
    pub fn new(
        stores: EngineStores,
        events: Arc<dyn EventPublisher>,
        config: EngineConfig,
    ) -> Self {
        let locks = Arc::new(TutorLocks::default());
        let ledger = Arc::new(LedgerStore::new(stores.ledger.clone(), locks));
        let activation = Arc::new(ActivationGate::new(stores.tutors.clone(), events.clone()));
        let lifecycle = Arc::new(RequirementLifecycle::new(
            stores.requirements.clone(),
            stores.exposures.clone(),
            events.clone(),
            config,
        ));
        let distribution = DistributionEngine::new(
            stores.tutors.clone(),
            stores.requirements.clone(),
            stores.exposures.clone(),
            events.clone(),
        );
        let consumption = ConsumptionGate::new(
            stores.requirements.clone(),
            stores.exposures.clone(),
            ledger.clone(),
            activation.clone(),
            lifecycle.clone(),
        );
        let demos = DemoScheduler::new(
            stores.demos.clone(),
            stores.requirements.clone(),
            stores.exposures.clone(),
            events,
        );

        Self {
            tutors: stores.tutors,
            ledger,
            activation,
            distribution,
            consumption,
            lifecycle,
            demos,
        }
    }

    // Tutor accounts and activation.

    pub fn register_tutor(
        &self,
        tutor_id: TutorId,
        profile: MatchingProfile,
        at: DateTime<Utc>,
    ) -> Result<TutorAccount, EngineError> {
        self.activation.register(tutor_id, profile, at)
    }

    pub fn activate(
        &self,
        tutor: &TutorId,
        confirmation: PaymentConfirmation,
    ) -> Result<TutorAccount, EngineError> {
        self.activation.activate(tutor, confirmation)
    }

    pub fn deactivate(&self, tutor: &TutorId) -> Result<TutorAccount, EngineError> {
        self.activation.deactivate(tutor)
    }

    pub fn tutor(&self, tutor: &TutorId) -> Result<TutorAccount, EngineError> {
        self.tutors
            .fetch(tutor)?
            .ok_or_else(|| EngineError::not_found("tutor", tutor))
    }

    /// Replace a tutor's matching profile. Takes effect on the next
    /// distribution run; already-notified requirements are unaffected.
    pub fn update_profile(
        &self,
        tutor: &TutorId,
        profile: MatchingProfile,
    ) -> Result<TutorAccount, EngineError> {
        let mut account = self.tutor(tutor)?;
        account.profile = profile;
        self.tutors.update(account.clone())?;
        Ok(account)
    }

    // Credits.

    /// Called by the payment collaborator after an out-of-band lead-pack
    /// purchase is confirmed.
    pub fn purchase_credits(
        &self,
        tutor: &TutorId,
        amount: u32,
        at: DateTime<Utc>,
    ) -> Result<LedgerEntry, EngineError> {
        self.tutor(tutor)?;
        self.ledger.credit(tutor, amount, EntryReason::Purchase, at)
    }

    /// Administrative credit grant (goodwill, support corrections).
    pub fn grant_credits(
        &self,
        tutor: &TutorId,
        amount: u32,
        at: DateTime<Utc>,
    ) -> Result<LedgerEntry, EngineError> {
        self.tutor(tutor)?;
        self.ledger
            .credit(tutor, amount, EntryReason::AdminAdjustment, at)
    }

    pub fn balance(&self, tutor: &TutorId) -> Result<i64, EngineError> {
        self.tutor(tutor)?;
        self.ledger.balance(tutor)
    }

    pub fn history(&self, tutor: &TutorId) -> Result<Vec<LedgerEntry>, EngineError> {
        self.tutor(tutor)?;
        self.ledger.history(tutor)
    }

    // Requirements.

    pub fn post_requirement(
        &self,
        parent_id: ParentId,
        details: RequirementDetails,
        posted_at: DateTime<Utc>,
    ) -> Result<TuitionRequirement, EngineError> {
        self.lifecycle.post(parent_id, details, posted_at)
    }

    pub fn distribute(
        &self,
        requirement_id: &RequirementId,
    ) -> Result<DistributionOutcome, EngineError> {
        self.distribution.distribute(requirement_id)
    }

    pub fn consume(
        &self,
        tutor: &TutorId,
        requirement_id: &RequirementId,
        at: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, EngineError> {
        self.consumption.consume(tutor, requirement_id, at)
    }

    pub fn close_requirement(
        &self,
        requirement_id: &RequirementId,
        reason: CloseReason,
        at: DateTime<Utc>,
    ) -> Result<TuitionRequirement, EngineError> {
        self.lifecycle.close(requirement_id, reason, at)
    }

    pub fn close_expired(&self, now: DateTime<Utc>) -> Result<Vec<RequirementId>, EngineError> {
        self.lifecycle.close_expired(now)
    }

    pub fn requirement_view(
        &self,
        requirement_id: &RequirementId,
    ) -> Result<RequirementView, EngineError> {
        let requirement = self.lifecycle.fetch(requirement_id)?;
        let applicants_count = self.lifecycle.applicants(requirement_id)?;
        Ok(RequirementView {
            requirement_id: requirement.requirement_id,
            status: requirement.status.label(),
            applicants_count,
            notified_count: requirement.notified.len(),
            posted_at: requirement.posted_at,
            close_reason: requirement.closed.map(|closure| closure.reason.label()),
        })
    }

    // Demo sessions.

    pub fn schedule_demo(
        &self,
        requirement_id: &RequirementId,
        tutor: &TutorId,
        request: DemoRequest,
        at: DateTime<Utc>,
    ) -> Result<DemoSession, EngineError> {
        self.demos.schedule(requirement_id, tutor, request, at)
    }

    pub fn transition_demo(
        &self,
        demo_id: &DemoId,
        command: DemoCommand,
        at: DateTime<Utc>,
    ) -> Result<DemoSession, EngineError> {
        self.demos.transition(demo_id, command, at)
    }

    pub fn demo(&self, demo_id: &DemoId) -> Result<DemoSession, EngineError> {
        self.demos.fetch(demo_id)
    }
}
