use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::activation::ActivationGate;
use super::domain::{LeadExposure, RequirementId, TutorId};
use super::error::EngineError;
use super::ledger::{EntryReason, LedgerStore};
use super::lifecycle::RequirementLifecycle;
use super::repository::{ExposureRepository, RepositoryError, RequirementRepository};

/// Result of a consume call. An idempotent replay is a success, not a fault.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConsumeOutcome {
    /// One credit was debited and a fresh exposure recorded.
    Charged(LeadExposure),
    /// The tutor had already unlocked this requirement; nothing was charged.
    AlreadyUnlocked(LeadExposure),
}

impl ConsumeOutcome {
    pub fn exposure(&self) -> &LeadExposure {
        match self {
            ConsumeOutcome::Charged(exposure) | ConsumeOutcome::AlreadyUnlocked(exposure) => {
                exposure
            }
        }
    }

    pub const fn newly_charged(&self) -> bool {
        matches!(self, ConsumeOutcome::Charged(_))
    }
}

/// Intercepts a tutor's attempt to unlock a requirement's contact details:
/// verifies the requirement is still open, the tutor is activated, the pair
/// has not been charged before, then debits one credit and records the
/// exposure — all inside the tutor's ledger critical section.
pub struct ConsumptionGate {
    requirements: Arc<dyn RequirementRepository>,
    exposures: Arc<dyn ExposureRepository>,
    ledger: Arc<LedgerStore>,
    activation: Arc<ActivationGate>,
    lifecycle: Arc<RequirementLifecycle>,
}

impl ConsumptionGate {
    pub fn new(
        requirements: Arc<dyn RequirementRepository>,
        exposures: Arc<dyn ExposureRepository>,
        ledger: Arc<LedgerStore>,
        activation: Arc<ActivationGate>,
        lifecycle: Arc<RequirementLifecycle>,
    ) -> Self {
        Self {
            requirements,
            exposures,
            ledger,
            activation,
            lifecycle,
        }
    }

    /// Preconditions are evaluated in order and short-circuit: closed status,
    /// activation, idempotency, balance. A replay for an already-unlocked pair
    /// returns the original exposure unchanged.
    pub fn consume(
        &self,
        tutor: &TutorId,
        requirement_id: &RequirementId,
        at: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, EngineError> {
        let requirement = self
            .requirements
            .fetch(requirement_id)?
            .ok_or_else(|| EngineError::not_found("requirement", requirement_id))?;
        if !requirement.status.accepts_consumption() {
            return Err(EngineError::RequirementClosed {
                requirement: requirement_id.clone(),
            });
        }

        if !self.activation.is_eligible(tutor)? {
            return Err(EngineError::NotEligible {
                tutor: tutor.clone(),
            });
        }

        let lock = self.ledger.locks().acquire(tutor);
        let _serialized = lock.lock().expect("tutor lock poisoned");

        if let Some(existing) = self.exposures.find(tutor, requirement_id)? {
            return Ok(ConsumeOutcome::AlreadyUnlocked(existing));
        }

        let entry = self.ledger.debit_serialized(
            tutor,
            1,
            EntryReason::Consumption,
            Some(requirement_id.clone()),
            at,
        )?;

        let exposure = LeadExposure {
            tutor_id: tutor.clone(),
            requirement_id: requirement_id.clone(),
            consumed_at: at,
            ledger_entry_id: entry.entry_id,
        };
        match self.exposures.insert(exposure.clone()) {
            Ok(()) => {}
            Err(RepositoryError::Conflict) => {
                // Unreachable while the tutor lock is held; fall back to the
                // recorded exposure after unwinding the debit.
                self.compensate(tutor, requirement_id, at);
                let existing = self
                    .exposures
                    .find(tutor, requirement_id)?
                    .ok_or_else(|| {
                        EngineError::StorageUnavailable("exposure record missing".to_string())
                    })?;
                return Ok(ConsumeOutcome::AlreadyUnlocked(existing));
            }
            Err(err) => {
                self.compensate(tutor, requirement_id, at);
                return Err(err.into());
            }
        }

        self.lifecycle.note_applicant(requirement_id)?;
        Ok(ConsumeOutcome::Charged(exposure))
    }

    /// The debit committed but the exposure insert did not; unwind with a
    /// compensating refund so no credit is lost.
    fn compensate(&self, tutor: &TutorId, requirement_id: &RequirementId, at: DateTime<Utc>) {
        if let Err(err) = self
            .ledger
            .refund(tutor, 1, Some(requirement_id.clone()), at)
        {
            tracing::error!(%tutor, requirement = %requirement_id, %err, "compensating refund failed");
        }
    }
}
