use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::config::EngineConfig;
use super::domain::{
    CloseReason, Closure, ParentId, RequirementDetails, RequirementId, RequirementStatus,
    TuitionRequirement,
};
use super::error::EngineError;
use super::events::{self, EngineEvent, EventPublisher};
use super::repository::{ExposureRepository, RequirementRepository};

static REQUIREMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_requirement_id() -> RequirementId {
    let id = REQUIREMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequirementId(format!("req-{id:06}"))
}

/// Owns the requirement state machine: Open -> Matched -> Closed, with Closed
/// terminal and Matched never reverting.
pub struct RequirementLifecycle {
    requirements: Arc<dyn RequirementRepository>,
    exposures: Arc<dyn ExposureRepository>,
    events: Arc<dyn EventPublisher>,
    config: EngineConfig,
}

impl RequirementLifecycle {
    pub fn new(
        requirements: Arc<dyn RequirementRepository>,
        exposures: Arc<dyn ExposureRepository>,
        events: Arc<dyn EventPublisher>,
        config: EngineConfig,
    ) -> Self {
        Self {
            requirements,
            exposures,
            events,
            config,
        }
    }

    /// Create an Open requirement with no applicants.
    pub fn post(
        &self,
        parent_id: ParentId,
        details: RequirementDetails,
        posted_at: DateTime<Utc>,
    ) -> Result<TuitionRequirement, EngineError> {
        let requirement = TuitionRequirement {
            requirement_id: next_requirement_id(),
            parent_id,
            details,
            status: RequirementStatus::Open,
            posted_at,
            notified: Default::default(),
            closed: None,
        };
        self.requirements.insert(requirement.clone())?;
        Ok(requirement)
    }

    pub fn fetch(&self, id: &RequirementId) -> Result<TuitionRequirement, EngineError> {
        self.requirements
            .fetch(id)?
            .ok_or_else(|| EngineError::not_found("requirement", id))
    }

    /// Distinct tutors that unlocked the requirement. Exposure uniqueness per
    /// (tutor, requirement) pair makes the record count the tutor count.
    pub fn applicants(&self, id: &RequirementId) -> Result<u32, EngineError> {
        Ok(self.exposures.for_requirement(id)?.len() as u32)
    }

    /// Signal from the consumption gate that a new applicant exists. Promotes
    /// Open -> Matched once the configured threshold is reached; later
    /// applicants leave the status alone.
    pub(crate) fn note_applicant(&self, id: &RequirementId) -> Result<(), EngineError> {
        let mut requirement = self.fetch(id)?;
        if requirement.status != RequirementStatus::Open {
            return Ok(());
        }

        if self.applicants(id)? >= self.config.matched_applicant_threshold {
            requirement.status = RequirementStatus::Matched;
            self.requirements.update(requirement)?;
            events::emit(
                self.events.as_ref(),
                EngineEvent::RequirementMatched {
                    requirement: id.clone(),
                },
            );
        }
        Ok(())
    }

    /// Open|Matched -> Closed. Closing an already-Closed requirement is a
    /// rejected transition, never a silent no-op.
    pub fn close(
        &self,
        id: &RequirementId,
        reason: CloseReason,
        at: DateTime<Utc>,
    ) -> Result<TuitionRequirement, EngineError> {
        let mut requirement = self.fetch(id)?;
        if !requirement.status.can_transition(RequirementStatus::Closed) {
            return Err(EngineError::InvalidStateTransition {
                from: requirement.status.label(),
                to: RequirementStatus::Closed.label(),
            });
        }

        requirement.status = RequirementStatus::Closed;
        requirement.closed = Some(Closure {
            reason,
            closed_at: at,
        });
        self.requirements.update(requirement.clone())?;
        tracing::info!(requirement = %id, reason = reason.label(), "requirement closed");
        Ok(requirement)
    }

    /// Policy-driven expiry sweep: closes Open/Matched requirements posted
    /// before the configured inactivity window. The host decides when to run
    /// it; the engine keeps no timers.
    pub fn close_expired(&self, now: DateTime<Utc>) -> Result<Vec<RequirementId>, EngineError> {
        let Some(days) = self.config.expire_after_days else {
            return Ok(Vec::new());
        };
        let cutoff = now - Duration::days(i64::from(days));

        let mut expired = Vec::new();
        for requirement in self.requirements.list_open()? {
            if requirement.posted_at < cutoff {
                self.close(&requirement.requirement_id, CloseReason::Expired, now)?;
                expired.push(requirement.requirement_id);
            }
        }
        Ok(expired)
    }
}
