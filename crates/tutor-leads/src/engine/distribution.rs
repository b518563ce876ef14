use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use super::domain::{RequirementId, RequirementStatus, TutorId};
use super::error::EngineError;
use super::events::{self, EngineEvent, EventPublisher};
use super::matching;
use super::repository::{ExposureRepository, RequirementRepository, TutorRepository};

/// Result of one distribution run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionOutcome {
    pub requirement_id: RequirementId,
    /// Tutors notified for the first time by this run.
    pub notified: Vec<TutorId>,
    /// Tutors already notified by earlier runs and skipped here.
    pub previously_notified: usize,
}

/// Computes the eligible tutor set for a requirement and records who has been
/// told about it. Eligibility is a set-intersection test
/// ([`matching::profile_matches`]), not a ranked search, and notifying a tutor
/// never charges them; credits move only at consumption.
pub struct DistributionEngine {
    tutors: Arc<dyn TutorRepository>,
    requirements: Arc<dyn RequirementRepository>,
    exposures: Arc<dyn ExposureRepository>,
    events: Arc<dyn EventPublisher>,
}

impl DistributionEngine {
    pub fn new(
        tutors: Arc<dyn TutorRepository>,
        requirements: Arc<dyn RequirementRepository>,
        exposures: Arc<dyn ExposureRepository>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            tutors,
            requirements,
            exposures,
            events,
        }
    }

    /// Idempotent: re-running after a profile update only reaches tutors that
    /// are new to the eligible set. Tutors already notified or already exposed
    /// are skipped.
    pub fn distribute(
        &self,
        requirement_id: &RequirementId,
    ) -> Result<DistributionOutcome, EngineError> {
        let mut requirement = self
            .requirements
            .fetch(requirement_id)?
            .ok_or_else(|| EngineError::not_found("requirement", requirement_id))?;

        if requirement.status == RequirementStatus::Closed {
            return Err(EngineError::RequirementClosed {
                requirement: requirement_id.clone(),
            });
        }

        let previously_notified = requirement.notified.len();
        let exposed: BTreeSet<TutorId> = self
            .exposures
            .for_requirement(requirement_id)?
            .into_iter()
            .map(|exposure| exposure.tutor_id)
            .collect();

        let mut notified = Vec::new();
        for account in self.tutors.list_active()? {
            if requirement.notified.contains(&account.tutor_id)
                || exposed.contains(&account.tutor_id)
            {
                continue;
            }
            if !matching::profile_matches(&account.profile, &requirement.details) {
                continue;
            }

            requirement.notified.insert(account.tutor_id.clone());
            events::emit(
                self.events.as_ref(),
                EngineEvent::TutorNotified {
                    tutor: account.tutor_id.clone(),
                    requirement: requirement_id.clone(),
                },
            );
            notified.push(account.tutor_id);
        }

        if !notified.is_empty() {
            self.requirements.update(requirement)?;
        }

        Ok(DistributionOutcome {
            requirement_id: requirement_id.clone(),
            notified,
            previously_notified,
        })
    }
}
