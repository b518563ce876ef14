use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ActivationStatus, MatchingProfile, TutorAccount, TutorId};
use super::error::EngineError;
use super::events::{self, EngineEvent, EventPublisher};
use super::repository::{RepositoryError, TutorRepository};

/// Out-of-band payment confirmation handed over by the payment collaborator.
/// The engine trusts it; it never initiates or verifies payment itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub reference: String,
}

/// Gatekeeps whether a tutor account may participate in distribution and
/// consumption at all.
pub struct ActivationGate {
    tutors: Arc<dyn TutorRepository>,
    events: Arc<dyn EventPublisher>,
}

impl ActivationGate {
    pub fn new(tutors: Arc<dyn TutorRepository>, events: Arc<dyn EventPublisher>) -> Self {
        Self { tutors, events }
    }

    /// Create a Pending account for an identity-provider supplied tutor id.
    pub fn register(
        &self,
        tutor_id: TutorId,
        profile: MatchingProfile,
        at: DateTime<Utc>,
    ) -> Result<TutorAccount, EngineError> {
        let account = TutorAccount {
            tutor_id: tutor_id.clone(),
            activation: ActivationStatus::Pending,
            profile,
            registered_at: at,
        };
        match self.tutors.insert(account.clone()) {
            Ok(()) => Ok(account),
            Err(RepositoryError::Conflict) => Err(EngineError::AlreadyRegistered { tutor: tutor_id }),
            Err(err) => Err(err.into()),
        }
    }

    /// True only for Active accounts. Unknown tutors are simply not eligible.
    pub fn is_eligible(&self, tutor: &TutorId) -> Result<bool, EngineError> {
        let account = self.tutors.fetch(tutor)?;
        Ok(matches!(
            account.map(|account| account.activation),
            Some(ActivationStatus::Active)
        ))
    }

    /// Pending -> Active, exactly once. Activating an already-Active account is
    /// an idempotent no-op; a Deactivated account can never come back.
    pub fn activate(
        &self,
        tutor: &TutorId,
        confirmation: PaymentConfirmation,
    ) -> Result<TutorAccount, EngineError> {
        let mut account = self
            .tutors
            .fetch(tutor)?
            .ok_or_else(|| EngineError::not_found("tutor", tutor))?;

        match account.activation {
            ActivationStatus::Active => Ok(account),
            ActivationStatus::Deactivated => Err(EngineError::InvalidStateTransition {
                from: ActivationStatus::Deactivated.label(),
                to: ActivationStatus::Active.label(),
            }),
            ActivationStatus::Pending => {
                account.activation = ActivationStatus::Active;
                self.tutors.update(account.clone())?;
                tracing::info!(%tutor, reference = %confirmation.reference, "tutor activated");
                events::emit(
                    self.events.as_ref(),
                    EngineEvent::TutorActivated {
                        tutor: tutor.clone(),
                    },
                );
                Ok(account)
            }
        }
    }

    /// Pending|Active -> Deactivated (tutor or administrator action). The
    /// account keeps its ledger history but is permanently excluded from
    /// future distribution.
    pub fn deactivate(&self, tutor: &TutorId) -> Result<TutorAccount, EngineError> {
        let mut account = self
            .tutors
            .fetch(tutor)?
            .ok_or_else(|| EngineError::not_found("tutor", tutor))?;

        if account.activation == ActivationStatus::Deactivated {
            return Err(EngineError::InvalidStateTransition {
                from: ActivationStatus::Deactivated.label(),
                to: ActivationStatus::Deactivated.label(),
            });
        }

        account.activation = ActivationStatus::Deactivated;
        self.tutors.update(account.clone())?;
        tracing::info!(%tutor, "tutor deactivated");
        Ok(account)
    }
}
