use serde::Serialize;

use super::domain::{DemoId, RequirementId, TutorId};

/// Events handed to the notification collaborator at engine boundaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineEvent {
    TutorActivated {
        tutor: TutorId,
    },
    TutorNotified {
        tutor: TutorId,
        requirement: RequirementId,
    },
    RequirementMatched {
        requirement: RequirementId,
    },
    DemoScheduled {
        demo: DemoId,
        requirement: RequirementId,
        tutor: TutorId,
    },
}

/// Event dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}

/// Trait describing outbound notification hooks (e-mail, SMS, in-app feeds).
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: EngineEvent) -> Result<(), EventError>;
}

/// Publisher that only logs, for deployments without a notification transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventPublisher;

impl EventPublisher for LogEventPublisher {
    fn publish(&self, event: EngineEvent) -> Result<(), EventError> {
        tracing::info!(?event, "engine event");
        Ok(())
    }
}

/// Delivery failures never roll back engine state; they are logged and dropped.
pub(crate) fn emit(publisher: &dyn EventPublisher, event: EngineEvent) {
    if let Err(err) = publisher.publish(event) {
        tracing::warn!(%err, "event delivery failed");
    }
}
