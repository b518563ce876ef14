use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    DemoId, DemoSession, DemoStatus, RequirementId, RequirementStatus, TeachingMode, TutorId,
};
use super::error::EngineError;
use super::events::{self, EngineEvent, EventPublisher};
use super::repository::{DemoRepository, ExposureRepository, RequirementRepository};

static DEMO_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_demo_id() -> DemoId {
    let id = DEMO_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DemoId(format!("demo-{id:06}"))
}

/// Details supplied when a demo is first requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoRequest {
    pub student_name: String,
    pub subject: String,
}

/// Instruction accompanying a demo state change. The tag names the target
/// state; the payload carries what that transition needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum DemoCommand {
    Scheduled {
        scheduled_for: DateTime<Utc>,
        mode: TeachingMode,
        duration_minutes: u32,
        #[serde(default)]
        fee: Option<u32>,
    },
    Completed {
        #[serde(default)]
        confirmed: bool,
    },
    Cancelled {
        reason: String,
    },
}

impl DemoCommand {
    fn target(&self) -> DemoStatus {
        match self {
            DemoCommand::Scheduled { .. } => DemoStatus::Scheduled,
            DemoCommand::Completed { .. } => DemoStatus::Completed,
            DemoCommand::Cancelled { .. } => DemoStatus::Cancelled,
        }
    }
}

/// Owns the demo-session state machine: Requested -> Scheduled ->
/// Completed|Cancelled, both terminal. A requirement may carry one session per
/// tutor engagement; each is tracked independently.
pub struct DemoScheduler {
    demos: Arc<dyn DemoRepository>,
    requirements: Arc<dyn RequirementRepository>,
    exposures: Arc<dyn ExposureRepository>,
    events: Arc<dyn EventPublisher>,
}

impl DemoScheduler {
    pub fn new(
        demos: Arc<dyn DemoRepository>,
        requirements: Arc<dyn RequirementRepository>,
        exposures: Arc<dyn ExposureRepository>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            demos,
            requirements,
            exposures,
            events,
        }
    }

    /// Create a Requested session. The tutor must have unlocked the
    /// requirement (an exposure exists) and the requirement must not be
    /// Closed.
    pub fn schedule(
        &self,
        requirement_id: &RequirementId,
        tutor: &TutorId,
        request: DemoRequest,
        at: DateTime<Utc>,
    ) -> Result<DemoSession, EngineError> {
        let requirement = self
            .requirements
            .fetch(requirement_id)?
            .ok_or_else(|| EngineError::not_found("requirement", requirement_id))?;
        if requirement.status == RequirementStatus::Closed {
            return Err(EngineError::RequirementClosed {
                requirement: requirement_id.clone(),
            });
        }

        if self.exposures.find(tutor, requirement_id)?.is_none() {
            return Err(EngineError::NotEligible {
                tutor: tutor.clone(),
            });
        }

        let session = DemoSession {
            demo_id: next_demo_id(),
            requirement_id: requirement_id.clone(),
            tutor_id: tutor.clone(),
            student_name: request.student_name,
            subject: request.subject,
            status: DemoStatus::Requested,
            requested_at: at,
            scheduled_for: None,
            duration_minutes: None,
            fee: None,
            mode: None,
            completed_at: None,
            cancellation_reason: None,
        };
        self.demos.insert(session.clone())?;
        Ok(session)
    }

    pub fn fetch(&self, id: &DemoId) -> Result<DemoSession, EngineError> {
        self.demos
            .fetch(id)?
            .ok_or_else(|| EngineError::not_found("demo", id))
    }

    /// Apply a transition command. Violations of the state graph are rejected
    /// with `InvalidStateTransition`; terminal sessions never move again.
    pub fn transition(
        &self,
        demo_id: &DemoId,
        command: DemoCommand,
        at: DateTime<Utc>,
    ) -> Result<DemoSession, EngineError> {
        let mut session = self.fetch(demo_id)?;
        let target = command.target();
        if !session.status.can_transition(target) {
            return Err(EngineError::InvalidStateTransition {
                from: session.status.label(),
                to: target.label(),
            });
        }

        match command {
            DemoCommand::Scheduled {
                scheduled_for,
                mode,
                duration_minutes,
                fee,
            } => {
                let requirement = self
                    .requirements
                    .fetch(&session.requirement_id)?
                    .ok_or_else(|| EngineError::not_found("requirement", &session.requirement_id))?;
                if requirement.status == RequirementStatus::Closed {
                    return Err(EngineError::RequirementClosed {
                        requirement: session.requirement_id.clone(),
                    });
                }

                session.status = DemoStatus::Scheduled;
                session.scheduled_for = Some(scheduled_for);
                session.mode = Some(mode);
                session.duration_minutes = Some(duration_minutes);
                session.fee = fee;
                events::emit(
                    self.events.as_ref(),
                    EngineEvent::DemoScheduled {
                        demo: session.demo_id.clone(),
                        requirement: session.requirement_id.clone(),
                        tutor: session.tutor_id.clone(),
                    },
                );
            }
            DemoCommand::Completed { confirmed } => {
                let scheduled_for = session.scheduled_for.ok_or_else(|| {
                    EngineError::StorageUnavailable("scheduled session missing its slot".to_string())
                })?;
                if !confirmed && at < scheduled_for {
                    return Err(EngineError::InvalidStateTransition {
                        from: session.status.label(),
                        to: DemoStatus::Completed.label(),
                    });
                }
                session.status = DemoStatus::Completed;
                session.completed_at = Some(at);
            }
            DemoCommand::Cancelled { reason } => {
                session.status = DemoStatus::Cancelled;
                session.cancellation_reason = Some(reason);
            }
        }

        self.demos.update(session.clone())?;
        Ok(session)
    }
}
