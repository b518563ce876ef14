use super::domain::{RequirementId, TutorId};
use super::repository::RepositoryError;

/// Expected, recoverable outcomes of engine operations. Every variant except
/// `StorageUnavailable` describes a business condition the caller is expected
/// to relay to the user, not an engine fault.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("tutor {tutor} has insufficient lead credits (balance {balance})")]
    InsufficientCredit { tutor: TutorId, balance: i64 },
    #[error("tutor {tutor} is not activated for lead access")]
    NotEligible { tutor: TutorId },
    #[error("requirement {requirement} is closed")]
    RequirementClosed { requirement: RequirementId },
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("tutor {tutor} is already registered")]
    AlreadyRegistered { tutor: TutorId },
    #[error("amount must be a positive number of credits")]
    InvalidAmount,
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl EngineError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Repository failures reaching this conversion are unexpected: the engine
/// checks preconditions under its own locks before writing, so a surfacing
/// conflict or missing record means the store itself misbehaved.
impl From<RepositoryError> for EngineError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict => {
                EngineError::StorageUnavailable("conflicting write".to_string())
            }
            RepositoryError::NotFound => {
                EngineError::StorageUnavailable("record disappeared mid-operation".to_string())
            }
            RepositoryError::Unavailable(message) => EngineError::StorageUnavailable(message),
        }
    }
}
