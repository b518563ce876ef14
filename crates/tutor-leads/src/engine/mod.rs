//! Lead matching and credit accounting engine.
//!
//! On a new requirement the flow runs top-down: the lifecycle manager creates
//! it Open, the distribution engine notifies eligible activated tutors (free),
//! a tutor's unlock attempt passes through the consumption gate, the ledger
//! store debits one credit inside that tutor's critical section, and the
//! lifecycle manager may promote the requirement to Matched. Demo sessions
//! attach to matched requirements afterwards.

pub mod activation;
mod config;
pub mod consumption;
pub mod demo;
pub mod distribution;
pub mod domain;
mod error;
pub mod events;
pub mod ledger;
pub mod lifecycle;
pub mod matching;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use activation::{ActivationGate, PaymentConfirmation};
pub use config::EngineConfig;
pub use consumption::ConsumeOutcome;
pub use demo::{DemoCommand, DemoRequest};
pub use distribution::DistributionOutcome;
pub use domain::{
    ActivationStatus, CloseReason, DemoId, DemoSession, DemoStatus, LeadExposure, LedgerEntryId,
    MatchingProfile, ParentId, RequirementDetails, RequirementId, RequirementStatus, TeachingMode,
    TuitionRequirement, TutorAccount, TutorId,
};
pub use error::EngineError;
pub use events::{EngineEvent, EventError, EventPublisher, LogEventPublisher};
pub use ledger::{EntryReason, EntryType, LedgerEntry, LedgerStore, TutorLocks};
pub use matching::profile_matches;
pub use memory::{memory_stores, RecordingEventPublisher};
pub use repository::{
    DemoRepository, ExposureRepository, LedgerRepository, RepositoryError, RequirementRepository,
    TutorRepository,
};
pub use router::lead_router;
pub use service::{EngineStores, LeadEngine, RequirementView};
