use super::domain::{
    DemoId, DemoSession, LeadExposure, RequirementId, TuitionRequirement, TutorAccount, TutorId,
};
use super::ledger::LedgerEntry;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Storage seam for tutor accounts.
pub trait TutorRepository: Send + Sync {
    fn insert(&self, account: TutorAccount) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &TutorId) -> Result<Option<TutorAccount>, RepositoryError>;
    fn update(&self, account: TutorAccount) -> Result<(), RepositoryError>;
    fn list_active(&self) -> Result<Vec<TutorAccount>, RepositoryError>;
}

/// Storage seam for the append-only credit ledger. Entries are never updated
/// or deleted; corrections are compensating entries.
pub trait LedgerRepository: Send + Sync {
    fn append(&self, entry: LedgerEntry) -> Result<(), RepositoryError>;
    /// A tutor's entries in insertion order.
    fn entries(&self, tutor: &TutorId) -> Result<Vec<LedgerEntry>, RepositoryError>;
}

/// Storage seam for lead exposures. `insert` must reject a second record for
/// the same (tutor, requirement) pair with `Conflict`.
pub trait ExposureRepository: Send + Sync {
    fn insert(&self, exposure: LeadExposure) -> Result<(), RepositoryError>;
    fn find(
        &self,
        tutor: &TutorId,
        requirement: &RequirementId,
    ) -> Result<Option<LeadExposure>, RepositoryError>;
    fn for_requirement(
        &self,
        requirement: &RequirementId,
    ) -> Result<Vec<LeadExposure>, RepositoryError>;
}

/// Storage seam for posted requirements.
pub trait RequirementRepository: Send + Sync {
    fn insert(&self, requirement: TuitionRequirement) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &RequirementId) -> Result<Option<TuitionRequirement>, RepositoryError>;
    fn update(&self, requirement: TuitionRequirement) -> Result<(), RepositoryError>;
    /// Requirements still accepting consumption (Open or Matched).
    fn list_open(&self) -> Result<Vec<TuitionRequirement>, RepositoryError>;
}

/// Storage seam for demo sessions.
pub trait DemoRepository: Send + Sync {
    fn insert(&self, session: DemoSession) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &DemoId) -> Result<Option<DemoSession>, RepositoryError>;
    fn update(&self, session: DemoSession) -> Result<(), RepositoryError>;
    fn for_requirement(&self, id: &RequirementId) -> Result<Vec<DemoSession>, RepositoryError>;
}
