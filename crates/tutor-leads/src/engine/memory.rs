//! In-memory storage backend. Used by the service binary, the CLI demo, and
//! the test suites; a persistent deployment swaps these for adapters over its
//! own store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{
    ActivationStatus, DemoId, DemoSession, LeadExposure, RequirementId, RequirementStatus,
    TuitionRequirement, TutorAccount, TutorId,
};
use super::events::{EngineEvent, EventError, EventPublisher};
use super::ledger::LedgerEntry;
use super::repository::{
    DemoRepository, ExposureRepository, LedgerRepository, RepositoryError, RequirementRepository,
    TutorRepository,
};
use super::service::EngineStores;

#[derive(Default, Clone)]
pub struct InMemoryTutorRepository {
    accounts: Arc<Mutex<HashMap<TutorId, TutorAccount>>>,
}

impl TutorRepository for InMemoryTutorRepository {
    fn insert(&self, account: TutorAccount) -> Result<(), RepositoryError> {
        let mut guard = self.accounts.lock().expect("tutor mutex poisoned");
        if guard.contains_key(&account.tutor_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(account.tutor_id.clone(), account);
        Ok(())
    }

    fn fetch(&self, id: &TutorId) -> Result<Option<TutorAccount>, RepositoryError> {
        let guard = self.accounts.lock().expect("tutor mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, account: TutorAccount) -> Result<(), RepositoryError> {
        let mut guard = self.accounts.lock().expect("tutor mutex poisoned");
        if !guard.contains_key(&account.tutor_id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(account.tutor_id.clone(), account);
        Ok(())
    }

    fn list_active(&self) -> Result<Vec<TutorAccount>, RepositoryError> {
        let guard = self.accounts.lock().expect("tutor mutex poisoned");
        let mut active: Vec<TutorAccount> = guard
            .values()
            .filter(|account| account.activation == ActivationStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.tutor_id.cmp(&b.tutor_id));
        Ok(active)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryLedgerRepository {
    entries: Arc<Mutex<HashMap<TutorId, Vec<LedgerEntry>>>>,
}

impl LedgerRepository for InMemoryLedgerRepository {
    fn append(&self, entry: LedgerEntry) -> Result<(), RepositoryError> {
        let mut guard = self.entries.lock().expect("ledger mutex poisoned");
        guard.entry(entry.tutor_id.clone()).or_default().push(entry);
        Ok(())
    }

    fn entries(&self, tutor: &TutorId) -> Result<Vec<LedgerEntry>, RepositoryError> {
        let guard = self.entries.lock().expect("ledger mutex poisoned");
        Ok(guard.get(tutor).cloned().unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryExposureRepository {
    exposures: Arc<Mutex<Vec<LeadExposure>>>,
}

impl ExposureRepository for InMemoryExposureRepository {
    fn insert(&self, exposure: LeadExposure) -> Result<(), RepositoryError> {
        let mut guard = self.exposures.lock().expect("exposure mutex poisoned");
        let duplicate = guard.iter().any(|existing| {
            existing.tutor_id == exposure.tutor_id
                && existing.requirement_id == exposure.requirement_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        guard.push(exposure);
        Ok(())
    }

    fn find(
        &self,
        tutor: &TutorId,
        requirement: &RequirementId,
    ) -> Result<Option<LeadExposure>, RepositoryError> {
        let guard = self.exposures.lock().expect("exposure mutex poisoned");
        Ok(guard
            .iter()
            .find(|exposure| {
                exposure.tutor_id == *tutor && exposure.requirement_id == *requirement
            })
            .cloned())
    }

    fn for_requirement(
        &self,
        requirement: &RequirementId,
    ) -> Result<Vec<LeadExposure>, RepositoryError> {
        let guard = self.exposures.lock().expect("exposure mutex poisoned");
        Ok(guard
            .iter()
            .filter(|exposure| exposure.requirement_id == *requirement)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryRequirementRepository {
    requirements: Arc<Mutex<HashMap<RequirementId, TuitionRequirement>>>,
}

impl RequirementRepository for InMemoryRequirementRepository {
    fn insert(&self, requirement: TuitionRequirement) -> Result<(), RepositoryError> {
        let mut guard = self.requirements.lock().expect("requirement mutex poisoned");
        if guard.contains_key(&requirement.requirement_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(requirement.requirement_id.clone(), requirement);
        Ok(())
    }

    fn fetch(&self, id: &RequirementId) -> Result<Option<TuitionRequirement>, RepositoryError> {
        let guard = self.requirements.lock().expect("requirement mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, requirement: TuitionRequirement) -> Result<(), RepositoryError> {
        let mut guard = self.requirements.lock().expect("requirement mutex poisoned");
        if !guard.contains_key(&requirement.requirement_id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(requirement.requirement_id.clone(), requirement);
        Ok(())
    }

    fn list_open(&self) -> Result<Vec<TuitionRequirement>, RepositoryError> {
        let guard = self.requirements.lock().expect("requirement mutex poisoned");
        let mut open: Vec<TuitionRequirement> = guard
            .values()
            .filter(|requirement| requirement.status != RequirementStatus::Closed)
            .cloned()
            .collect();
        open.sort_by(|a, b| a.requirement_id.cmp(&b.requirement_id));
        Ok(open)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryDemoRepository {
    sessions: Arc<Mutex<HashMap<DemoId, DemoSession>>>,
}

impl DemoRepository for InMemoryDemoRepository {
    fn insert(&self, session: DemoSession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("demo mutex poisoned");
        if guard.contains_key(&session.demo_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.demo_id.clone(), session);
        Ok(())
    }

    fn fetch(&self, id: &DemoId) -> Result<Option<DemoSession>, RepositoryError> {
        let guard = self.sessions.lock().expect("demo mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, session: DemoSession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("demo mutex poisoned");
        if !guard.contains_key(&session.demo_id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(session.demo_id.clone(), session);
        Ok(())
    }

    fn for_requirement(&self, id: &RequirementId) -> Result<Vec<DemoSession>, RepositoryError> {
        let guard = self.sessions.lock().expect("demo mutex poisoned");
        Ok(guard
            .values()
            .filter(|session| session.requirement_id == *id)
            .cloned()
            .collect())
    }
}

/// Publisher that records every event so demos and tests can assert on the
/// notification boundary.
#[derive(Default, Clone)]
pub struct RecordingEventPublisher {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl RecordingEventPublisher {
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl EventPublisher for RecordingEventPublisher {
    fn publish(&self, event: EngineEvent) -> Result<(), EventError> {
        self.events.lock().expect("event mutex poisoned").push(event);
        Ok(())
    }
}

/// A fresh set of in-memory stores.
pub fn memory_stores() -> EngineStores {
    EngineStores {
        tutors: Arc::new(InMemoryTutorRepository::default()),
        ledger: Arc::new(InMemoryLedgerRepository::default()),
        exposures: Arc::new(InMemoryExposureRepository::default()),
        requirements: Arc::new(InMemoryRequirementRepository::default()),
        demos: Arc::new(InMemoryDemoRepository::default()),
    }
}
