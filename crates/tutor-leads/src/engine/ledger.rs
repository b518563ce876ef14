use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{LedgerEntryId, RequirementId, TutorId};
use super::error::EngineError;
use super::repository::LedgerRepository;

/// Direction of a ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Credit,
    Debit,
}

impl EntryType {
    pub const fn label(self) -> &'static str {
        match self {
            EntryType::Credit => "credit",
            EntryType::Debit => "debit",
        }
    }
}

/// Why the movement happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryReason {
    Purchase,
    Consumption,
    AdminAdjustment,
    Refund,
}

impl EntryReason {
    pub const fn label(self) -> &'static str {
        match self {
            EntryReason::Purchase => "purchase",
            EntryReason::Consumption => "consumption",
            EntryReason::AdminAdjustment => "admin_adjustment",
            EntryReason::Refund => "refund",
        }
    }
}

/// Immutable record of one credit movement. Corrections are compensating
/// entries, never edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: LedgerEntryId,
    pub tutor_id: TutorId,
    pub entry_type: EntryType,
    pub amount: u32,
    pub reason: EntryReason,
    pub recorded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_ref: Option<RequirementId>,
}

impl LedgerEntry {
    pub fn signed_amount(&self) -> i64 {
        match self.entry_type {
            EntryType::Credit => i64::from(self.amount),
            EntryType::Debit => -i64::from(self.amount),
        }
    }
}

static ENTRY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_entry_id() -> LedgerEntryId {
    let id = ENTRY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LedgerEntryId(format!("txn-{id:06}"))
}

/// Registry of per-tutor locks. Every balance check-and-debit runs inside the
/// owning tutor's critical section; the consumption gate shares the registry
/// so exposure uniqueness and the debit sit inside the same section.
#[derive(Default)]
pub struct TutorLocks {
    locks: Mutex<HashMap<TutorId, Arc<Mutex<()>>>>,
}

impl TutorLocks {
    pub fn acquire(&self, tutor: &TutorId) -> Arc<Mutex<()>> {
        let mut registry = self.locks.lock().expect("lock registry poisoned");
        registry.entry(tutor.clone()).or_default().clone()
    }
}

/// Append-only credit ledger with per-tutor debit serialization.
pub struct LedgerStore {
    entries: Arc<dyn LedgerRepository>,
    locks: Arc<TutorLocks>,
}

impl LedgerStore {
    pub fn new(entries: Arc<dyn LedgerRepository>, locks: Arc<TutorLocks>) -> Self {
        Self { entries, locks }
    }

    pub(crate) fn locks(&self) -> &Arc<TutorLocks> {
        &self.locks
    }

    /// Record a credit. Succeeds for any known tutor; callers verify the tutor
    /// exists before granting credits.
    pub fn credit(
        &self,
        tutor: &TutorId,
        amount: u32,
        reason: EntryReason,
        at: DateTime<Utc>,
    ) -> Result<LedgerEntry, EngineError> {
        self.append_credit(tutor, amount, reason, None, at)
    }

    /// Compensating credit tied to the requirement whose consumption is being
    /// unwound.
    pub(crate) fn refund(
        &self,
        tutor: &TutorId,
        amount: u32,
        requirement_ref: Option<RequirementId>,
        at: DateTime<Utc>,
    ) -> Result<LedgerEntry, EngineError> {
        self.append_credit(tutor, amount, EntryReason::Refund, requirement_ref, at)
    }

    fn append_credit(
        &self,
        tutor: &TutorId,
        amount: u32,
        reason: EntryReason,
        requirement_ref: Option<RequirementId>,
        at: DateTime<Utc>,
    ) -> Result<LedgerEntry, EngineError> {
        if amount == 0 {
            return Err(EngineError::InvalidAmount);
        }
        let entry = LedgerEntry {
            entry_id: next_entry_id(),
            tutor_id: tutor.clone(),
            entry_type: EntryType::Credit,
            amount,
            reason,
            recorded_at: at,
            requirement_ref,
        };
        self.entries.append(entry.clone())?;
        Ok(entry)
    }

    /// Record a debit, failing with `InsufficientCredit` when the balance
    /// would go negative. No entry is written on failure.
    pub fn debit(
        &self,
        tutor: &TutorId,
        amount: u32,
        reason: EntryReason,
        requirement_ref: Option<RequirementId>,
        at: DateTime<Utc>,
    ) -> Result<LedgerEntry, EngineError> {
        let lock = self.locks.acquire(tutor);
        let _serialized = lock.lock().expect("tutor lock poisoned");
        self.debit_serialized(tutor, amount, reason, requirement_ref, at)
    }

    /// Caller must hold the tutor's lock from [`TutorLocks::acquire`].
    pub(crate) fn debit_serialized(
        &self,
        tutor: &TutorId,
        amount: u32,
        reason: EntryReason,
        requirement_ref: Option<RequirementId>,
        at: DateTime<Utc>,
    ) -> Result<LedgerEntry, EngineError> {
        if amount == 0 {
            return Err(EngineError::InvalidAmount);
        }
        let balance = self.balance(tutor)?;
        if balance < i64::from(amount) {
            return Err(EngineError::InsufficientCredit {
                tutor: tutor.clone(),
                balance,
            });
        }
        let entry = LedgerEntry {
            entry_id: next_entry_id(),
            tutor_id: tutor.clone(),
            entry_type: EntryType::Debit,
            amount,
            reason,
            recorded_at: at,
            requirement_ref,
        };
        self.entries.append(entry.clone())?;
        Ok(entry)
    }

    /// Sum of credits minus debits over every committed entry.
    pub fn balance(&self, tutor: &TutorId) -> Result<i64, EngineError> {
        let entries = self.entries.entries(tutor)?;
        Ok(entries.iter().map(LedgerEntry::signed_amount).sum())
    }

    /// A tutor's entries in insertion order. Side-effect free and restartable.
    pub fn history(&self, tutor: &TutorId) -> Result<Vec<LedgerEntry>, EngineError> {
        Ok(self.entries.entries(tutor)?)
    }
}
