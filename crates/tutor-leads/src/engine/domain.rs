use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for tutor accounts, supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TutorId(pub String);

/// Identifier wrapper for parent accounts, supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentId(pub String);

/// Identifier wrapper for posted tuition requirements.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequirementId(pub String);

/// Identifier wrapper for demo sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DemoId(pub String);

/// Identifier wrapper for ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerEntryId(pub String);

impl fmt::Display for TutorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ParentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DemoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for LedgerEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account standing controlling participation in distribution and consumption.
///
/// Pending accounts have signed up but not paid the activation fee. Deactivated
/// accounts are permanently excluded from future distribution but keep their
/// ledger history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationStatus {
    Pending,
    Active,
    Deactivated,
}

impl ActivationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ActivationStatus::Pending => "pending",
            ActivationStatus::Active => "active",
            ActivationStatus::Deactivated => "deactivated",
        }
    }
}

/// Delivery mode for tuition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeachingMode {
    Online,
    Offline,
}

impl TeachingMode {
    pub const fn label(self) -> &'static str {
        match self {
            TeachingMode::Online => "online",
            TeachingMode::Offline => "offline",
        }
    }
}

/// Declared teaching capabilities used by the distribution eligibility check.
///
/// String fields are compared case-insensitively; `service_areas` only matters
/// for offline requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingProfile {
    pub subjects: Vec<String>,
    pub grade_levels: Vec<String>,
    pub boards: Vec<String>,
    pub modes: Vec<TeachingMode>,
    #[serde(default)]
    pub service_areas: Vec<String>,
    #[serde(default)]
    pub availability: Vec<String>,
}

/// A tutor account as the engine sees it. Credit balance is never stored here;
/// it is always derived from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorAccount {
    pub tutor_id: TutorId,
    pub activation: ActivationStatus,
    pub profile: MatchingProfile,
    pub registered_at: DateTime<Utc>,
}

/// What the parent is asking for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementDetails {
    pub subjects: Vec<String>,
    pub grade_level: String,
    pub board: String,
    pub modes: Vec<TeachingMode>,
    pub location: String,
    #[serde(default)]
    pub schedule_preferences: Vec<String>,
}

/// Lifecycle state of a posted requirement. Closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    Open,
    Matched,
    Closed,
}

impl RequirementStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequirementStatus::Open => "open",
            RequirementStatus::Matched => "matched",
            RequirementStatus::Closed => "closed",
        }
    }

    /// Contact details may still be unlocked in this state.
    pub const fn accepts_consumption(self) -> bool {
        matches!(self, RequirementStatus::Open | RequirementStatus::Matched)
    }

    /// Transition table: Open -> Matched, Open|Matched -> Closed. Matched never
    /// reverts to Open.
    pub const fn can_transition(self, to: RequirementStatus) -> bool {
        matches!(
            (self, to),
            (RequirementStatus::Open, RequirementStatus::Matched)
                | (RequirementStatus::Open, RequirementStatus::Closed)
                | (RequirementStatus::Matched, RequirementStatus::Closed)
        )
    }
}

/// Why a requirement reached Closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    ParentSelection,
    Administrative,
    Expired,
}

impl CloseReason {
    pub const fn label(self) -> &'static str {
        match self {
            CloseReason::ParentSelection => "parent_selection",
            CloseReason::Administrative => "administrative",
            CloseReason::Expired => "expired",
        }
    }
}

/// Terminal annotation set when a requirement closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Closure {
    pub reason: CloseReason,
    pub closed_at: DateTime<Utc>,
}

/// A parent's posted requirement together with its distribution bookkeeping.
///
/// `notified` records every tutor the distribution engine has already told
/// about this requirement, so re-running distribution never re-notifies.
/// The applicants count is derived from the exposure store, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuitionRequirement {
    pub requirement_id: RequirementId,
    pub parent_id: ParentId,
    pub details: RequirementDetails,
    pub status: RequirementStatus,
    pub posted_at: DateTime<Utc>,
    #[serde(default)]
    pub notified: BTreeSet<TutorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed: Option<Closure>,
}

/// The recorded fact that a tutor spent a credit to unlock a requirement.
/// At most one exposure exists per (tutor, requirement) pair; exposures are
/// never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadExposure {
    pub tutor_id: TutorId,
    pub requirement_id: RequirementId,
    pub consumed_at: DateTime<Utc>,
    pub ledger_entry_id: LedgerEntryId,
}

/// Lifecycle state of a demo session. Completed and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoStatus {
    Requested,
    Scheduled,
    Completed,
    Cancelled,
}

impl DemoStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DemoStatus::Requested => "requested",
            DemoStatus::Scheduled => "scheduled",
            DemoStatus::Completed => "completed",
            DemoStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, DemoStatus::Completed | DemoStatus::Cancelled)
    }

    /// Transition table: Requested -> Scheduled, Scheduled -> Completed,
    /// Scheduled -> Cancelled. Nothing leaves a terminal state.
    pub const fn can_transition(self, to: DemoStatus) -> bool {
        matches!(
            (self, to),
            (DemoStatus::Requested, DemoStatus::Scheduled)
                | (DemoStatus::Scheduled, DemoStatus::Completed)
                | (DemoStatus::Scheduled, DemoStatus::Cancelled)
        )
    }
}

/// A trial class between a matched tutor and parent. Scheduling fields stay
/// empty until the Requested -> Scheduled transition supplies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoSession {
    pub demo_id: DemoId,
    pub requirement_id: RequirementId,
    pub tutor_id: TutorId,
    pub student_name: String,
    pub subject: String,
    pub status: DemoStatus,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TeachingMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirement_transitions_follow_the_state_graph() {
        assert!(RequirementStatus::Open.can_transition(RequirementStatus::Matched));
        assert!(RequirementStatus::Open.can_transition(RequirementStatus::Closed));
        assert!(RequirementStatus::Matched.can_transition(RequirementStatus::Closed));

        assert!(!RequirementStatus::Matched.can_transition(RequirementStatus::Open));
        assert!(!RequirementStatus::Closed.can_transition(RequirementStatus::Open));
        assert!(!RequirementStatus::Closed.can_transition(RequirementStatus::Matched));
        assert!(!RequirementStatus::Closed.can_transition(RequirementStatus::Closed));
    }

    #[test]
    fn consumption_is_accepted_while_open_or_matched() {
        assert!(RequirementStatus::Open.accepts_consumption());
        assert!(RequirementStatus::Matched.accepts_consumption());
        assert!(!RequirementStatus::Closed.accepts_consumption());
    }

    #[test]
    fn demo_transitions_follow_the_state_graph() {
        assert!(DemoStatus::Requested.can_transition(DemoStatus::Scheduled));
        assert!(DemoStatus::Scheduled.can_transition(DemoStatus::Completed));
        assert!(DemoStatus::Scheduled.can_transition(DemoStatus::Cancelled));

        assert!(!DemoStatus::Requested.can_transition(DemoStatus::Completed));
        assert!(!DemoStatus::Completed.can_transition(DemoStatus::Scheduled));
        assert!(!DemoStatus::Completed.can_transition(DemoStatus::Cancelled));
        assert!(!DemoStatus::Cancelled.can_transition(DemoStatus::Scheduled));
        assert!(!DemoStatus::Cancelled.can_transition(DemoStatus::Completed));
    }

    #[test]
    fn terminal_demo_states_are_flagged() {
        assert!(DemoStatus::Completed.is_terminal());
        assert!(DemoStatus::Cancelled.is_terminal());
        assert!(!DemoStatus::Requested.is_terminal());
        assert!(!DemoStatus::Scheduled.is_terminal());
    }
}
