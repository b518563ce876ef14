use serde::{Deserialize, Serialize};

/// Policy dials for the lead engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Applicant count at which an Open requirement becomes Matched.
    pub matched_applicant_threshold: u32,
    /// Inactivity window after which `close_expired` sweeps a requirement.
    /// `None` disables policy-driven expiry.
    pub expire_after_days: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            matched_applicant_threshold: 1,
            expire_after_days: None,
        }
    }
}
