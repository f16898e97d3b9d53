// Verified Caller Identity
//
// Token verification is entirely the external auth service's job; by the
// time a request reaches the coordinator it carries a pre-verified
// (subject, role) pair and only coarse authorization happens here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Staff,
    Doctor,
}

impl Role {
    /// Only clinic staff and doctors may mutate queue state
    /// (transitions, call-next, manual admission).
    pub fn may_manage_queue(self) -> bool {
        matches!(self, Role::Staff | Role::Doctor)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "patient" => Some(Role::Patient),
            "staff" => Some(Role::Staff),
            "doctor" => Some(Role::Doctor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Patient => write!(f, "patient"),
            Role::Staff => write!(f, "staff"),
            Role::Doctor => write!(f, "doctor"),
        }
    }
}

/// A verified principal as asserted by the external auth boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject: String,
    pub role: Role,
}

impl Principal {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }
}
