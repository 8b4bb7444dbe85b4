//! Guard decision vocabulary
//!
//! Every guard, whether it protects an API handler or a frontend route,
//! answers with a [`GuardDecision`]. Denials carry a structured reason so the
//! server can pick a status code and the frontend can pick a message.

use ha_core::{Action, HaError, HouseId, Module, Role};
use serde::{Deserialize, Serialize};

/// Structured guard violation reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum GuardViolation {
    Unauthenticated,
    InsufficientRole { required: Role, actual: Role },
    MissingPermission { module: Module, action: Action },
    CrossHouse { house_id: HouseId },
    Other { message: String },
}

impl GuardViolation {
    pub fn other(reason: impl Into<String>) -> Self {
        Self::Other {
            message: reason.into(),
        }
    }
}

impl std::fmt::Display for GuardViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardViolation::Unauthenticated => write!(f, "Authentication required"),
            GuardViolation::InsufficientRole { required, actual } => {
                write!(f, "Requires role {required} or higher, have {actual}")
            }
            GuardViolation::MissingPermission { module, action } => {
                write!(f, "Missing permission: {action} on {module}")
            }
            GuardViolation::CrossHouse { house_id } => {
                write!(f, "Access to {house_id} denied")
            }
            GuardViolation::Other { message } => write!(f, "{message}"),
        }
    }
}

impl From<GuardViolation> for HaError {
    fn from(violation: GuardViolation) -> Self {
        match violation {
            GuardViolation::Unauthenticated => HaError::unauthorized(violation.to_string()),
            _ => HaError::permission_denied(violation.to_string()),
        }
    }
}

/// Decision from guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Operation is allowed.
    Allow,
    /// Operation is denied with a reason.
    Deny { reason: GuardViolation },
}

impl GuardDecision {
    /// Create an allow decision.
    pub fn allow() -> Self {
        Self::Allow
    }

    /// Create a deny decision with a reason.
    pub fn deny(reason: GuardViolation) -> Self {
        Self::Deny { reason }
    }

    /// Returns `true` if the decision allows the operation.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns `true` if the decision denies the operation.
    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }

    /// Returns the denial reason, if denied.
    pub fn denial_reason(&self) -> Option<&GuardViolation> {
        match self {
            Self::Allow => None,
            Self::Deny { reason } => Some(reason),
        }
    }

    /// Convert into a `Result` for `?` in handlers
    pub fn into_result(self) -> ha_core::Result<()> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny { reason } => Err(reason.into()),
        }
    }
}
