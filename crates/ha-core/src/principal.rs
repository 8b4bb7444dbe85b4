//! Authenticated caller

use crate::{HaError, HouseId, Result, Role, SessionId, UserId};
use serde::{Deserialize, Serialize};

/// The member on whose behalf a request runs
///
/// Produced by access-token authentication; every service operation takes one
/// so that filtering by house and role happens at the service boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Authenticated member
    pub user_id: UserId,
    /// House the member belongs to
    pub house_id: HouseId,
    /// Role at the time the session was authenticated
    pub role: Role,
    /// Session the access token belongs to
    pub session_id: SessionId,
}

impl Principal {
    /// Create a principal
    pub fn new(user_id: UserId, house_id: HouseId, role: Role, session_id: SessionId) -> Self {
        Self {
            user_id,
            house_id,
            role,
            session_id,
        }
    }

    /// Reject access to another tenant's data
    pub fn ensure_house(&self, house_id: HouseId) -> Result<()> {
        if self.house_id == house_id {
            Ok(())
        } else {
            Err(HaError::permission_denied(format!(
                "{} does not belong to {house_id}",
                self.user_id
            )))
        }
    }
}
