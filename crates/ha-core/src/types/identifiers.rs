//! Identifier types used across HomeAsisstan
//!
//! Every identifier is a UUID newtype so a `UserId` can never be passed where a
//! `HouseId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from a UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            /// Accepts both the bare UUID and the prefixed display form.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .strip_prefix(concat!($prefix, "-"))
                    .unwrap_or(s);
                Uuid::parse_str(raw).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_identifier!(
    /// House (tenant) identifier
    ///
    /// All data and memberships are scoped to exactly one house.
    HouseId,
    "house"
);

uuid_identifier!(
    /// Member account identifier, unique across houses
    UserId,
    "user"
);

uuid_identifier!(
    /// Login session identifier
    ///
    /// A session is created by a successful PIN login and soft-revoked on
    /// logout, admin revocation or refresh-token reuse.
    SessionId,
    "session"
);

uuid_identifier!(
    /// Activity log entry identifier
    ActivityId,
    "activity"
);

uuid_identifier!(
    /// Real-time notification identifier
    NotificationId,
    "notification"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_from_str() {
        let id = HouseId::new();
        let parsed: HouseId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        let bare: HouseId = id.uuid().to_string().parse().unwrap();
        assert_eq!(bare, id);
    }

    #[test]
    fn serde_is_transparent() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.uuid()));
    }

    #[test]
    fn wrong_prefix_is_rejected() {
        let id = UserId::new();
        assert!(id.to_string().parse::<SessionId>().is_err());
    }
}
