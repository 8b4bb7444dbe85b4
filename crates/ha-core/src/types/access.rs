//! Access-control vocabulary: roles, dashboard modules and actions
//!
//! Only the enumerations live here. Which role may do what is decided by the
//! permission matrix in `ha-authorization`.

use crate::HaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission level assigned to a user within a house
///
/// Declared in ascending rank order; `Ord` follows the role hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Guests and outside helpers (cleaners, babysitters)
    External,
    /// Pet profile; owns health records but never logs in
    Pet,
    /// Children or members using the simplified dashboard
    Simplified,
    /// Regular household member
    Member,
    /// Co-manager of the household
    Responsible,
    /// Full control over the house
    Admin,
}

impl Role {
    /// All roles in ascending rank order
    pub const ALL: [Role; 6] = [
        Role::External,
        Role::Pet,
        Role::Simplified,
        Role::Member,
        Role::Responsible,
        Role::Admin,
    ];

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::External => "external",
            Role::Pet => "pet",
            Role::Simplified => "simplified",
            Role::Member => "member",
            Role::Responsible => "responsible",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = HaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| HaError::invalid(format!("unknown role: {s}")))
    }
}

/// Dashboard area guarded by the permission matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    /// House overview
    Dashboard,
    /// Chores and to-dos
    Tasks,
    /// Budgets and expenses
    Finance,
    /// Shared calendar
    Calendar,
    /// Health records for people and pets
    Health,
    /// Cameras, alarms, door codes
    Security,
    /// Member accounts
    Users,
    /// Activity log
    Activity,
    /// House settings
    Settings,
    /// Admin panel
    Admin,
}

impl Module {
    /// All modules in menu order
    pub const ALL: [Module; 10] = [
        Module::Dashboard,
        Module::Tasks,
        Module::Finance,
        Module::Calendar,
        Module::Health,
        Module::Security,
        Module::Users,
        Module::Activity,
        Module::Settings,
        Module::Admin,
    ];

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Dashboard => "dashboard",
            Module::Tasks => "tasks",
            Module::Finance => "finance",
            Module::Calendar => "calendar",
            Module::Health => "health",
            Module::Security => "security",
            Module::Users => "users",
            Module::Activity => "activity",
            Module::Settings => "settings",
            Module::Admin => "admin",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = HaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|module| module.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| HaError::invalid(format!("unknown module: {s}")))
    }
}

/// Operation a role may perform on a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Read access
    View,
    /// Create new records
    Create,
    /// Modify existing records
    Edit,
    /// Remove records
    Delete,
    /// Configure the module or act on other members' records
    Manage,
}

impl Action {
    /// All actions
    pub const ALL: [Action; 5] = [
        Action::View,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::Manage,
    ];

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Manage => "manage",
        }
    }

    /// Bit used by `ActionSet`
    pub const fn bit(self) -> u8 {
        match self {
            Action::View => 1,
            Action::Create => 1 << 1,
            Action::Edit => 1 << 2,
            Action::Delete => 1 << 3,
            Action::Manage => 1 << 4,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = HaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| HaError::invalid(format!("unknown action: {s}")))
    }
}
