//! Permission matrix
//!
//! Static mapping of role → module → allowed actions. Lookups are pure `match`
//! expressions compiled into the binary; there is no runtime policy store.
//!
//! | Module    | admin | responsible | member | simplified | external | pet |
//! |-----------|-------|-------------|--------|------------|----------|-----|
//! | Dashboard | VCEDM | V           | V      | V          | V        |     |
//! | Tasks     | VCEDM | VCEDM       | VCE    | VE         | V        |     |
//! | Finance   | VCEDM | VCED        | V      |            |          |     |
//! | Calendar  | VCEDM | VCED        | VCE    | V          | V        |     |
//! | Health    | VCEDM | VCED        | VCE    | V          |          |     |
//! | Security  | VCEDM | VCE         | V      |            |          |     |
//! | Users     | VCEDM | VCE         | V      |            |          |     |
//! | Activity  | VCEDM | V           |        |            |          |     |
//! | Settings  | VCEDM | V           | V      |            |          |     |
//! | Admin     | VCEDM |             |        |            |          |     |

use ha_core::{Action, HaError, Module, Result, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Compact set of actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet(u8);

const V: u8 = Action::View.bit();
const C: u8 = Action::Create.bit();
const E: u8 = Action::Edit.bit();
const D: u8 = Action::Delete.bit();
const M: u8 = Action::Manage.bit();

impl ActionSet {
    /// No actions
    pub const EMPTY: Self = Self(0);
    /// Every action
    pub const FULL: Self = Self(V | C | E | D | M);

    const fn bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Whether `action` is in the set
    pub fn contains(&self, action: Action) -> bool {
        self.0 & action.bit() != 0
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Whether every action of `other` is in `self`
    pub fn is_superset_of(&self, other: ActionSet) -> bool {
        self.0 & other.0 == other.0
    }

    /// Actions in the set, in `Action::ALL` order
    pub fn actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|action| self.contains(*action))
            .collect()
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self(iter.into_iter().fold(0, |bits, action| bits | action.bit()))
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.actions().iter().map(Action::as_str).collect();
        write!(f, "[{}]", names.join(","))
    }
}

/// The allowed action set for `role` on `module`
pub fn permissions_for(role: Role, module: Module) -> ActionSet {
    use Module::*;

    let bits = match role {
        Role::Admin => V | C | E | D | M,
        Role::Responsible => match module {
            Tasks => V | C | E | D | M,
            Finance | Calendar | Health => V | C | E | D,
            Security | Users => V | C | E,
            Dashboard | Activity | Settings => V,
            Admin => 0,
        },
        Role::Member => match module {
            Tasks | Calendar | Health => V | C | E,
            Dashboard | Finance | Security | Users | Settings => V,
            Activity | Admin => 0,
        },
        Role::Simplified => match module {
            Tasks => V | E,
            Dashboard | Calendar | Health => V,
            _ => 0,
        },
        Role::External => match module {
            Dashboard | Tasks | Calendar => V,
            _ => 0,
        },
        Role::Pet => 0,
    };
    ActionSet::bits(bits)
}

/// Pure lookup: may `role` perform `action` on `module`
pub fn has_permission(role: Role, module: Module, action: Action) -> bool {
    permissions_for(role, module).contains(action)
}

/// Like [`has_permission`], but as a `Result` for `?` in services
pub fn require_permission(role: Role, module: Module, action: Action) -> Result<()> {
    if has_permission(role, module, action) {
        Ok(())
    } else {
        tracing::debug!(%role, %module, %action, "permission denied");
        Err(HaError::permission_denied(format!(
            "role {role} may not {action} {module}"
        )))
    }
}

/// Modules the role can see at all, in menu order
pub fn accessible_modules(role: Role) -> Vec<Module> {
    Module::ALL
        .into_iter()
        .filter(|module| has_permission(role, *module, Action::View))
        .collect()
}

/// The role's full matrix row, omitting modules with no actions
pub fn permission_map(role: Role) -> BTreeMap<Module, Vec<Action>> {
    Module::ALL
        .into_iter()
        .filter_map(|module| {
            let set = permissions_for(role, module);
            (!set.is_empty()).then(|| (module, set.actions()))
        })
        .collect()
}
