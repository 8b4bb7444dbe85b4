//! Navigation guards
//!
//! The frontend router asks the table before entering a path. Paths match by
//! segment prefix and the longest registered prefix wins, so `/admin/users`
//! can be stricter or looser than `/admin`.

use crate::guards::{GuardChain, GuardViolation};
use ha_authorization::{has_min_role, has_permission};
use ha_core::{Action, Module, Principal, Role};
use serde::{Deserialize, Serialize};

/// What a route needs before it can be entered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequirement {
    /// Reachable without a session (login, activation)
    pub public: bool,
    pub min_role: Option<Role>,
    pub permission: Option<(Module, Action)>,
}

impl RouteRequirement {
    /// No session needed
    pub fn public() -> Self {
        Self {
            public: true,
            min_role: None,
            permission: None,
        }
    }

    /// Any logged-in member
    pub fn authenticated() -> Self {
        Self {
            public: false,
            min_role: None,
            permission: None,
        }
    }

    /// Logged in with at least `role`
    pub fn min_role(role: Role) -> Self {
        Self {
            min_role: Some(role),
            ..Self::authenticated()
        }
    }

    /// Logged in with `action` on `module`
    pub fn permission(module: Module, action: Action) -> Self {
        Self {
            permission: Some((module, action)),
            ..Self::authenticated()
        }
    }

    fn chain(&self) -> GuardChain {
        let mut chain = GuardChain::new();
        if let Some(role) = self.min_role {
            chain = chain.min_role(role);
        }
        if let Some((module, action)) = self.permission {
            chain = chain.permission(module, action);
        }
        chain
    }

    /// Whether a role satisfies the requirement, ignoring authentication
    pub fn allows_role(&self, role: Role) -> bool {
        self.min_role.map_or(true, |min| has_min_role(role, min))
            && self
                .permission
                .map_or(true, |(module, action)| has_permission(role, module, action))
    }
}

/// Outcome of a navigation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RouteDecision {
    Allow,
    /// No session; send the user to the house PIN screen
    RedirectToLogin,
    Forbidden { reason: GuardViolation },
}

/// A menu entry the role may navigate to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleRoute {
    pub path: String,
}

/// Path prefix → requirement
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<(String, RouteRequirement)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a route
    pub fn route(mut self, path: impl Into<String>, requirement: RouteRequirement) -> Self {
        let path = normalize(&path.into());
        self.routes.retain(|(p, _)| *p != path);
        self.routes.push((path, requirement));
        self
    }

    /// The HomeAsisstan web application's routes
    pub fn standard() -> Self {
        Self::new()
            .route("/login", RouteRequirement::public())
            .route("/activate", RouteRequirement::public())
            .route("/", RouteRequirement::authenticated())
            .route(
                "/dashboard",
                RouteRequirement::permission(Module::Dashboard, Action::View),
            )
            .route("/tasks", RouteRequirement::permission(Module::Tasks, Action::View))
            .route(
                "/tasks/new",
                RouteRequirement::permission(Module::Tasks, Action::Create),
            )
            .route(
                "/finance",
                RouteRequirement::permission(Module::Finance, Action::View),
            )
            .route(
                "/calendar",
                RouteRequirement::permission(Module::Calendar, Action::View),
            )
            .route(
                "/health",
                RouteRequirement::permission(Module::Health, Action::View),
            )
            .route(
                "/security",
                RouteRequirement::permission(Module::Security, Action::View),
            )
            .route("/profile", RouteRequirement::authenticated())
            .route(
                "/settings",
                RouteRequirement::permission(Module::Settings, Action::View),
            )
            .route(
                "/admin",
                RouteRequirement::permission(Module::Admin, Action::View),
            )
            .route("/admin/users", RouteRequirement::min_role(Role::Responsible))
            .route(
                "/admin/activity",
                RouteRequirement::permission(Module::Activity, Action::View),
            )
    }

    /// Requirement of the longest registered prefix of `path`
    pub fn requirement(&self, path: &str) -> Option<&RouteRequirement> {
        let path = normalize(path);
        self.routes
            .iter()
            .filter(|(prefix, _)| is_prefix(prefix, &path))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, requirement)| requirement)
    }

    /// Decide whether `principal` may enter `path`
    ///
    /// Unknown paths require a session but nothing else, so the frontend can
    /// render its own not-found page.
    pub fn navigate(&self, principal: Option<&Principal>, path: &str) -> RouteDecision {
        let fallback = RouteRequirement::authenticated();
        let requirement = self.requirement(path).unwrap_or(&fallback);
        if requirement.public {
            return RouteDecision::Allow;
        }
        if principal.is_none() {
            return RouteDecision::RedirectToLogin;
        }
        match requirement.chain().evaluate(principal).denial_reason() {
            None => RouteDecision::Allow,
            Some(reason) => RouteDecision::Forbidden {
                reason: reason.clone(),
            },
        }
    }

    /// Non-public routes a role may enter, in registration order
    pub fn visible_routes(&self, role: Role) -> Vec<VisibleRoute> {
        self.routes
            .iter()
            .filter(|(_, requirement)| !requirement.public && requirement.allows_role(role))
            .map(|(path, _)| VisibleRoute { path: path.clone() })
            .collect()
    }
}

fn normalize(path: &str) -> String {
    let without_query = path.trim().split(['?', '#']).next().unwrap_or_default();
    let trimmed = without_query.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn is_prefix(prefix: &str, path: &str) -> bool {
    prefix == "/"
        || path == prefix
        || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/'))
}
