//! Role-based route authorization.
//!
//! One policy type covers the admin, broker and user areas. Guards read the
//! identity store synchronously and expect bootstrap to have finished; a
//! store still in `Loading` is treated as anonymous.

use crate::models::{Role, User};
use crate::session::{IdentityStore, SessionState};

pub const LOGIN_PATH: &str = "/login";
pub const BROKER_DASHBOARD_PATH: &str = "/broker/dashboard";

/// Requirements for reaching a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    pub requires_auth: bool,
    pub allowed_roles: &'static [Role],
    /// Paths an unapproved broker may still reach
    pub exception_paths: &'static [&'static str],
}

pub const PUBLIC: AccessPolicy = AccessPolicy {
    requires_auth: false,
    allowed_roles: &[],
    exception_paths: &[],
};

pub const USER_AREA: AccessPolicy = AccessPolicy {
    requires_auth: true,
    allowed_roles: &[Role::User],
    exception_paths: &[],
};

pub const BROKER_AREA: AccessPolicy = AccessPolicy {
    requires_auth: true,
    allowed_roles: &[Role::Broker],
    exception_paths: &[BROKER_DASHBOARD_PATH, "/broker/profile"],
};

pub const ADMIN_AREA: AccessPolicy = AccessPolicy {
    requires_auth: true,
    allowed_roles: &[Role::Admin],
    exception_paths: &[],
};

/// Outcome of a guard check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(&'static str),
}

/// Policy protecting `path`, chosen by its area prefix.
pub fn policy_for_path(path: &str) -> &'static AccessPolicy {
    let path = normalize(path);
    if within(path, "/admin") {
        &ADMIN_AREA
    } else if within(path, "/broker") {
        &BROKER_AREA
    } else if within(path, "/home") || within(path, "/user") || within(path, "/saved") {
        &USER_AREA
    } else {
        &PUBLIC
    }
}

pub fn authorize(policy: &AccessPolicy, session: &SessionState, path: &str) -> Access {
    if !policy.requires_auth {
        return Access::Allow;
    }

    let Some(user) = session.user() else {
        return Access::Redirect(LOGIN_PATH);
    };

    if !policy.allowed_roles.contains(&user.role) {
        return Access::Redirect(user.role.home_path());
    }

    if restricted_broker(policy, user) {
        let path = normalize(path);
        if !policy.exception_paths.iter().any(|allowed| within(path, allowed)) {
            return Access::Redirect(BROKER_DASHBOARD_PATH);
        }
    }

    Access::Allow
}

/// Check `path` against the current identity using its area policy.
pub fn check(store: &IdentityStore, path: &str) -> Access {
    authorize(policy_for_path(path), &store.snapshot(), path)
}

fn restricted_broker(policy: &AccessPolicy, user: &User) -> bool {
    !policy.exception_paths.is_empty() && user.is_pending_broker()
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn within(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}
