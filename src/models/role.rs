// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Roles and access requirements.
//!
//! Role identifiers travel as strings (`ROLE_ADMIN`, ...) in the login
//! response and the `userRoles` cookie. Inside the crate they are parsed into
//! [`Role`] so checks cannot be misspelled; unknown identifiers are kept in
//! the raw list but never satisfy a requirement.

use std::fmt;

/// Known role identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
            Role::SuperAdmin => "ROLE_SUPER_ADMIN",
        }
    }

    /// Parse a wire identifier. Unknown identifiers yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ROLE_USER" => Some(Role::User),
            "ROLE_ADMIN" => Some(Role::Admin),
            "ROLE_SUPER_ADMIN" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    /// Parse every known identifier in a raw role list.
    pub fn parse_all<S: AsRef<str>>(values: &[S]) -> Vec<Role> {
        values.iter().filter_map(|v| Role::parse(v.as_ref())).collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a route or view demands of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Any authenticated session.
    Authenticated,
    /// `ROLE_ADMIN` or `ROLE_SUPER_ADMIN`.
    Admin,
    /// `ROLE_SUPER_ADMIN` only.
    SuperAdmin,
}

impl Access {
    /// Whether a session holding `roles` meets this requirement.
    ///
    /// Authentication itself is checked by the caller; this only looks at roles.
    pub fn is_satisfied_by(&self, roles: &[Role]) -> bool {
        match self {
            Access::Authenticated => true,
            Access::Admin => roles
                .iter()
                .any(|r| matches!(r, Role::Admin | Role::SuperAdmin)),
            Access::SuperAdmin => roles.contains(&Role::SuperAdmin),
        }
    }
}
