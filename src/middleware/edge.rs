// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Edge route guard.
//!
//! Runs before any page is served and only sees what the transport carries:
//! the `accessToken` and `userRoles` cookies. Token presence is enough to
//! count as authenticated; expiry is left to the client and the backend.

use crate::config::{cookies, RouteConfig};
use crate::models::{Access, Role};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Prefixes the guard never looks at (API calls, build assets, health).
const PASSTHROUGH_PREFIXES: &[&str] = &["/api", "/_next", "/static", "/health"];

const CACHE_HEADER: &str = "x-middleware-cache";

/// How a request path is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Not a page; passed through untouched.
    Passthrough,
    /// Always allowed.
    Public,
    /// Requires a token and the given access level.
    Protected(Access),
}

/// Outcome of the guard for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    Allow,
    AllowPublic,
    /// Redirect to login; no token.
    Login(String),
    /// Redirect to the landing view; missing role.
    Landing(String),
}

/// Path classification built from [`RouteConfig`].
#[derive(Debug, Clone)]
pub struct RouteRules {
    public: Vec<String>,
    admin: Vec<String>,
    super_admin: Vec<String>,
    login_path: String,
    landing_path: String,
}

impl From<&RouteConfig> for RouteRules {
    fn from(config: &RouteConfig) -> Self {
        Self {
            public: config.public.clone(),
            admin: config.admin.clone(),
            super_admin: config.super_admin.clone(),
            login_path: config.login_path.clone(),
            landing_path: config.landing_path.clone(),
        }
    }
}

impl Default for RouteRules {
    fn default() -> Self {
        Self::from(&RouteConfig::default())
    }
}

/// `/` matches only the root; any other prefix matches itself and its subpaths.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path == "/";
    }
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn is_file_request(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

impl RouteRules {
    pub fn classify(&self, path: &str) -> RouteClass {
        let matches_any = |list: &[String]| list.iter().any(|p| matches_prefix(path, p));

        if PASSTHROUGH_PREFIXES.iter().any(|p| matches_prefix(path, p)) || is_file_request(path) {
            RouteClass::Passthrough
        } else if matches_any(&self.public) {
            RouteClass::Public
        } else if matches_any(&self.super_admin) {
            RouteClass::Protected(Access::SuperAdmin)
        } else if matches_any(&self.admin) {
            RouteClass::Protected(Access::Admin)
        } else {
            RouteClass::Protected(Access::Authenticated)
        }
    }

    /// Decide a request from its path and raw cookie values.
    pub fn evaluate(&self, path: &str, token: Option<&str>, roles: Option<&str>) -> EdgeDecision {
        let required = match self.classify(path) {
            RouteClass::Passthrough => return EdgeDecision::Allow,
            RouteClass::Public => return EdgeDecision::AllowPublic,
            RouteClass::Protected(access) => access,
        };

        if token.map_or(true, str::is_empty) {
            return EdgeDecision::Login(format!(
                "{}?callbackUrl={}",
                self.login_path,
                urlencoding::encode(path)
            ));
        }

        let roles = Role::parse_all(&parse_roles_cookie(roles));
        if required.is_satisfied_by(&roles) {
            EdgeDecision::Allow
        } else {
            EdgeDecision::Landing(self.landing_path.clone())
        }
    }
}

/// Parse the `userRoles` cookie value, already percent-decoded by the
/// cookie jar. Absent or non-JSON values are an empty list.
pub fn parse_roles_cookie(value: Option<&str>) -> Vec<String> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Vec::new();
    };
    serde_json::from_str(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Error parsing user roles cookie");
        Vec::new()
    })
}

fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(CACHE_HEADER, HeaderValue::from_static("no-store"));
    response
}

/// Middleware that applies [`RouteRules`] to every request.
pub async fn edge_guard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let token = jar.get(cookies::ACCESS_TOKEN).map(|c| c.value());
    let roles = jar.get(cookies::USER_ROLES).map(|c| c.value());

    match state.rules.evaluate(&path, token, roles) {
        EdgeDecision::Allow => next.run(request).await,
        EdgeDecision::AllowPublic => no_store(next.run(request).await),
        EdgeDecision::Login(target) => {
            tracing::info!(path = %path, "No token, redirecting to login");
            no_store(Redirect::temporary(&target).into_response())
        }
        EdgeDecision::Landing(target) => {
            tracing::info!(path = %path, "Missing role, redirecting to landing view");
            Redirect::temporary(&target).into_response()
        }
    }
}
