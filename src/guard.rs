// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side route guard for protected views.
//!
//! This only keeps the UI honest; the edge guard is what actually stands in
//! front of server-rendered content.

use crate::config::RouteConfig;
use crate::context::{SessionContext, SessionPhase, SessionState};
use crate::models::Access;

/// What a protected view should do right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not initialized yet; show a placeholder.
    Loading,
    /// Leave for the given path.
    Redirect(String),
    /// Render the protected content.
    Render,
}

/// Wraps a protected view with an optional role requirement.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    required: Access,
    login_path: String,
    landing_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(Access::Authenticated)
    }
}

impl RouteGuard {
    pub fn new(required: Access) -> Self {
        let routes = RouteConfig::default();
        Self {
            required,
            login_path: routes.login_path,
            landing_path: routes.landing_path,
        }
    }

    /// Guard for views requiring an admin role.
    pub fn admin() -> Self {
        Self::new(Access::Admin)
    }

    /// Guard for views requiring the super-admin role.
    pub fn super_admin() -> Self {
        Self::new(Access::SuperAdmin)
    }

    /// Use the login and landing views from the route configuration.
    pub fn with_routes(mut self, routes: &RouteConfig) -> Self {
        self.login_path = routes.login_path.clone();
        self.landing_path = routes.landing_path.clone();
        self
    }

    pub fn decide(&self, state: &SessionState, current_path: &str) -> GuardDecision {
        match state.phase() {
            SessionPhase::Uninitialized => GuardDecision::Loading,
            SessionPhase::Unauthenticated => GuardDecision::Redirect(format!(
                "{}?callbackUrl={}",
                self.login_path,
                urlencoding::encode(current_path)
            )),
            SessionPhase::Authenticated => {
                if self.required.is_satisfied_by(&state.typed_roles()) {
                    GuardDecision::Render
                } else {
                    GuardDecision::Redirect(self.landing_path.clone())
                }
            }
        }
    }

    /// Decide against the current context state and perform any redirect.
    pub fn enforce(&self, ctx: &SessionContext, current_path: &str) -> GuardDecision {
        let decision = self.decide(&ctx.state(), current_path);
        if let GuardDecision::Redirect(target) = &decision {
            tracing::debug!(from = %current_path, to = %target, "Route guard redirect");
            ctx.navigator().navigate(target);
        }
        decision
    }

    /// Wait for the context to finish initializing, then [`enforce`](Self::enforce).
    pub async fn wait(&self, ctx: &SessionContext, current_path: &str) -> GuardDecision {
        let mut rx = ctx.subscribe();
        let ready = rx.wait_for(|state| !state.loading).await.is_ok();
        if !ready {
            return GuardDecision::Loading;
        }
        self.enforce(ctx, current_path)
    }
}
