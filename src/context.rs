// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session context: the reactive view of the session for the UI layer.
//!
//! State is published through a `tokio::sync::watch` channel. It is a cache
//! of the credential store and can always be rebuilt from it.
//!
//! ```text
//! Uninitialized --initialize--> Unauthenticated   (no token / no user)
//!               \-------------> Authenticated     (token + user present)
//! Authenticated --expired & refresh fails--> Unauthenticated
//! ```

use crate::error::Result;
use crate::models::{Role, SessionData, UserSnapshot};
use crate::navigation::Navigator;
use crate::services::{SessionEvent, SessionService};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Snapshot of the session as seen by views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<UserSnapshot>,
    pub roles: Vec<String>,
    pub is_authenticated: bool,
    /// True until the first initialization finishes.
    pub loading: bool,
}

/// Coarse phase of a [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Unauthenticated,
    Authenticated,
}

impl SessionState {
    pub fn uninitialized() -> Self {
        Self {
            user: None,
            roles: Vec::new(),
            is_authenticated: false,
            loading: true,
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            loading: false,
            ..Self::uninitialized()
        }
    }

    pub fn authenticated(user: UserSnapshot, roles: Vec<String>) -> Self {
        Self {
            user: Some(user),
            roles,
            is_authenticated: true,
            loading: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.loading {
            SessionPhase::Uninitialized
        } else if self.is_authenticated {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Unauthenticated
        }
    }

    /// Known roles of the session; empty when unauthenticated.
    pub fn typed_roles(&self) -> Vec<Role> {
        if self.is_authenticated {
            Role::parse_all(&self.roles)
        } else {
            Vec::new()
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::uninitialized()
    }
}

/// Result of one periodic expiry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryCheck {
    /// Not authenticated; nothing to check.
    Idle,
    /// Token still valid.
    Valid,
    /// Token was expired and has been refreshed.
    Refreshed,
    /// Token was expired, refresh failed, session cleared.
    LoggedOut,
}

/// Process-wide session context. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionContext {
    service: Arc<SessionService>,
    navigator: Arc<dyn Navigator>,
    state: Arc<watch::Sender<SessionState>>,
    home_path: String,
}

impl SessionContext {
    /// Create a context and subscribe it to `service`, so logins and
    /// logouts made anywhere (including by the transport) are reflected.
    pub fn new(service: Arc<SessionService>, navigator: Arc<dyn Navigator>) -> Self {
        let (state, _) = watch::channel(SessionState::uninitialized());
        let state = Arc::new(state);

        let subscriber = Arc::downgrade(&state);
        service.on_change(move |event| {
            let Some(state) = subscriber.upgrade() else {
                return;
            };
            match event {
                SessionEvent::LoggedIn { user, roles } => {
                    state.send_replace(SessionState::authenticated(user.clone(), roles.clone()));
                }
                SessionEvent::LoggedOut => {
                    state.send_replace(SessionState::unauthenticated());
                }
                SessionEvent::Refreshed => {}
            }
        });

        Self {
            service,
            navigator,
            state,
            home_path: "/".to_string(),
        }
    }

    pub fn service(&self) -> &Arc<SessionService> {
        &self.service
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn publish(&self, next: SessionState) {
        self.state.send_replace(next);
    }

    /// Build the state from the credential store.
    ///
    /// A stored token plus user snapshot authenticates the session even if
    /// the token has expired; in that case a refresh is started in the
    /// background without touching the published state, and its handle is
    /// returned.
    pub fn initialize(&self) -> Option<JoinHandle<bool>> {
        if !self.service.is_logged_in() {
            tracing::debug!("No token found, session is unauthenticated");
            self.publish(SessionState::unauthenticated());
            return None;
        }

        match self.service.current_user() {
            Some(user) => {
                let roles = self.service.get_roles();
                tracing::info!(username = %user.username, roles = ?roles, "Session restored");
                self.publish(SessionState::authenticated(user, roles));
            }
            None => {
                tracing::warn!("Token present without user data");
                self.publish(SessionState::unauthenticated());
                return None;
            }
        }

        if !self.service.is_token_expired() {
            return None;
        }

        tracing::info!("Token is expired, refreshing in background");
        let service = self.service.clone();
        Some(tokio::spawn(async move {
            let refreshed = service.refresh_token().await;
            if !refreshed {
                tracing::warn!("Background token refresh failed");
            }
            refreshed
        }))
    }

    /// Start the periodic expiry check. Dropping the returned handle stops it.
    pub fn watch_expiry(&self, every: Duration) -> ExpiryWatch {
        let ctx = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                ctx.check_expiry().await;
            }
        });
        ExpiryWatch { handle }
    }

    /// One iteration of the periodic check.
    pub async fn check_expiry(&self) -> ExpiryCheck {
        let authenticated = self.state.borrow().is_authenticated;
        if !authenticated {
            return ExpiryCheck::Idle;
        }
        if !self.service.is_token_expired() {
            return ExpiryCheck::Valid;
        }
        if self.service.refresh_token().await {
            return ExpiryCheck::Refreshed;
        }

        tracing::info!("Token expired and refresh failed, logging out");
        self.logout();
        ExpiryCheck::LoggedOut
    }

    /// Sign in. The service's login event moves the state straight to
    /// authenticated using the response itself. On error the state is
    /// unchanged.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionData> {
        self.service.login(username, password).await
    }

    /// Clear the session and navigate home.
    pub fn logout(&self) {
        self.service.logout();
        self.navigator.navigate(&self.home_path);
    }

    pub async fn refresh_token(&self) -> bool {
        self.service.refresh_token().await
    }
}

/// Handle owning the periodic expiry task; aborts it on drop.
pub struct ExpiryWatch {
    handle: JoinHandle<()>,
}

impl ExpiryWatch {
    pub fn stop(self) {
        // Drop does the work.
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ExpiryWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
