// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session service: authentication calls and the credential record.
//!
//! This is the only component that talks to the authentication endpoints
//! and the only writer of the [`CredentialStore`].

use crate::config::{cookies, Config};
use crate::error::{AppError, Result};
use crate::models::{
    LoginData, LoginResponse, RefreshResponse, RegisterData, Role, SessionData, UserSnapshot,
};
use crate::services::jwt;
use crate::store::CredentialStore;
use std::sync::RwLock;
use std::time::Duration;
use tokio::sync::Mutex;
use validator::Validate;

/// Change to the stored session, announced to listeners after the store
/// has been updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn {
        user: UserSnapshot,
        roles: Vec<String>,
    },
    LoggedOut,
    Refreshed,
}

type SessionListener = Box<dyn Fn(&SessionEvent) + Send + Sync>;

/// Owns login, logout, refresh and the role queries.
pub struct SessionService {
    http: reqwest::Client,
    auth_api_url: String,
    store: CredentialStore,
    expiry_buffer: Duration,
    listeners: RwLock<Vec<SessionListener>>,
    /// Serializes refresh exchanges so concurrent 401s share one refresh.
    refresh_lock: Mutex<()>,
}

impl SessionService {
    pub fn new(
        http: reqwest::Client,
        auth_api_url: impl Into<String>,
        store: CredentialStore,
        expiry_buffer: Duration,
    ) -> Self {
        Self {
            http,
            auth_api_url: auth_api_url.into().trim_end_matches('/').to_string(),
            store,
            expiry_buffer,
            listeners: RwLock::new(Vec::new()),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config, http: reqwest::Client, store: CredentialStore) -> Self {
        Self::new(
            http,
            config.auth_api_url.clone(),
            store,
            config.token_expiry_buffer,
        )
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Register a listener called synchronously after every login, logout
    /// and successful refresh, whoever triggered it.
    pub fn on_change(&self, listener: impl Fn(&SessionEvent) + Send + Sync + 'static) {
        match self.listeners.write() {
            Ok(mut listeners) => listeners.push(Box::new(listener)),
            Err(_) => tracing::error!("Session listener registry poisoned"),
        }
    }

    fn notify(&self, event: SessionEvent) {
        if let Ok(listeners) = self.listeners.read() {
            for listener in listeners.iter() {
                listener(&event);
            }
        }
    }

    // ─── Authentication calls ────────────────────────────────────

    /// Sign in and persist the credential record.
    ///
    /// Backend errors are returned as-is (with their status). A successful
    /// response without a usable token leaves the store untouched and
    /// yields [`AppError::MissingToken`].
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionData> {
        tracing::info!(username = %username, "Starting login");

        let body = LoginData {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self
            .http
            .post(format!("{}/signin", self.auth_api_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = AppError::from_response(response).await;
            tracing::warn!(username = %username, error = %err, "Login rejected");
            return Err(err);
        }

        let raw: LoginResponse = response
            .json()
            .await
            .map_err(|e| AppError::Decode(format!("login response: {}", e)))?;
        let data = SessionData::from(raw);

        if !data.has_token() {
            tracing::error!("No token in login response, expected `token` or `accessToken`");
            return Err(AppError::MissingToken);
        }

        self.set_auth_data(&data);
        tracing::info!(
            username = %data.username,
            has_refresh_token = data.refresh_token.is_some(),
            roles = ?data.roles,
            persisted = self.store.get(cookies::ACCESS_TOKEN).is_some(),
            "Login successful"
        );
        self.notify(SessionEvent::LoggedIn {
            user: data.user_snapshot(),
            roles: data.roles.clone(),
        });

        Ok(data)
    }

    /// Create an account. Invalid input is rejected before any network call.
    pub async fn register(&self, data: &RegisterData) -> Result<()> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let response = self
            .http
            .post(format!("{}/signup", self.auth_api_url))
            .json(data)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response(response).await);
        }

        tracing::info!(username = %data.username, "Registration accepted");
        Ok(())
    }

    /// Clear every credential entry. Never fails and makes no network call.
    pub fn logout(&self) {
        tracing::info!("Logging out");
        if !self.store.clear() {
            tracing::warn!("Some credential entries could not be removed");
        }
        self.notify(SessionEvent::LoggedOut);
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Returns `false` without a network call when no refresh token is
    /// stored. Any failure leaves the store unchanged.
    pub async fn refresh_token(&self) -> bool {
        let _guard = self.refresh_lock.lock().await;
        self.exchange_refresh_token().await
    }

    /// Refresh after a request made with `stale` was rejected.
    ///
    /// If another caller replaced the access token while this one waited
    /// for the refresh lock, the new token is used as-is and no second
    /// exchange is made.
    pub async fn refresh_after(&self, stale: Option<&str>) -> bool {
        let _guard = self.refresh_lock.lock().await;
        if let Some(current) = self.access_token() {
            if Some(current.as_str()) != stale {
                tracing::debug!("Access token already refreshed by a concurrent request");
                return true;
            }
        }
        self.exchange_refresh_token().await
    }

    async fn exchange_refresh_token(&self) -> bool {
        let Some(refresh_token) = self.stored_refresh_token() else {
            tracing::debug!("No refresh token stored, skipping refresh");
            return false;
        };

        let response = match self
            .http
            .post(format!("{}/refresh-token", self.auth_api_url))
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh request failed");
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Token refresh rejected");
            return false;
        }

        let body: RefreshResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh response unreadable");
                return false;
            }
        };

        let Some(access_token) = body.access_token.filter(|t| !t.is_empty()) else {
            tracing::warn!("Token refresh response had no access token");
            return false;
        };

        self.store.set(cookies::ACCESS_TOKEN, &access_token);
        if let Some(rotated) = body.refresh_token.filter(|t| !t.is_empty()) {
            self.store.set(cookies::REFRESH_TOKEN, &rotated);
        }

        tracing::info!("Access token refreshed");
        self.notify(SessionEvent::Refreshed);
        true
    }

    // ─── Stored state ────────────────────────────────────────────

    /// Write the full record from a login response.
    fn set_auth_data(&self, data: &SessionData) {
        match serde_json::to_string(&data.user_snapshot()) {
            Ok(user) => {
                self.store.set(cookies::USER_DATA, &user);
            }
            Err(e) => tracing::error!(error = %e, "Failed to serialize user data"),
        }

        self.store.set(cookies::ACCESS_TOKEN, &data.access_token);

        if let Some(refresh_token) = &data.refresh_token {
            self.store.set(cookies::REFRESH_TOKEN, refresh_token);
        }

        match serde_json::to_string(&data.roles) {
            Ok(roles) => {
                self.store.set(cookies::USER_ROLES, &roles);
            }
            Err(e) => tracing::error!(error = %e, "Failed to serialize roles"),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.get(cookies::ACCESS_TOKEN)
    }

    pub fn stored_refresh_token(&self) -> Option<String> {
        self.store.get(cookies::REFRESH_TOKEN)
    }

    /// Stored identity; malformed or absent data yields `None`.
    pub fn current_user(&self) -> Option<UserSnapshot> {
        let raw = self.store.get(cookies::USER_DATA)?;
        serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!(error = %e, "Error parsing stored user data"))
            .ok()
    }

    /// True iff an access token is stored. Expiry is deliberately not
    /// checked here; the edge guard makes the same presence-only decision.
    pub fn is_logged_in(&self) -> bool {
        self.access_token().is_some()
    }

    /// Whether the access token is missing, undecodable, or expires within
    /// the configured buffer.
    pub fn is_token_expired(&self) -> bool {
        self.is_token_expired_at(jwt::unix_now())
    }

    pub fn is_token_expired_at(&self, now: i64) -> bool {
        match self.access_token() {
            Some(token) => jwt::expires_within(&token, now, self.expiry_buffer),
            None => true,
        }
    }

    // ─── Roles ───────────────────────────────────────────────────

    /// Raw stored role identifiers. Malformed or absent data is empty.
    pub fn get_roles(&self) -> Vec<String> {
        let Some(raw) = self.store.get(cookies::USER_ROLES) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Error parsing stored roles");
            Vec::new()
        })
    }

    /// Known roles among the stored identifiers.
    pub fn roles(&self) -> Vec<Role> {
        Role::parse_all(&self.get_roles())
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin) || self.has_role(Role::SuperAdmin)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(Role::SuperAdmin)
    }
}
