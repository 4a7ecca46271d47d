// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Composition root for the client side of the session layer.
//!
//! One [`SessionClient`] is one logical session: a cookie jar shared by the
//! HTTP client and the credential store, a single [`SessionService`], the
//! transport and the context that subscribes to it.

use crate::config::Config;
use crate::context::{ExpiryWatch, SessionContext};
use crate::guard::RouteGuard;
use crate::models::Access;
use crate::navigation::Navigator;
use crate::services::{AccountApi, ApiClient, SessionService};
use crate::store::{CookieOptions, CredentialStore, FileStore, JarCookies, LocalBackend, MemoryStore};
use anyhow::Context;
use reqwest::cookie::Jar;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Everything a client needs to hold a session.
pub struct SessionClient {
    pub config: Config,
    pub session: Arc<SessionService>,
    pub api: ApiClient,
    pub context: SessionContext,
}

impl SessionClient {
    /// Wire up the session layer from configuration.
    pub fn from_config(config: Config, navigator: Arc<dyn Navigator>) -> anyhow::Result<Self> {
        let site = config.site().context("invalid site URL")?;
        let jar = Arc::new(Jar::default());

        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building HTTP client")?;

        let local: Arc<dyn LocalBackend> = match &config.fallback_store_path {
            Some(path) => Arc::new(
                FileStore::open(path)
                    .with_context(|| format!("failed opening fallback store at {}", path))?,
            ),
            None => Arc::new(MemoryStore::new()),
        };

        let store = CredentialStore::new(
            Arc::new(JarCookies::new(jar, site)),
            local,
            CookieOptions::from_config(&config),
        );

        let session = Arc::new(SessionService::from_config(&config, http.clone(), store));
        let api = ApiClient::new(
            http,
            config.api_url.clone(),
            session.clone(),
            navigator.clone(),
        )
        .with_login_path(config.routes.login_path.clone());
        let context = SessionContext::new(session.clone(), navigator);

        tracing::info!(
            auth_api = %config.auth_api_url,
            api = %config.api_url,
            site = %config.site_url,
            "Session client initialized"
        );

        Ok(Self {
            config,
            session,
            api,
            context,
        })
    }

    /// Initialize the context and start the periodic expiry check. A
    /// background refresh started by initialization runs detached.
    pub fn start(&self) -> ExpiryWatch {
        let _ = self.context.initialize();
        self.context.watch_expiry(self.config.token_check_interval)
    }

    pub fn account(&self) -> AccountApi {
        AccountApi::new(self.api.clone())
    }

    /// Route guard using the configured login and landing views.
    pub fn guard(&self, required: Access) -> RouteGuard {
        RouteGuard::new(required).with_routes(&self.config.routes)
    }
}
