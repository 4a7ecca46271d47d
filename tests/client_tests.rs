// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end tests: a session client logging in against a mock auth
//! backend, then browsing pages served by the real edge server.
//!
//! The credential cookies written by the store travel in the same cookie
//! jar the HTTP client uses, so the edge guard sees exactly what a browser
//! would send.

mod common;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use padel_session::config::{cookies, Config};
use padel_session::context::{ExpiryCheck, SessionPhase};
use padel_session::guard::GuardDecision;
use padel_session::models::Access;
use padel_session::navigation::NavigationLog;
use padel_session::routes::create_router;
use padel_session::{client::SessionClient, AppState};
use reqwest::Method;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    client: SessionClient,
    navigator: Arc<NavigationLog>,
    edge: String,
    _pages: TempDir,
}

async fn harness(roles: &[&str]) -> Harness {
    let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
    // One backend for auth and the domain API. It has no refresh endpoint,
    // so every 401 from the API is final.
    let backend = Router::new()
        .route(
            "/api/tokens/balance",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"message": "Token revoked"})),
                )
            }),
        )
        .route(
            "/api/auth/signin",
            post(move || {
                let roles = roles.clone();
                async move {
                    Json(json!({
                        "id": 7,
                        "username": "ana",
                        "email": "ana@example.com",
                        "firstName": "Ana",
                        "lastName": "Lopez",
                        "accessToken": common::token_expiring_in(3600),
                        "refreshToken": "R",
                        "roles": roles
                    }))
                }
            }),
        );
    let backend_base = common::serve(backend).await;

    let pages = tempfile::tempdir().unwrap();
    fs::write(pages.path().join("index.html"), "home").unwrap();
    for page in ["dashboard", "admin", "auth/login"] {
        let dir = pages.path().join(page);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.html"), page).unwrap();
    }
    let edge_config = Config {
        static_dir: pages.path().to_string_lossy().into_owned(),
        ..Config::default()
    };
    let edge_base = common::serve(create_router(Arc::new(AppState::new(edge_config)))).await;

    let config = Config {
        auth_api_url: format!("{}/api/auth", backend_base),
        api_url: backend_base,
        site_url: edge_base.clone(),
        ..Config::default()
    };
    let navigator = Arc::new(NavigationLog::new());
    let client = SessionClient::from_config(config, navigator.clone()).unwrap();

    Harness {
        client,
        navigator,
        edge: edge_base,
        _pages: pages,
    }
}

impl Harness {
    /// Fetch a page from the edge server, following redirects, and return
    /// the final path.
    async fn visit(&self, path: &str) -> String {
        let api = &self.client.api;
        let response = api
            .send(api.http().request(Method::GET, format!("{}{}", self.edge, path)))
            .await
            .unwrap();
        response.url().path().to_string()
    }
}

#[tokio::test]
async fn test_anonymous_visit_lands_on_login() {
    let h = harness(&["ROLE_USER"]).await;
    let _watch = h.client.start();

    assert_eq!(h.client.context.state().phase(), SessionPhase::Unauthenticated);
    assert!(h.visit("/dashboard").await.starts_with("/auth/login"));
}

#[tokio::test]
async fn test_login_cookies_reach_edge_guard() {
    let h = harness(&["ROLE_USER"]).await;
    let _watch = h.client.start();

    h.client.context.login("ana", "secret1").await.unwrap();

    assert_eq!(h.client.context.state().phase(), SessionPhase::Authenticated);
    assert!(h.client.session.store().get(cookies::ACCESS_TOKEN).is_some());
    assert!(h.visit("/dashboard").await.starts_with("/dashboard"));
    // A plain user is bounced from admin pages to the landing view
    assert!(h.visit("/admin").await.starts_with("/dashboard"));
}

#[tokio::test]
async fn test_admin_reaches_admin_pages() {
    let h = harness(&["ROLE_ADMIN"]).await;
    h.client.context.login("ana", "secret1").await.unwrap();

    assert!(h.visit("/admin").await.starts_with("/admin"));
    assert!(h.client.session.is_admin());
}

#[tokio::test]
async fn test_logout_removes_cookies() {
    let h = harness(&["ROLE_USER"]).await;
    h.client.context.login("ana", "secret1").await.unwrap();
    assert!(h.visit("/dashboard").await.starts_with("/dashboard"));

    h.client.context.logout();

    assert_eq!(h.navigator.last().as_deref(), Some("/"));
    for key in cookies::ALL {
        assert_eq!(h.client.session.store().get(key), None, "{} should be gone", key);
    }
    assert!(h.visit("/dashboard").await.starts_with("/auth/login"));
}

#[tokio::test]
async fn test_session_survives_new_context() {
    let h = harness(&["ROLE_ADMIN"]).await;
    h.client.context.login("ana", "secret1").await.unwrap();

    // A fresh context over the same store restores the session
    let restored = padel_session::context::SessionContext::new(
        h.client.session.clone(),
        h.navigator.clone(),
    );
    assert!(restored.initialize().is_none());

    let state = restored.state();
    assert_eq!(state.phase(), SessionPhase::Authenticated);
    assert_eq!(state.roles, vec!["ROLE_ADMIN"]);

    let guard = h.client.guard(Access::Admin);
    assert_eq!(guard.enforce(&restored, "/admin"), GuardDecision::Render);
}

#[tokio::test]
async fn test_transport_logout_updates_context() {
    let h = harness(&["ROLE_ADMIN"]).await;
    let _watch = h.client.start();
    h.client.context.login("ana", "secret1").await.unwrap();
    let guard = h.client.guard(Access::Admin);
    assert_eq!(guard.decide(&h.client.context.state(), "/admin"), GuardDecision::Render);

    let err = h.client.account().token_balance().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!h.client.session.is_logged_in());
    let state = h.client.context.state();
    assert_eq!(state.phase(), SessionPhase::Unauthenticated);
    assert_eq!(state.user, None);
    assert!(state.roles.is_empty());
    assert_eq!(
        guard.decide(&state, "/admin"),
        GuardDecision::Redirect("/auth/login?callbackUrl=%2Fadmin".to_string())
    );

    // The periodic check has nothing left to do and keeps the expired redirect
    assert_eq!(h.client.context.check_expiry().await, ExpiryCheck::Idle);
    assert_eq!(h.navigator.history(), vec!["/auth/login?expired=true"]);
    assert!(h.visit("/admin").await.starts_with("/auth/login"));
}
