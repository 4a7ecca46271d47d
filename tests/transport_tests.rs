// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated transport tests.
//!
//! One mock server plays both the domain API and the auth backend. The
//! protected endpoint only accepts the bearer token `A2`, which the refresh
//! endpoint hands out.

mod common;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use common::Hits;
use padel_session::config::cookies;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Counters {
    api: Hits,
    refresh: Hits,
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn backend(counters: Counters, refresh_status: StatusCode) -> Router {
    let api_hits = counters.api.clone();
    let echo_hits = counters.api.clone();
    let refresh_hits = counters.refresh.clone();

    Router::new()
        .route(
            "/api/tokens/balance",
            get(move |headers: HeaderMap| {
                let hits = api_hits.clone();
                async move {
                    hits.bump();
                    if bearer(&headers).as_deref() == Some("Bearer A2") {
                        (StatusCode::OK, Json(json!({"balance": 5})))
                    } else {
                        (StatusCode::UNAUTHORIZED, Json(json!({"message": "expired"})))
                    }
                }
            }),
        )
        .route(
            "/api/echo",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let hits = echo_hits.clone();
                async move {
                    hits.bump();
                    if bearer(&headers).as_deref() == Some("Bearer A2") {
                        (StatusCode::OK, Json(body))
                    } else {
                        (StatusCode::UNAUTHORIZED, Json(json!({"message": "expired"})))
                    }
                }
            }),
        )
        .route(
            "/api/always-401",
            get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "nope"}))) }),
        )
        .route(
            "/api/forbidden",
            get(|| async { (StatusCode::FORBIDDEN, Json(json!({"message": "Admins only"}))) }),
        )
        .route(
            "/api/auth/refresh-token",
            post(move || {
                let hits = refresh_hits.clone();
                async move {
                    hits.bump();
                    if refresh_status.is_success() {
                        (refresh_status, Json(json!({"accessToken": "A2"})))
                    } else {
                        (refresh_status, Json(json!({"message": "refresh rejected"})))
                    }
                }
            }),
        )
}

#[tokio::test]
async fn test_bearer_header_attached() {
    let counters = Counters::default();
    let base = common::serve(backend(counters.clone(), StatusCode::OK)).await;
    let session = common::session_service(&format!("{}/api/auth", base));
    session.store().set(cookies::ACCESS_TOKEN, "A2");
    let (api, navigator) = common::api_client(&base, session);

    let body: Value = api.get_json("/api/tokens/balance").await.unwrap();

    assert_eq!(body["balance"], 5);
    assert_eq!(counters.api.count(), 1);
    assert_eq!(counters.refresh.count(), 0);
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn test_401_refreshes_once_and_replays() {
    let counters = Counters::default();
    let base = common::serve(backend(counters.clone(), StatusCode::OK)).await;
    let session = common::session_service(&format!("{}/api/auth", base));
    session.store().set(cookies::ACCESS_TOKEN, "A1");
    session.store().set(cookies::REFRESH_TOKEN, "R1");
    let (api, navigator) = common::api_client(&base, session.clone());

    let body: Value = api.get_json("/api/tokens/balance").await.unwrap();

    assert_eq!(body["balance"], 5);
    assert_eq!(counters.refresh.count(), 1);
    assert_eq!(counters.api.count(), 2);
    assert_eq!(session.access_token().as_deref(), Some("A2"));
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn test_replay_resends_body() {
    let counters = Counters::default();
    let base = common::serve(backend(counters.clone(), StatusCode::OK)).await;
    let session = common::session_service(&format!("{}/api/auth", base));
    session.store().set(cookies::ACCESS_TOKEN, "A1");
    session.store().set(cookies::REFRESH_TOKEN, "R1");
    let (api, _navigator) = common::api_client(&base, session);

    let body: Value = api
        .post_json("/api/echo", &json!({"court": 3}))
        .await
        .unwrap();

    assert_eq!(body, json!({"court": 3}));
    assert_eq!(counters.api.count(), 2);
}

#[tokio::test]
async fn test_401_without_refresh_token_logs_out() {
    let counters = Counters::default();
    let base = common::serve(backend(counters.clone(), StatusCode::OK)).await;
    let session = common::session_service(&format!("{}/api/auth", base));
    session.store().set(cookies::ACCESS_TOKEN, "A1");
    session.store().set(cookies::USER_ROLES, r#"["ROLE_USER"]"#);
    let (api, navigator) = common::api_client(&base, session.clone());

    let err = api
        .get_json::<Value>("/api/tokens/balance")
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(counters.refresh.count(), 0);
    assert_eq!(counters.api.count(), 1);
    assert!(!session.is_logged_in());
    assert!(session.get_roles().is_empty());
    assert_eq!(navigator.history(), vec!["/auth/login?expired=true"]);
}

#[tokio::test]
async fn test_failed_refresh_logs_out() {
    let counters = Counters::default();
    let base = common::serve(backend(counters.clone(), StatusCode::UNAUTHORIZED)).await;
    let session = common::session_service(&format!("{}/api/auth", base));
    session.store().set(cookies::ACCESS_TOKEN, "A1");
    session.store().set(cookies::REFRESH_TOKEN, "R1");
    let (api, navigator) = common::api_client(&base, session.clone());

    let err = api
        .get_json::<Value>("/api/tokens/balance")
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(counters.refresh.count(), 1);
    assert_eq!(counters.api.count(), 1);
    assert!(!session.is_logged_in());
    assert_eq!(session.stored_refresh_token(), None);
    assert_eq!(navigator.last().as_deref(), Some("/auth/login?expired=true"));
}

#[tokio::test]
async fn test_second_401_is_returned_without_another_refresh() {
    let counters = Counters::default();
    let base = common::serve(backend(counters.clone(), StatusCode::OK)).await;
    let session = common::session_service(&format!("{}/api/auth", base));
    session.store().set(cookies::ACCESS_TOKEN, "A1");
    session.store().set(cookies::REFRESH_TOKEN, "R1");
    let (api, navigator) = common::api_client(&base, session.clone());

    let err = api.get_json::<Value>("/api/always-401").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(counters.refresh.count(), 1);
    // The refreshed session is kept; only the caller sees the failure
    assert!(session.is_logged_in());
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn test_other_errors_pass_through() {
    let counters = Counters::default();
    let base = common::serve(backend(counters.clone(), StatusCode::OK)).await;
    let session = common::session_service(&format!("{}/api/auth", base));
    session.store().set(cookies::ACCESS_TOKEN, "A1");
    session.store().set(cookies::REFRESH_TOKEN, "R1");
    let (api, navigator) = common::api_client(&base, session.clone());

    let err = api.get_json::<Value>("/api/forbidden").await.unwrap_err();

    assert_eq!(err.status(), Some(reqwest::StatusCode::FORBIDDEN));
    assert!(err.to_string().contains("Admins only"));
    assert_eq!(counters.refresh.count(), 0);
    assert!(session.is_logged_in());
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn test_custom_login_path() {
    let counters = Counters::default();
    let base = common::serve(backend(counters.clone(), StatusCode::OK)).await;
    let session = common::session_service(&format!("{}/api/auth", base));
    let (api, navigator) = common::api_client(&base, session);
    let api = api.with_login_path("/signin");

    let _ = api.get_json::<Value>("/api/tokens/balance").await;

    assert_eq!(navigator.last().as_deref(), Some("/signin?expired=true"));
}
