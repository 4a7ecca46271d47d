// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::Router;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use padel_session::navigation::NavigationLog;
use padel_session::services::{ApiClient, SessionService};
use padel_session::store::CredentialStore;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Hit counter shared between a mock handler and the test.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct Hits(Arc<AtomicUsize>);

#[allow(dead_code)]
impl Hits {
    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
#[allow(dead_code)]
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Mint an HS256 token whose `exp` is `now + secs`. The key is irrelevant
/// to the client, which never verifies signatures.
#[allow(dead_code)]
pub fn token_expiring_in(secs: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
        iat: i64,
    }

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: "ana".to_string(),
        exp: now + secs,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"backend_signing_key_not_shared!!"),
    )
    .expect("Failed to create JWT")
}

/// Session service talking to `auth_url` with an in-memory store.
#[allow(dead_code)]
pub fn session_service(auth_url: &str) -> Arc<SessionService> {
    Arc::new(SessionService::new(
        reqwest::Client::new(),
        auth_url,
        CredentialStore::in_memory(),
        Duration::from_secs(60),
    ))
}

/// Transport against `api_url` plus the navigation log it reports to.
#[allow(dead_code)]
pub fn api_client(api_url: &str, session: Arc<SessionService>) -> (ApiClient, Arc<NavigationLog>) {
    let navigator = Arc::new(NavigationLog::new());
    let client = ApiClient::new(reqwest::Client::new(), api_url, session, navigator.clone());
    (client, navigator)
}
