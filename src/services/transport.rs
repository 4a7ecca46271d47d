// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated transport for domain API calls.
//!
//! Handles:
//! - Bearer header from the stored access token on every request
//! - One refresh-and-replay on `401 Unauthorized`
//! - Logout and redirect to login when the refresh is not possible

use crate::error::{AppError, Result};
use crate::navigation::Navigator;
use crate::services::session::SessionService;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// HTTP client wrapper for the domain API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionService>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl ApiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: Arc<SessionService>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            navigator,
            login_path: "/auth/login".to_string(),
        }
    }

    /// Login view used for the session-expired redirect.
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn session(&self) -> &Arc<SessionService> {
        &self.session
    }

    /// The underlying client, for requests outside the API base URL.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Start a request against `{base_url}{path}`.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send a request built with [`ApiClient::request`].
    ///
    /// Non-success statuses come back as [`AppError::Http`]. A `401` on the
    /// first attempt triggers at most one refresh and one replay; if the
    /// refresh is impossible or fails, the session is cleared and the user
    /// is sent to the login view with `expired=true`.
    pub async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let mut request = builder.build()?;
        let mut retried = false;

        loop {
            let sent_token = self.authorize(&mut request);
            let replay = request.try_clone();
            let response = self.http.execute(request).await?;

            if response.status() != StatusCode::UNAUTHORIZED || retried {
                return check_status(response).await;
            }

            retried = true;
            let unauthorized = AppError::from_response(response).await;

            let refreshed = self.session.stored_refresh_token().is_some()
                && self.session.refresh_after(sent_token.as_deref()).await;

            if !refreshed {
                tracing::warn!("Session expired and could not be refreshed, logging out");
                self.session.logout();
                self.navigator
                    .navigate(&format!("{}?expired=true", self.login_path));
                return Err(unauthorized);
            }

            match replay {
                Some(next) => {
                    tracing::debug!("Replaying request with refreshed token");
                    request = next;
                }
                None => {
                    tracing::warn!("Request body cannot be replayed after refresh");
                    return Err(unauthorized);
                }
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        parse_json(response).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        parse_json(response).await
    }

    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .send(self.request(Method::PUT, path).json(body))
            .await?;
        parse_json(response).await
    }

    /// POST where the response body is irrelevant.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send(self.request(Method::POST, path).json(body))
            .await?;
        Ok(())
    }

    /// Attach the stored access token, returning the token sent.
    fn authorize(&self, request: &mut reqwest::Request) -> Option<String> {
        let token = self.session.access_token()?;
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("Stored access token is not a valid header value"),
        }
        Some(token)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(AppError::from_response(response).await)
    }
}

async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| AppError::Decode(e.to_string()))
}
