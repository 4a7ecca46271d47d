// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for operations the user triggers directly.
//!
//! Backend rejections keep their HTTP status so callers can tell a bad
//! password (401) from a signup conflict (409) without a second taxonomy.

use reqwest::StatusCode;

/// Error surfaced by the session service, the transport and the API wrappers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("HTTP {status}: {message}")]
    Http { status: StatusCode, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Login response did not include an access token")]
    MissingToken,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status carried by the error, if the failure came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            AppError::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// True for `401 Unauthorized` responses.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Turn a non-success response into [`AppError::Http`], preferring the
    /// backend's `message` field when the body is JSON.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or(body);

        AppError::Http { status, message }
    }
}

/// Result type alias for session and API operations
pub type Result<T> = std::result::Result<T, AppError>;
