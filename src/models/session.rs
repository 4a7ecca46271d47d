//! Authentication payloads and the canonical session record.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST {auth-base}/signin`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginData {
    pub username: String,
    pub password: String,
}

/// Body of `POST {auth-base}/signup`.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters"))]
    pub username: String,

    #[validate(email(message = "Email address is invalid"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,
}

/// Login response as the backend may send it.
///
/// Two naming conventions are in the wild: the bearer credential arrives as
/// either `token` or `accessToken`, and its type as either `type` or
/// `tokenType`. Everything else may be missing. [`SessionData::from`] maps
/// both shapes onto one canonical record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginResponse {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture_url: Option<String>,
    pub roles: Option<Vec<String>>,
    pub token: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub token_type: Option<String>,
}

/// Canonical session data produced by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub profile_picture_url: Option<String>,
    pub roles: Vec<String>,
    /// Empty when the backend sent no usable token.
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl From<LoginResponse> for SessionData {
    fn from(raw: LoginResponse) -> Self {
        Self {
            id: raw.id.unwrap_or(0),
            username: raw.username.unwrap_or_default(),
            email: raw.email.unwrap_or_default(),
            first_name: raw.first_name.unwrap_or_default(),
            last_name: raw.last_name.unwrap_or_default(),
            phone_number: raw.phone_number.unwrap_or_default(),
            profile_picture_url: non_empty(raw.profile_picture_url),
            roles: raw.roles.unwrap_or_default(),
            access_token: non_empty(raw.token)
                .or_else(|| non_empty(raw.access_token))
                .unwrap_or_default(),
            refresh_token: non_empty(raw.refresh_token),
            token_type: non_empty(raw.kind)
                .or_else(|| non_empty(raw.token_type))
                .unwrap_or_else(|| "Bearer".to_string()),
        }
    }
}

impl SessionData {
    /// Whether normalization found a bearer credential.
    pub fn has_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Identity fields persisted alongside the token.
    pub fn user_snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// Denormalized identity stored in the `userData` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSnapshot {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Body of a successful `POST {auth-base}/refresh-token`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}
