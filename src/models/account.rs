//! Account models served by the `/api/users` and `/api/tokens` endpoints.

use serde::{Deserialize, Serialize};

/// Profile of the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub playing_level: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub notifications_enabled: Option<bool>,
}

/// Partial profile update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playing_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_enabled: Option<bool>,
}

/// Body of `POST /api/users/change-password`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordData {
    pub current_password: String,
    pub new_password: String,
}

/// Token balance of the signed-in user. Defaults to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    #[serde(default)]
    pub user_id: i64,
    pub balance: i64,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Court reservation as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    #[serde(default)]
    pub terrain_name: Option<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub token_cost: Option<i64>,
}
