// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account endpoints consumed through the authenticated transport.

use crate::error::Result;
use crate::models::{ChangePasswordData, Reservation, TokenBalance, UpdateProfileData, UserProfile};
use crate::services::transport::ApiClient;

/// Profile, password, balance and reservation calls for the signed-in user.
#[derive(Clone)]
pub struct AccountApi {
    api: ApiClient,
}

/// Dashboard data. Parts that failed to load hold their defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub profile: Option<UserProfile>,
    pub balance: TokenBalance,
    pub reservations: Vec<Reservation>,
    /// Names of the fetches that failed.
    pub failed: Vec<&'static str>,
}

impl Dashboard {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl AccountApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn profile(&self) -> Result<UserProfile> {
        self.api.get_json("/api/users/profile").await
    }

    pub async fn update_profile(&self, data: &UpdateProfileData) -> Result<UserProfile> {
        self.api.put_json("/api/users/profile", data).await
    }

    /// Errors, including a wrong current password, are returned unchanged.
    pub async fn change_password(&self, data: &ChangePasswordData) -> Result<()> {
        self.api.post("/api/users/change-password", data).await
    }

    pub async fn token_balance(&self) -> Result<TokenBalance> {
        self.api.get_json("/api/tokens/balance").await
    }

    pub async fn reservations(&self) -> Result<Vec<Reservation>> {
        self.api.get_json("/api/users/reservations").await
    }

    /// Fetch profile, balance and reservations concurrently.
    ///
    /// A failing fetch is replaced by its default and recorded in
    /// [`Dashboard::failed`]; it never prevents the others from completing.
    pub async fn load_dashboard(&self) -> Dashboard {
        let (profile, balance, reservations) =
            tokio::join!(self.profile(), self.token_balance(), self.reservations());

        let mut dashboard = Dashboard::default();

        match profile {
            Ok(p) => dashboard.profile = Some(p),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load profile");
                dashboard.failed.push("profile");
            }
        }
        match balance {
            Ok(b) => dashboard.balance = b,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load token balance");
                dashboard.failed.push("balance");
            }
        }
        match reservations {
            Ok(r) => dashboard.reservations = r,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load reservations");
                dashboard.failed.push("reservations");
            }
        }

        dashboard
    }
}
