// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the session layer and the account API.

pub mod account;
pub mod role;
pub mod session;

pub use account::{ChangePasswordData, Reservation, TokenBalance, UpdateProfileData, UserProfile};
pub use role::{Access, Role};
pub use session::{
    LoginData, LoginResponse, RefreshResponse, RegisterData, SessionData, UserSnapshot,
};
