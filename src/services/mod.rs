// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - authentication and API calls.

pub mod account;
pub mod jwt;
pub mod session;
pub mod transport;

pub use account::{AccountApi, Dashboard};
pub use session::{SessionEvent, SessionService};
pub use transport::ApiClient;
