// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Padel-Session: session and access control for the court-booking front end
//!
//! The client side (credential store, session service, authenticated
//! transport, session context, route guard) is assembled by
//! [`client::SessionClient`]. The server side is an edge server that guards
//! page requests by cookie before serving them, see [`routes::create_router`].

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod routes;
pub mod services;
pub mod store;

use config::Config;
use middleware::RouteRules;

/// Shared edge server state.
pub struct AppState {
    pub config: Config,
    pub rules: RouteRules,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let rules = RouteRules::from(&config.routes);
        Self { config, rules }
    }
}
