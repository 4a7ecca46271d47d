// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules.

pub mod edge;

pub use edge::{edge_guard, RouteRules};
