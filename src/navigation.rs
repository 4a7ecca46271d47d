// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side navigation seam.
//!
//! The transport, the session context and the route guard redirect the
//! user; what a redirect means (changing a view, opening a URL, nothing at
//! all) belongs to the embedding application.

use std::sync::Mutex;

/// Receives client-side redirects.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator that records every redirect in order.
#[derive(Debug, Default)]
pub struct NavigationLog {
    history: Mutex<Vec<String>>,
}

impl NavigationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.history.lock().ok().and_then(|h| h.last().cloned())
    }
}

impl Navigator for NavigationLog {
    fn navigate(&self, path: &str) {
        tracing::info!(path = %path, "Navigating");
        if let Ok(mut history) = self.history.lock() {
            history.push(path.to_string());
        }
    }
}
