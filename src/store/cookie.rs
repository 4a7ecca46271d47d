// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cookie backend over a `reqwest` cookie jar.
//!
//! The jar is shared with the HTTP client, so credential cookies written
//! here are sent on every request to the site, which is what the edge guard
//! reads.

use super::{CookieBackend, StorageError};
use axum_extra::extract::cookie::Cookie;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use std::sync::Arc;

/// Cookie jar scoped to one site origin.
#[derive(Clone)]
pub struct JarCookies {
    jar: Arc<Jar>,
    site: Url,
}

impl JarCookies {
    pub fn new(jar: Arc<Jar>, site: Url) -> Self {
        Self { jar, site }
    }

    /// The underlying jar, for `reqwest::ClientBuilder::cookie_provider`.
    pub fn jar(&self) -> Arc<Jar> {
        self.jar.clone()
    }
}

impl CookieBackend for JarCookies {
    fn write(&self, cookie: Cookie<'static>) -> Result<(), StorageError> {
        self.jar.add_cookie_str(&cookie.to_string(), &self.site);
        Ok(())
    }

    fn read(&self, name: &str) -> Result<Option<String>, StorageError> {
        let Some(header) = self.jar.cookies(&self.site) else {
            return Ok(None);
        };
        let header = header
            .to_str()
            .map_err(|e| StorageError::Unavailable(format!("cookie header: {}", e)))?;

        Ok(header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string()))
    }

    fn expire(&self, cookie: Cookie<'static>) -> Result<(), StorageError> {
        self.jar.add_cookie_str(&cookie.to_string(), &self.site);
        Ok(())
    }
}
