// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential store: cookie-first persistence with a local fallback.
//!
//! Every write goes to the cookie backend and is read back. A write that
//! does not stick is retried without the `Domain` attribute, and if that
//! also fails the value lands in the local key-value backend. Reads consult
//! the cookie first and the fallback second.
//!
//! Storage failures never escape this module: writes report a
//! [`WriteOutcome`], reads return `None`.

pub mod cookie;
pub mod local;

pub use self::cookie::JarCookies;
pub use local::{FileStore, MemoryStore};

use crate::config::{cookies, Config};
use axum_extra::extract::cookie::{Cookie, SameSite};
use std::sync::Arc;
use time::OffsetDateTime;

/// Storage backend failure. Converted into outcomes by [`CredentialStore`].
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Primary mechanism: an HTTP cookie jar scoped to the site.
pub trait CookieBackend: Send + Sync {
    /// Store a cookie. Backends may silently drop cookies they reject.
    fn write(&self, cookie: Cookie<'static>) -> Result<(), StorageError>;
    /// Raw (still encoded) value of the named cookie.
    fn read(&self, name: &str) -> Result<Option<String>, StorageError>;
    /// Apply an already-expired cookie, deleting any match.
    fn expire(&self, cookie: Cookie<'static>) -> Result<(), StorageError>;
}

/// Secondary mechanism: a plain key-value store.
pub trait LocalBackend: Send + Sync {
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Where a [`CredentialStore::set`] ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Cookie written on the first attempt.
    Primary,
    /// Cookie written after retrying without the `Domain` attribute.
    PrimaryRetry,
    /// Cookie writes failed; value stored in the local backend.
    Fallback,
    /// Nothing could be stored.
    Failed,
}

impl WriteOutcome {
    pub fn is_stored(&self) -> bool {
        !matches!(self, WriteOutcome::Failed)
    }
}

/// Attributes applied to every credential cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub expiry_days: i64,
    pub secure: bool,
    /// `Domain` attribute for the first write attempt.
    pub domain: Option<String>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            expiry_days: 7,
            secure: false,
            domain: None,
        }
    }
}

impl CookieOptions {
    /// Cookie options for the configured site. An explicit `Domain` is only
    /// tried for `localhost`; elsewhere cookies stay host-only.
    pub fn from_config(config: &Config) -> Self {
        let domain = config
            .site()
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .filter(|host| host == "localhost");

        Self {
            expiry_days: config.cookie_expiry_days,
            secure: config.production,
            domain,
        }
    }

    fn cookie(&self, name: &str, value: String, domain: Option<&str>) -> Cookie<'static> {
        let mut builder = Cookie::build((name.to_string(), value))
            .path("/")
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .expires(OffsetDateTime::now_utc() + time::Duration::days(self.expiry_days));
        if let Some(domain) = domain {
            builder = builder.domain(domain.to_string());
        }
        builder.build()
    }

    fn removal(&self, name: &str, domain: Option<&str>) -> Cookie<'static> {
        let mut builder = Cookie::build((name.to_string(), String::new()))
            .path("/")
            .max_age(time::Duration::ZERO);
        if let Some(domain) = domain {
            builder = builder.domain(domain.to_string());
        }
        builder.build()
    }
}

/// Persistence for the four credential entries.
#[derive(Clone)]
pub struct CredentialStore {
    cookies: Arc<dyn CookieBackend>,
    local: Arc<dyn LocalBackend>,
    options: CookieOptions,
}

impl CredentialStore {
    pub fn new(
        cookies: Arc<dyn CookieBackend>,
        local: Arc<dyn LocalBackend>,
        options: CookieOptions,
    ) -> Self {
        Self {
            cookies,
            local,
            options,
        }
    }

    /// Store backed entirely by memory (headless clients, tests).
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            CookieOptions::default(),
        )
    }

    /// Write `value` under `key`, falling back as described in the module docs.
    pub fn set(&self, key: &str, value: &str) -> WriteOutcome {
        tracing::debug!(key = %key, "Setting credential cookie");

        let encoded = urlencoding::encode(value).into_owned();
        let first = self
            .options
            .cookie(key, encoded.clone(), self.options.domain.as_deref());
        if self.write_verified(key, value, first, 1) {
            return WriteOutcome::Primary;
        }

        tracing::debug!(key = %key, "Cookie not set on first attempt, retrying without domain");
        let second = self.options.cookie(key, encoded, None);
        if self.write_verified(key, value, second, 2) {
            return WriteOutcome::PrimaryRetry;
        }

        tracing::warn!(key = %key, "Failed to set cookie, using local fallback");
        match self.local.set_item(key, value) {
            Ok(()) => WriteOutcome::Fallback,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Fallback storage write failed");
                WriteOutcome::Failed
            }
        }
    }

    /// Cookie value first, then the fallback. Empty values count as absent.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.read_cookie(key) {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(e) => tracing::warn!(key = %key, error = %e, "Error reading cookie"),
        }

        match self.local.get_item(key) {
            Ok(Some(value)) if !value.is_empty() => {
                tracing::debug!(key = %key, "Using local fallback");
                Some(value)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Error reading fallback storage");
                None
            }
        }
    }

    /// Delete `key` from both backends. Removing an absent key is fine.
    ///
    /// Returns `false` if a backend reported an error.
    pub fn remove(&self, key: &str) -> bool {
        let mut clean = true;

        let mut removals = vec![self.options.removal(key, None)];
        if let Some(domain) = self.options.domain.as_deref() {
            removals.push(self.options.removal(key, Some(domain)));
        }
        for removal in removals {
            if let Err(e) = self.cookies.expire(removal) {
                tracing::warn!(key = %key, error = %e, "Error removing cookie");
                clean = false;
            }
        }

        if let Err(e) = self.local.remove_item(key) {
            tracing::warn!(key = %key, error = %e, "Error removing fallback entry");
            clean = false;
        }

        clean
    }

    /// Remove every credential entry.
    pub fn clear(&self) -> bool {
        cookies::ALL
            .iter()
            .fold(true, |clean, key| self.remove(key) && clean)
    }

    fn write_verified(&self, key: &str, value: &str, cookie: Cookie<'static>, attempt: u8) -> bool {
        if let Err(e) = self.cookies.write(cookie) {
            tracing::warn!(key = %key, attempt, error = %e, "Cookie write failed");
            return false;
        }
        matches!(self.read_cookie(key), Ok(Some(stored)) if stored == value)
    }

    fn read_cookie(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .cookies
            .read(key)?
            .filter(|raw| !raw.is_empty())
            .map(|raw| decode_cookie_value(&raw)))
    }
}

/// Percent-decode a cookie value, keeping the raw text if it is not valid UTF-8.
pub fn decode_cookie_value(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove_in_memory() {
        let store = CredentialStore::in_memory();

        assert_eq!(store.set(cookies::USER_ROLES, r#"["ROLE_ADMIN"]"#), WriteOutcome::Primary);
        assert_eq!(
            store.get(cookies::USER_ROLES).as_deref(),
            Some(r#"["ROLE_ADMIN"]"#)
        );

        assert!(store.remove(cookies::USER_ROLES));
        assert_eq!(store.get(cookies::USER_ROLES), None);
        // Second removal of an absent key is still clean
        assert!(store.remove(cookies::USER_ROLES));
    }

    #[test]
    fn test_cookie_attributes() {
        let options = CookieOptions {
            expiry_days: 7,
            secure: true,
            domain: Some("localhost".to_string()),
        };
        let cookie = options.cookie("accessToken", "abc".to_string(), Some("localhost"));
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("accessToken=abc"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("Domain=localhost"));
        assert!(rendered.contains("Expires="));
    }

    #[test]
    fn test_options_from_config() {
        let config = Config::default();
        let options = CookieOptions::from_config(&config);
        assert_eq!(options.domain.as_deref(), Some("localhost"));
        assert!(!options.secure);

        let config = Config {
            site_url: "https://padel.example.com".to_string(),
            production: true,
            ..Config::default()
        };
        let options = CookieOptions::from_config(&config);
        assert_eq!(options.domain, None);
        assert!(options.secure);
    }

    #[test]
    fn test_decode_cookie_value() {
        assert_eq!(
            decode_cookie_value("%5B%22ROLE_ADMIN%22%5D"),
            r#"["ROLE_ADMIN"]"#
        );
        assert_eq!(decode_cookie_value("plain"), "plain");
    }
}
