// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Every setting has a development default, so a bare checkout talks to a
//! backend on `localhost:8080` and serves the front end on port 3000.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Cookie names shared between the client-side credential store and the
/// edge guard. These are a wire contract and must not change.
pub mod cookies {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const USER_DATA: &str = "userData";
    pub const USER_ROLES: &str = "userRoles";

    /// All credential entries, in the order login writes them.
    pub const ALL: [&str; 4] = [USER_DATA, ACCESS_TOKEN, REFRESH_TOKEN, USER_ROLES];
}

const DEFAULT_PUBLIC_ROUTES: &[&str] = &[
    "/auth/login",
    "/auth/register",
    "/auth/forgot-password",
    "/",
    "/about",
    "/contact",
    "/terms",
    "/privacy",
    "/faq",
];
const DEFAULT_ADMIN_ROUTES: &[&str] = &["/admin"];
const DEFAULT_SUPER_ADMIN_ROUTES: &[&str] = &["/super-admin"];

/// Path prefix lists used by the edge guard to classify requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    /// Always reachable, no credentials required.
    pub public: Vec<String>,
    /// Require `ROLE_ADMIN` or `ROLE_SUPER_ADMIN`.
    pub admin: Vec<String>,
    /// Require `ROLE_SUPER_ADMIN`.
    pub super_admin: Vec<String>,
    /// Login view; unauthenticated requests are sent here.
    pub login_path: String,
    /// Default authenticated landing view; under-privileged requests go here.
    pub landing_path: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            public: to_owned_list(DEFAULT_PUBLIC_ROUTES),
            admin: to_owned_list(DEFAULT_ADMIN_ROUTES),
            super_admin: to_owned_list(DEFAULT_SUPER_ADMIN_ROUTES),
            login_path: "/auth/login".to_string(),
            landing_path: "/dashboard".to_string(),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the authentication endpoints (`/signin`, `/signup`, `/refresh-token`)
    pub auth_api_url: String,
    /// Base URL for domain endpoints called through the authenticated transport
    pub api_url: String,
    /// Origin of the front end; credential cookies are scoped to it
    pub site_url: String,
    /// `true` when running with `APP_ENV=production` (enables `Secure` cookies)
    pub production: bool,
    /// Edge server port
    pub port: u16,
    /// Directory with the pre-built front end
    pub static_dir: String,
    /// Credential cookie lifetime in days
    pub cookie_expiry_days: i64,
    /// Tokens expiring within this window are treated as expired
    pub token_expiry_buffer: Duration,
    /// How often the session context re-checks token expiry
    pub token_check_interval: Duration,
    /// JSON file backing the fallback store; in-memory when `None`
    pub fallback_store_path: Option<String>,
    /// Edge guard route classification
    pub routes: RouteConfig,
}

impl Default for Config {
    /// Default config for local development and tests.
    fn default() -> Self {
        Self {
            auth_api_url: "http://localhost:8080/api/auth".to_string(),
            api_url: "http://localhost:8080".to_string(),
            site_url: "http://localhost:3000".to_string(),
            production: false,
            port: 3000,
            static_dir: "public".to_string(),
            cookie_expiry_days: 7,
            token_expiry_buffer: Duration::from_secs(60),
            token_check_interval: Duration::from_secs(60),
            fallback_store_path: None,
            routes: RouteConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development. Unset or
    /// unparseable values fall back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        let site_url = env::var("SITE_URL").unwrap_or(defaults.site_url);
        reqwest::Url::parse(&site_url).map_err(|e| ConfigError::Invalid {
            name: "SITE_URL",
            reason: e.to_string(),
        })?;

        Ok(Self {
            auth_api_url: env::var("AUTH_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.auth_api_url),
            api_url: env::var("API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            site_url,
            production: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            port: parse_or("PORT", defaults.port),
            static_dir: env::var("STATIC_DIR").unwrap_or(defaults.static_dir),
            cookie_expiry_days: parse_or("COOKIE_EXPIRY_DAYS", defaults.cookie_expiry_days),
            token_expiry_buffer: Duration::from_secs(parse_or(
                "TOKEN_EXPIRY_BUFFER_SECS",
                defaults.token_expiry_buffer.as_secs(),
            )),
            token_check_interval: Duration::from_secs(parse_or(
                "TOKEN_CHECK_INTERVAL_SECS",
                defaults.token_check_interval.as_secs(),
            )),
            fallback_store_path: env::var("FALLBACK_STORE_PATH").ok(),
            routes: RouteConfig {
                public: list_or("PUBLIC_ROUTES", defaults.routes.public),
                admin: list_or("ADMIN_ROUTES", defaults.routes.admin),
                super_admin: list_or("SUPER_ADMIN_ROUTES", defaults.routes.super_admin),
                ..defaults.routes
            },
        })
    }

    /// The site origin as a URL, used to scope the cookie jar.
    pub fn site(&self) -> Result<reqwest::Url, ConfigError> {
        reqwest::Url::parse(&self.site_url).map_err(|e| ConfigError::Invalid {
            name: "SITE_URL",
            reason: e.to_string(),
        })
    }
}

fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn list_or(name: &str, default: Vec<String>) -> Vec<String> {
    match env::var(name) {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => default,
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
