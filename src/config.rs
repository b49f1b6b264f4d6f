// SPDX-FileCopyrightText: 2025 Caution SEZC
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use anyhow::{bail, Context, Result};
use std::env;
use url::Url;

/// Cookie names are a deployment-fixed pair; the CSRF cookie lives under
/// a sibling name so the two can never collide with upstream cookies.
pub const SESSION_COOKIE: &str = "gateway_session";
pub const CSRF_COOKIE: &str = "gateway_csrf";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub upstream_url: String,
    pub password: String,
    pub cookie_secret: String,
    pub session_ttl_hours: i64,
    pub secure_cookie: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "4096".to_string())
            .parse()
            .context("Invalid PORT")?;

        let upstream_url = env::var("UPSTREAM_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
        let upstream_url = upstream_url.trim_end_matches('/').to_string();

        Url::parse(&upstream_url).context("Invalid UPSTREAM_URL")?;

        let password = env::var("AUTH_PASSWORD").unwrap_or_default();
        if password.is_empty() {
            bail!("Missing AUTH_PASSWORD. Set it in the environment before starting the gateway.");
        }

        let cookie_secret = env::var("AUTH_COOKIE_SECRET").unwrap_or_default();
        if cookie_secret.is_empty() {
            bail!("Missing AUTH_COOKIE_SECRET. Set it in the environment before starting the gateway.");
        }

        let session_ttl_hours: i64 = env::var("AUTH_SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .context("Invalid AUTH_SESSION_TTL_HOURS")?;

        let secure_cookie = env::var("AUTH_SECURE_COOKIE")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Config {
            port,
            upstream_url,
            password,
            cookie_secret,
            session_ttl_hours,
            secure_cookie,
        })
    }
}
