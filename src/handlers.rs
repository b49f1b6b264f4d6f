// SPDX-FileCopyrightText: 2025 Caution SEZC
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

//! Login flow: `GET /login`, `POST /login`, `POST /logout`.

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::config::{CSRF_COOKIE, SESSION_COOKIE};
use crate::page::{ERROR_SESSION_EXPIRED, ERROR_WRONG_PASSWORD};
use crate::types::AppState;
use crate::{cookies, csrf, page, session, validation};

const CSRF_TTL_SECONDS: i64 = 600;
const LOGIN_BODY_LIMIT: usize = 32 * 1024;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    next: String,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginForm {
    password: String,
    next: String,
    csrf: String,
}

pub fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub fn redirect(location: &str) -> Response {
    redirect_with_cookies(location, &[])
}

pub fn redirect_with_cookies(location: &str, set_cookies: &[String]) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location);
    for value in set_cookies {
        builder = builder.header(header::SET_COOKIE, value);
    }
    builder
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn redirect_to_login(next: &str, error_code: &str) -> Response {
    redirect(&format!(
        "/login?next={}&error={error_code}",
        urlencode(next)
    ))
}

fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, "Bad request").into_response()
}

/// Render the login form. Reuses an existing CSRF cookie when the
/// browser still has one, so re-rendering the page (e.g. after a failed
/// attempt) does not invalidate an open form in another tab.
pub async fn login_form(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    headers: HeaderMap,
) -> Response {
    let next = validation::sanitize_next(&query.next);
    let csrf_token = cookies::get(&headers, CSRF_COOKIE)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(csrf::mint);

    let body = page::login_page(next, &csrf_token, &query.error);
    (
        StatusCode::OK,
        [
            (header::CACHE_CONTROL, "no-store".to_string()),
            (
                header::SET_COOKIE,
                cookies::build(
                    CSRF_COOKIE,
                    &csrf_token,
                    CSRF_TTL_SECONDS,
                    state.config.secure_cookie,
                ),
            ),
        ],
        Html(body),
    )
        .into_response()
}

/// Validate the submission and either issue a session cookie or bounce
/// back to the form. A CSRF failure deliberately reports the same error
/// code as an expired session.
pub async fn login_submit(State(state): State<AppState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();

    let Ok(bytes) = axum::body::to_bytes(body, LOGIN_BODY_LIMIT).await else {
        return bad_request();
    };
    let Ok(form) = serde_urlencoded::from_bytes::<LoginForm>(&bytes) else {
        return bad_request();
    };

    let next = validation::sanitize_next(&form.next);
    let csrf_cookie = cookies::get(&parts.headers, CSRF_COOKIE).unwrap_or_default();

    if !csrf::verify(&form.csrf, &csrf_cookie) {
        tracing::debug!("login rejected: csrf token missing or mismatched");
        return redirect_to_login(next, ERROR_SESSION_EXPIRED);
    }

    if !csrf::digest_eq(&form.password, &state.config.password) {
        tracing::debug!("login rejected: wrong password");
        return redirect_to_login(next, ERROR_WRONG_PASSWORD);
    }

    let token = session::create(&state.config.cookie_secret, state.config.session_ttl_hours);
    let max_age = (state.config.session_ttl_hours * 3600).max(1);
    let secure = state.config.secure_cookie;

    tracing::info!(next = %next, "login succeeded, session issued");
    redirect_with_cookies(
        next,
        &[
            cookies::build(SESSION_COOKIE, &token, max_age, secure),
            cookies::build(CSRF_COOKIE, "", 0, secure),
        ],
    )
}

/// Overwrite the session cookie with an immediately-expiring empty
/// value. Idempotent: logging out while logged out is still a clean
/// redirect.
pub async fn logout(State(state): State<AppState>) -> Response {
    redirect_with_cookies(
        "/login",
        &[cookies::build(
            SESSION_COOKIE,
            "",
            0,
            state.config.secure_cookie,
        )],
    )
}
