// SPDX-FileCopyrightText: 2025 Caution SEZC
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

//! The per-request authorization decision. Every route that is not
//! `/login` or `/logout` passes through here before any byte reaches
//! the upstream.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::SESSION_COOKIE;
use crate::handlers::{redirect, urlencode};
use crate::types::AppState;
use crate::{cookies, session};

pub async fn require_session(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let authenticated = cookies::get(req.headers(), SESSION_COOKIE)
        .map(|token| session::verify(&state.config.cookie_secret, &token))
        .unwrap_or(false);

    if authenticated {
        return next.run(req).await;
    }

    // An upgrade handshake cannot follow a redirect; reject it outright
    // and close the socket. The client retries after logging in over
    // plain HTTP.
    if is_websocket_upgrade(req.headers()) {
        tracing::debug!(path = %req.uri().path(), "rejected unauthenticated websocket upgrade");
        return Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .header(header::CONNECTION, "close")
            .body(Body::from("Unauthorized"))
            .unwrap_or_else(|_| StatusCode::UNAUTHORIZED.into_response());
    }

    let uri = req.uri();
    let original = match uri.query() {
        Some(query) => format!("{}?{query}", uri.path()),
        None => uri.path().to_string(),
    };
    tracing::debug!(target = %original, "redirecting unauthenticated request to login");
    redirect(&format!("/login?next={}", urlencode(&original)))
}

pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}
