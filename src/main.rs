// SPDX-FileCopyrightText: 2025 Caution SEZC
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod cookies;
mod csrf;
mod gate;
mod handlers;
mod page;
mod proxy;
mod session;
mod types;
mod validation;

use config::Config;
use types::AppState;

fn app(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route(
            "/login",
            get(handlers::login_form).post(handlers::login_submit),
        )
        .route("/logout", post(handlers::logout))
        .with_state(state.clone());

    // Everything else, HTTP and upgrade alike, goes through the gate
    // and on to the upstream.
    let gated = Router::new()
        .fallback(proxy::forward)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_session,
        ))
        .with_state(state);

    auth_routes.merge(gated).layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    // A transparent proxy relays upstream redirects to the client
    // rather than following them itself.
    let http = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Failed to build upstream HTTP client")?;

    let state = AppState {
        config: Arc::new(config),
        http,
    };

    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!(
        "Gateway listening on {}, upstream {}",
        addr,
        state.config.upstream_url
    );

    axum::serve(listener, app(state)).await.context("Server error")?;

    Ok(())
}
