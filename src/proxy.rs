// SPDX-FileCopyrightText: 2025 Caution SEZC
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

//! Forwarding to the upstream target: plain HTTP requests through the
//! shared reqwest client, WebSocket upgrades through a tungstenite
//! relay. Only authorized traffic reaches this module; the gate has
//! already made its decision.

use axum::{
    body::Body,
    extract::{
        ws::{self, WebSocket},
        Request, State, WebSocketUpgrade,
    },
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    RequestPartsExt,
};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};

use crate::gate;
use crate::types::AppState;

type Upstream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// End-to-end headers only; hop-by-hop headers are connection-local and
/// must not be relayed. `host` is set by the client from the target URL
/// and `content-length` is recomputed from the forwarded body.
const SKIP_HEADERS: &[&str] = &[
    "connection",
    "content-length",
    "host",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Bad gateway: cannot reach {upstream} for {path}")]
    Unreachable { upstream: String, path: String },
    #[error("Bad request")]
    Body,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match self {
            ProxyError::Unreachable { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::Body => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

pub async fn forward(State(state): State<AppState>, req: Request) -> Result<Response, ProxyError> {
    if gate::is_websocket_upgrade(req.headers()) {
        forward_upgrade(state, req).await
    } else {
        forward_http(state, req).await
    }
}

async fn forward_http(state: AppState, req: Request) -> Result<Response, ProxyError> {
    let path = path_and_query(req.uri());
    let target = format!("{}{path}", state.config.upstream_url);
    let method = req.method().clone();
    let request_headers = forwardable_headers(req.headers());

    tracing::debug!(%method, target = %target, "forwarding request upstream");

    let body = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .map_err(|_| ProxyError::Body)?;

    let upstream_response = state
        .http
        .request(method, target.as_str())
        .headers(request_headers)
        .body(body)
        .send()
        .await
        .map_err(|err| {
            tracing::warn!(%err, target = %target, "upstream request failed");
            ProxyError::Unreachable {
                upstream: state.config.upstream_url.clone(),
                path: path.clone(),
            }
        })?;

    let status = upstream_response.status();
    let response_headers = forwardable_headers(upstream_response.headers());
    let body_bytes = upstream_response.bytes().await.map_err(|err| {
        tracing::warn!(%err, target = %target, "upstream response body failed");
        ProxyError::Unreachable {
            upstream: state.config.upstream_url.clone(),
            path,
        }
    })?;

    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        headers.extend(response_headers);
    }
    Ok(builder
        .body(Body::from(body_bytes))
        .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response()))
}

/// The upstream connection is completed before the client handshake is
/// accepted, so an unreachable upstream still surfaces as a 502 instead
/// of an accepted-then-dropped socket.
async fn forward_upgrade(state: AppState, req: Request) -> Result<Response, ProxyError> {
    let path = path_and_query(req.uri());
    let target = format!("{}{path}", ws_base(&state.config.upstream_url));

    let (mut parts, _body) = req.into_parts();
    let upgrade = match parts.extract::<WebSocketUpgrade>().await {
        Ok(upgrade) => upgrade,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let (upstream, _response) = connect_async(target.as_str()).await.map_err(|err| {
        tracing::warn!(%err, target = %target, "upstream websocket connect failed");
        ProxyError::Unreachable {
            upstream: state.config.upstream_url.clone(),
            path,
        }
    })?;

    tracing::debug!(target = %target, "websocket relay established");
    Ok(upgrade.on_upgrade(move |client| relay(client, upstream)))
}

/// Full-duplex frame relay. Ends when either side closes or errors; the
/// select drops the other direction, closing both halves.
async fn relay(client: WebSocket, upstream: Upstream) {
    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    let client_to_upstream = async {
        while let Some(Ok(message)) = client_rx.next().await {
            let closing = matches!(message, ws::Message::Close(_));
            if upstream_tx.send(into_upstream(message)).await.is_err() || closing {
                break;
            }
        }
    };

    let upstream_to_client = async {
        while let Some(Ok(message)) = upstream_rx.next().await {
            let Some(message) = into_client(message) else {
                continue;
            };
            let closing = matches!(message, ws::Message::Close(_));
            if client_tx.send(message).await.is_err() || closing {
                break;
            }
        }
    };

    tokio::select! {
        _ = client_to_upstream => {}
        _ = upstream_to_client => {}
    }
    tracing::debug!("websocket relay closed");
}

fn into_upstream(message: ws::Message) -> tungstenite::Message {
    match message {
        ws::Message::Text(text) => tungstenite::Message::Text(text.as_str().into()),
        ws::Message::Binary(data) => tungstenite::Message::Binary(data),
        ws::Message::Ping(data) => tungstenite::Message::Ping(data),
        ws::Message::Pong(data) => tungstenite::Message::Pong(data),
        ws::Message::Close(frame) => {
            tungstenite::Message::Close(frame.map(|frame| tungstenite::protocol::CloseFrame {
                code: frame.code.into(),
                reason: frame.reason.as_str().into(),
            }))
        }
    }
}

fn into_client(message: tungstenite::Message) -> Option<ws::Message> {
    let message = match message {
        tungstenite::Message::Text(text) => ws::Message::Text(text.as_str().into()),
        tungstenite::Message::Binary(data) => ws::Message::Binary(data),
        tungstenite::Message::Ping(data) => ws::Message::Ping(data),
        tungstenite::Message::Pong(data) => ws::Message::Pong(data),
        tungstenite::Message::Close(frame) => ws::Message::Close(frame.map(|frame| {
            ws::CloseFrame {
                code: frame.code.into(),
                reason: frame.reason.as_str().into(),
            }
        })),
        // Raw frames never surface from a configured client stream.
        tungstenite::Message::Frame(_) => return None,
    };
    Some(message)
}

fn path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

fn ws_base(upstream_url: &str) -> String {
    if let Some(rest) = upstream_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = upstream_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        upstream_url.to_string()
    }
}

fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        if SKIP_HEADERS.contains(&name.as_str()) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
