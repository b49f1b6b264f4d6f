// SPDX-FileCopyrightText: 2025 Caution SEZC
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::sync::Arc;

use crate::config::Config;

/// Shared per-process state. Everything here is immutable after startup;
/// request handling never takes a lock.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Connection pool to the upstream target, shared across requests.
    pub http: reqwest::Client,
}
