// SPDX-FileCopyrightText: 2025 Caution SEZC
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

/// Sanitize the post-login redirect target. Only same-origin absolute
/// paths are honored: the value must start with `/` and must not start
/// with `//` (protocol-relative). Everything else falls back to the root.
pub fn sanitize_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") {
        next
    } else {
        "/"
    }
}
