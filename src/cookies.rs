// SPDX-FileCopyrightText: 2025 Caution SEZC
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

//! Cookie wire format: parsing the request `Cookie` header and building
//! `Set-Cookie` values with the attribute policy fixed for this gateway
//! (Path=/, HttpOnly, SameSite=Lax, explicit Max-Age, Secure by config).

use axum::http::{header, HeaderMap};
use cookie::{time::Duration, Cookie, SameSite};
use std::collections::HashMap;

/// Parse every `Cookie` header into a name -> value map. Values are
/// percent-decoded; malformed entries are dropped; duplicates resolve
/// last-write-wins.
pub fn parse(headers: &HeaderMap) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for cookie in Cookie::split_parse_encoded(raw).flatten() {
            out.insert(cookie.name().to_string(), cookie.value().to_string());
        }
    }
    out
}

pub fn get(headers: &HeaderMap, name: &str) -> Option<String> {
    parse(headers).remove(name)
}

/// Build a `Set-Cookie` header value. A `max_age_seconds` of 0 expires
/// the cookie immediately (logout, clearing the CSRF cookie).
pub fn build(name: &str, value: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut builder = Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_seconds));
    if secure {
        builder = builder.secure(true);
    }
    builder.build().encoded().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_multiple_cookies() {
        let headers = headers_with_cookie("a=1; b=2; c=3");
        let cookies = parse(&headers);
        assert_eq!(cookies.get("a").unwrap(), "1");
        assert_eq!(cookies.get("b").unwrap(), "2");
        assert_eq!(cookies.get("c").unwrap(), "3");
    }

    #[test]
    fn percent_decodes_values() {
        let headers = headers_with_cookie("greeting=hello%20world");
        assert_eq!(get(&headers, "greeting").unwrap(), "hello world");
    }

    #[test]
    fn last_write_wins_on_duplicates() {
        let headers = headers_with_cookie("a=first; a=second");
        assert_eq!(get(&headers, "a").unwrap(), "second");
    }

    #[test]
    fn drops_entries_without_a_value() {
        let headers = headers_with_cookie("bare; b=2");
        let cookies = parse(&headers);
        assert!(!cookies.contains_key("bare"));
        assert_eq!(cookies.get("b").unwrap(), "2");
    }

    #[test]
    fn keeps_empty_values() {
        let headers = headers_with_cookie("cleared=");
        assert_eq!(get(&headers, "cleared").unwrap(), "");
    }

    #[test]
    fn build_emits_fixed_attributes() {
        let line = build("gateway_session", "tok", 3600, false);
        assert!(line.starts_with("gateway_session=tok"));
        assert!(line.contains("Path=/"));
        assert!(line.contains("HttpOnly"));
        assert!(line.contains("SameSite=Lax"));
        assert!(line.contains("Max-Age=3600"));
        assert!(!line.contains("Secure"));
    }

    #[test]
    fn build_appends_secure_when_configured() {
        let line = build("gateway_session", "tok", 3600, true);
        assert!(line.contains("Secure"));
    }

    #[test]
    fn build_with_zero_max_age_expires_immediately() {
        let line = build("gateway_session", "", 0, false);
        assert!(line.contains("Max-Age=0"));
    }

    #[test]
    fn build_percent_encodes_values() {
        let line = build("name", "a b;c", 60, false);
        assert!(line.contains("a%20b%3Bc"));
    }
}
