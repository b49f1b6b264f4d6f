// SPDX-FileCopyrightText: 2025 Caution SEZC
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

//! Login page rendering. Pure presentation over already-validated
//! inputs; interpolated values are attribute-escaped here.

pub const ERROR_WRONG_PASSWORD: &str = "wrong_password";
pub const ERROR_SESSION_EXPIRED: &str = "session_expired";

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn error_message(code: &str) -> Option<&'static str> {
    match code {
        ERROR_WRONG_PASSWORD => Some("Wrong password. Please try again."),
        ERROR_SESSION_EXPIRED => Some("Your login session expired. Please try again."),
        _ => None,
    }
}

pub fn login_page(next: &str, csrf_token: &str, error_code: &str) -> String {
    let next = escape_attr(next);
    let csrf_token = escape_attr(csrf_token);
    let error_block = match error_message(error_code) {
        Some(message) => format!(r#"<div class="error" role="alert">{message}</div>"#),
        None => String::new(),
    };

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Sign in</title>
  <style>
    * {{ box-sizing: border-box; }}
    body {{
      margin: 0;
      min-height: 100vh;
      display: grid;
      place-items: center;
      padding: 24px;
      font-family: system-ui, -apple-system, sans-serif;
      background: #16181d;
      color: #e6e6e6;
    }}
    .card {{
      width: min(400px, 100%);
      background: #1f232b;
      border: 1px solid #2e3440;
      border-radius: 12px;
      padding: 28px;
    }}
    h1 {{ margin: 0 0 6px; font-size: 1.35rem; }}
    p {{ margin: 0 0 18px; color: #9aa0ab; }}
    .error {{
      margin: 0 0 14px;
      padding: 10px 12px;
      border: 1px solid #7a3b3b;
      border-radius: 8px;
      background: #2b1d1d;
      color: #e8a0a0;
      font-weight: 600;
    }}
    label {{ display: block; margin: 0 0 8px; font-weight: 600; }}
    input[type="password"] {{
      width: 100%;
      padding: 10px 12px;
      border: 1px solid #2e3440;
      border-radius: 8px;
      font-size: 1rem;
      background: #16181d;
      color: inherit;
    }}
    button {{
      margin-top: 14px;
      width: 100%;
      padding: 10px 12px;
      border: 0;
      border-radius: 8px;
      background: #3b6ea5;
      color: #fff;
      font-weight: 700;
      cursor: pointer;
    }}
    button:hover {{ background: #2f5a88; }}
  </style>
</head>
<body>
  <form class="card" method="post" action="/login">
    <h1>Protected workspace</h1>
    <p>Enter the shared password to continue.</p>
    {error_block}
    <label for="password">Password</label>
    <input id="password" name="password" type="password" autocomplete="current-password" required />
    <input type="hidden" name="next" value="{next}" />
    <input type="hidden" name="csrf" value="{csrf_token}" />
    <button type="submit">Sign in</button>
  </form>
</body>
</html>"#
    )
}
