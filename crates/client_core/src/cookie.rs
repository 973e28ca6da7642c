//! Cookie string lookup used to recover the CSRF token issued by the server.

use percent_encoding::percent_decode_str;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Returns the decoded value of `name` from a `Cookie`-style string
/// (`a=1; b=2`). The first matching pair wins.
pub fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    if cookie_header.is_empty() || name.is_empty() {
        return None;
    }
    cookie_header.split(';').find_map(|pair| {
        let value = pair.trim().strip_prefix(name)?.strip_prefix('=')?;
        Some(percent_decode_str(value).decode_utf8_lossy().into_owned())
    })
}

pub fn csrf_token(cookie_header: &str) -> Option<String> {
    get_cookie(cookie_header, CSRF_COOKIE)
}

#[cfg(test)]
#[path = "tests/cookie_tests.rs"]
mod tests;
