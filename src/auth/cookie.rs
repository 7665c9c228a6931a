//! The session cookie the route guard looks for.

pub const SESSION_COOKIE: &str = "firebase-token";
pub const SESSION_MAX_AGE_SECS: u64 = 3600;

pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax",
        SESSION_COOKIE, token, SESSION_MAX_AGE_SECS
    )
}

pub fn clear_session_cookie() -> String {
    format!(
        "{}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:01 GMT",
        SESSION_COOKIE
    )
}

/// Value of cookie `name` in a `Cookie` request header.
pub fn read_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}
