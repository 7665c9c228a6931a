//! Route guard: pages under a protected prefix require a session token.
//!
//! Only the token's presence is checked. Its signature and claims are left
//! to the backend, which sees the same token on every API call.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, Uri, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use reqwest::Url;
use tracing::debug;

use crate::auth::{SESSION_COOKIE, read_cookie};
use crate::config::GuardConfig;

const UNGUARDED_PREFIXES: [&str; 4] = ["/api", "/_next", "/static", "/favicon.ico"];

pub async fn require_session(
    State(guard): State<GuardConfig>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if !is_protected(&guard, &path) || extract_token(request.headers(), request.uri()).is_some() {
        return next.run(request).await;
    }

    debug!("no session token for {}, redirecting to login", path);
    Redirect::temporary(&login_redirect(&guard.login_path, &path)).into_response()
}

pub fn is_protected(guard: &GuardConfig, path: &str) -> bool {
    if UNGUARDED_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return false;
    }
    guard
        .protected_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
}

/// First non-empty token from the session cookie, the `Authorization`
/// header, or the `token` query parameter.
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| read_cookie(v, SESSION_COOKIE))
        .map(str::to_string);

    let from_header = || {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.replacen("Bearer ", "", 1))
    };

    let from_query = || {
        uri.query().and_then(|q| {
            Url::parse(&format!("http://portal.local/?{}", q))
                .ok()?
                .query_pairs()
                .find(|(k, _)| k == "token")
                .map(|(_, v)| v.into_owned())
        })
    };

    [from_cookie, from_header(), from_query()]
        .into_iter()
        .flatten()
        .find(|t| !t.trim().is_empty())
}

pub fn login_redirect(login_path: &str, original_path: &str) -> String {
    match Url::parse(&format!("http://portal.local{}", login_path)) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("redirect", original_path);
            match url.query() {
                Some(query) => format!("{}?{}", url.path(), query),
                None => url.path().to_string(),
            }
        }
        Err(_) => login_path.to_string(),
    }
}
