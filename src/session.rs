//! Session resolution: cookie in, verified identity out.
//!
//! [`resolve`] is the only place a request turns into an identity. The
//! `SessionUser` extractor and the route gate both call it, so page-level
//! and API-level trust decisions cannot drift apart.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::policy::Role;

pub const AUTH_COOKIE: &str = "auth-token";

/// Identity carried by a verified session token. Built from claims only;
/// no store lookup happens here, so a token stays valid until expiry
/// regardless of later credential changes.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Full verification of the request's session cookie. Absence, a bad
/// signature, a malformed payload and a past expiry all come out as
/// `None`; an anonymous request is a normal outcome, not an error.
pub fn resolve(headers: &HeaderMap, jwt: &JwtConfig) -> Option<SessionUser> {
    let token = token_from_headers(headers)?;
    let claims = jwt.decode(token).ok()?;

    Some(SessionUser {
        user_id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}

pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').map(str::trim).find_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                (name == AUTH_COOKIE).then_some(value)
            })
        })
}

/// `Set-Cookie` value issued at login. HttpOnly keeps the token away from
/// scripts, SameSite=Lax keeps it off cross-site POSTs, and the max-age
/// matches the token expiry.
pub fn auth_cookie(token: &str, max_age_secs: i64) -> String {
    let mut cookie =
        format!("{AUTH_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure_cookies() {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value issued at logout: empty and already expired.
pub fn logout_cookie() -> String {
    let mut cookie = format!("{AUTH_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure_cookies() {
        cookie.push_str("; Secure");
    }
    cookie
}

fn secure_cookies() -> bool {
    std::env::var("APP_ENV").map(|env| env == "production").unwrap_or(false)
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(&parts.headers, &state.jwt).ok_or_else(|| AppError::unauthorized("Unauthorized"))
    }
}
