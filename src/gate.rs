//! Route gate: pre-routing filter for browser navigations.
//!
//! Classifies each path as public, protected or API, and redirects based
//! on a full token verification. API routes are skipped entirely; their
//! handlers resolve the session themselves. Verification goes through
//! [`crate::session::resolve`], the same path the handlers use, so a
//! forged or expired cookie is turned away here with the exact logic that
//! would reject it downstream.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::app::AppState;
use crate::session;

const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/assets", "/tickets", "/maintenance"];

pub async fn route_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();

    // API and docs routes check sessions themselves; anything with a file
    // extension is a static asset and never gated.
    if path.starts_with("/api") || path.starts_with("/docs") || path.contains('.') {
        return next.run(request).await;
    }

    let authenticated = session::resolve(request.headers(), &state.jwt).is_some();

    if is_protected(path) && !authenticated {
        return Redirect::temporary("/login").into_response();
    }

    if (path == "/login" || path == "/signup") && authenticated {
        return Redirect::temporary("/dashboard").into_response();
    }

    next.run(request).await
}

fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}
