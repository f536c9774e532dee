//! Server-rendered page shells for the browser routes the gate protects.
//! Rendering is intentionally bare; the point is that every protected
//! shell goes through the same session resolution as the API, and that
//! UI affordances come out of the role policy table rather than ad-hoc
//! role comparisons.

use axum::extract::Path;
use axum::response::Html;
use uuid::Uuid;

use crate::policy::{self, Action};
use crate::session::SessionUser;

pub async fn home() -> Html<String> {
    Html(shell(
        "Trackr",
        "<h1>Trackr</h1>\
         <p>IT helpdesk and asset inventory.</p>\
         <p><a href=\"/login\">Sign in</a> or <a href=\"/signup\">create an account</a>.</p>",
    ))
}

pub async fn login_page() -> Html<String> {
    Html(shell(
        "Sign in",
        "<h1>Sign in</h1><p>POST /api/auth/login with email and password.</p>",
    ))
}

pub async fn signup_page() -> Html<String> {
    Html(shell(
        "Create account",
        "<h1>Create account</h1><p>POST /api/auth/signup. Staff and IT officer roles only.</p>",
    ))
}

pub async fn dashboard_page(session: SessionUser) -> Html<String> {
    let body = format!(
        "<h1>Dashboard</h1><p>Signed in as {} ({})</p>{}",
        session.email,
        session.role,
        nav(&session)
    );
    Html(shell("Dashboard", &body))
}

pub async fn tickets_page(session: SessionUser) -> Html<String> {
    let scope = if policy::permits(session.role, Action::TicketManage) {
        "all tickets"
    } else {
        "your tickets"
    };
    let body = format!("<h1>Tickets</h1><p>Showing {scope}.</p>{}", nav(&session));
    Html(shell("Tickets", &body))
}

pub async fn assets_page(session: SessionUser) -> Html<String> {
    let body = format!("<h1>Assets</h1>{}{}", asset_controls(&session), nav(&session));
    Html(shell("Assets", &body))
}

pub async fn asset_detail_page(session: SessionUser, Path(id): Path<Uuid>) -> Html<String> {
    let body = format!(
        "<h1>Asset {id}</h1>{}{}",
        asset_controls(&session),
        nav(&session)
    );
    Html(shell("Asset", &body))
}

pub async fn maintenance_page(session: SessionUser) -> Html<String> {
    let body = format!("<h1>Maintenance</h1>{}", nav(&session));
    Html(shell("Maintenance", &body))
}

fn asset_controls(session: &SessionUser) -> String {
    let mut controls = Vec::new();
    if policy::permits(session.role, Action::AssetWrite) {
        controls.push("<button>Add asset</button>");
    }
    if policy::permits(session.role, Action::AssetDelete) {
        controls.push("<button>Delete asset</button>");
    }
    if controls.is_empty() {
        "<p>Read-only view.</p>".to_string()
    } else {
        format!("<p>{}</p>", controls.join(" "))
    }
}

fn nav(session: &SessionUser) -> String {
    let mut links = vec![
        "<a href=\"/dashboard\">Dashboard</a>",
        "<a href=\"/tickets\">Tickets</a>",
        "<a href=\"/assets\">Assets</a>",
    ];
    if policy::permits(session.role, Action::MaintenanceLog) {
        links.push("<a href=\"/maintenance\">Maintenance</a>");
    }
    format!("<nav>{}</nav>", links.join(" | "))
}

fn shell(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title} - Trackr</title></head><body>{body}</body></html>"
    )
}
