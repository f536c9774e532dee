use std::sync::Arc;

use axum::http::Method;
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::gate;
use crate::jwt::JwtConfig;
use crate::routes::{assets, auth, dashboard, health, maintenance, pages, tickets};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt = JwtConfig::from_env()?;
    let state = AppState::new(pool, jwt);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .route("/tickets", get(tickets::list_tickets).post(tickets::create_ticket))
        .route("/tickets/:id", patch(tickets::update_ticket))
        .route("/assets", get(assets::list_assets).post(assets::create_asset))
        .route(
            "/assets/:id",
            get(assets::get_asset)
                .patch(assets::update_asset)
                .delete(assets::delete_asset),
        )
        .route(
            "/maintenance",
            get(maintenance::list_maintenance).post(maintenance::create_maintenance),
        )
        .route("/dashboard", get(dashboard::dashboard))
        .route("/health", get(health::health));

    let page_routes = Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login_page))
        .route("/signup", get(pages::signup_page))
        .route("/dashboard", get(pages::dashboard_page))
        .route("/tickets", get(pages::tickets_page))
        .route("/assets", get(pages::assets_page))
        .route("/assets/:id", get(pages::asset_detail_page))
        .route("/maintenance", get(pages::maintenance_page));

    let router = Router::new()
        .nest("/api", api)
        .merge(page_routes)
        .merge(crate::docs::swagger_ui())
        // The gate runs before routing decisions matter: it sees every
        // request, skips /api and static assets, and redirects browser
        // navigations based on a full token verification.
        .layer(middleware::from_fn_with_state(state.clone(), gate::route_gate))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
