use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::routes;
use crate::session::AUTH_COOKIE;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::auth::signup,
        routes::auth::login,
        routes::auth::logout,
        routes::auth::me,
        routes::tickets::list_tickets,
        routes::tickets::create_ticket,
        routes::tickets::update_ticket,
        routes::assets::list_assets,
        routes::assets::create_asset,
        routes::assets::get_asset,
        routes::assets::update_asset,
        routes::assets::delete_asset,
        routes::maintenance::list_maintenance,
        routes::maintenance::create_maintenance,
        routes::dashboard::dashboard,
        routes::health::health,
    ),
    components(schemas(
        crate::policy::Role,
        models::user::User,
        models::user::SignupRequest,
        models::user::LoginRequest,
        models::user::SignupUser,
        models::user::SignupResponse,
        models::user::PublicUser,
        models::user::LoginResponse,
        models::user::MeResponse,
        models::ticket::Ticket,
        models::ticket::TicketStatus,
        models::ticket::Priority,
        models::ticket::TicketCreateRequest,
        models::ticket::TicketUpdateRequest,
        models::asset::Asset,
        models::asset::AssetSummary,
        models::asset::AssetDetail,
        models::asset::AssetCreateRequest,
        models::asset::AssetUpdateRequest,
        models::maintenance::MaintenanceLog,
        models::maintenance::MaintenanceCreateRequest,
        routes::dashboard::DashboardResponse,
        routes::health::HealthResponse,
    )),
    modifiers(&SessionCookieSecurity),
    tags(
        (name = "Auth", description = "Signup, login, logout and session identity"),
        (name = "Tickets", description = "Support tickets"),
        (name = "Assets", description = "Hardware inventory"),
        (name = "Maintenance", description = "Maintenance logs"),
        (name = "Dashboard", description = "Role-dependent overview"),
        (name = "Health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// Registers the session cookie as the API's security scheme so the
/// Swagger UI sends it along.
struct SessionCookieSecurity;

impl Modify for SessionCookieSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(AUTH_COOKIE))),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
