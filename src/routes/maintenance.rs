use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::maintenance::{DbMaintenanceLog, MaintenanceCreateRequest, MaintenanceLog};
use crate::policy::{self, Action};
use crate::session::SessionUser;
use crate::utils::utc_now;

const LOG_COLUMNS: &str = "m.id, m.asset_id, a.asset_tag, m.action, m.description, m.ram_details, \
    m.test_result, m.technician, u.name AS technician_name, m.created_at";

// Bounded history; older entries stay queryable per asset.
const LOG_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceListQuery {
    pub asset_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/maintenance",
    tag = "Maintenance",
    params(("assetId" = Option<Uuid>, Query, description = "Restrict to one asset")),
    responses(
        (status = 200, description = "Recent maintenance logs", body = [MaintenanceLog]),
        (status = 401, description = "No valid session or insufficient role")
    )
)]
pub async fn list_maintenance(
    State(state): State<AppState>,
    session: SessionUser,
    Query(query): Query<MaintenanceListQuery>,
) -> AppResult<Json<Vec<MaintenanceLog>>> {
    policy::require(session.role, Action::MaintenanceLog)?;

    let rows = if let Some(asset_id) = query.asset_id {
        sqlx::query_as::<_, DbMaintenanceLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM maintenance_logs m \
             LEFT JOIN assets a ON a.id = m.asset_id \
             LEFT JOIN users u ON u.id = m.technician \
             WHERE m.asset_id = ? ORDER BY m.created_at DESC LIMIT {LOG_LIMIT}",
        ))
        .bind(asset_id)
        .fetch_all(&state.pool)
        .await?
    } else {
        sqlx::query_as::<_, DbMaintenanceLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM maintenance_logs m \
             LEFT JOIN assets a ON a.id = m.asset_id \
             LEFT JOIN users u ON u.id = m.technician \
             ORDER BY m.created_at DESC LIMIT {LOG_LIMIT}",
        ))
        .fetch_all(&state.pool)
        .await?
    };

    Ok(Json(rows.into_iter().map(MaintenanceLog::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/maintenance",
    tag = "Maintenance",
    request_body = MaintenanceCreateRequest,
    responses(
        (status = 201, description = "Maintenance log created", body = MaintenanceLog),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "No valid session or insufficient role"),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn create_maintenance(
    State(state): State<AppState>,
    session: SessionUser,
    Json(payload): Json<MaintenanceCreateRequest>,
) -> AppResult<(StatusCode, Json<MaintenanceLog>)> {
    policy::require(session.role, Action::MaintenanceLog)?;

    let required = || AppError::bad_request("Missing required fields");
    let asset_id = payload.asset_id.ok_or_else(required)?;
    let action = payload.action.filter(|v| !v.trim().is_empty()).ok_or_else(required)?;
    let description = payload
        .description
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(required)?;

    crate::routes::assets::ensure_asset(&state.pool, asset_id).await?;

    let log_id = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO maintenance_logs (id, asset_id, action, description, ram_details, test_result, technician, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(log_id)
    .bind(asset_id)
    .bind(&action)
    .bind(&description)
    .bind(&payload.ram_details)
    .bind(&payload.test_result)
    .bind(session.user_id)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let log = fetch_log(&state.pool, log_id).await?;

    Ok((StatusCode::CREATED, Json(log.into())))
}

async fn fetch_log(pool: &SqlitePool, log_id: Uuid) -> AppResult<DbMaintenanceLog> {
    sqlx::query_as::<_, DbMaintenanceLog>(&format!(
        "SELECT {LOG_COLUMNS} FROM maintenance_logs m \
         LEFT JOIN assets a ON a.id = m.asset_id \
         LEFT JOIN users u ON u.id = m.technician \
         WHERE m.id = ?",
    ))
    .bind(log_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Maintenance log not found"))
}
