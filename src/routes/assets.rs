use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::asset::{
    Asset, AssetCreateRequest, AssetDetail, AssetSummary, AssetUpdateRequest, DbAsset,
    DbAssetSummary, ASSET_TYPES,
};
use crate::models::maintenance::{DbMaintenanceLog, MaintenanceLog};
use crate::models::ticket::{DbTicket, Ticket};
use crate::policy::{self, Action};
use crate::session::SessionUser;
use crate::utils::utc_now;

const ASSET_COLUMNS: &str =
    "id, asset_tag, asset_type, department, cpu, ram, storage, serial_number, specifications, created_at, updated_at";

#[utoipa::path(
    get,
    path = "/api/assets",
    tag = "Assets",
    responses(
        (status = 200, description = "Asset inventory with reference counts", body = [AssetSummary]),
        (status = 401, description = "No valid session")
    )
)]
pub async fn list_assets(
    State(state): State<AppState>,
    session: SessionUser,
) -> AppResult<Json<Vec<AssetSummary>>> {
    policy::require(session.role, Action::AssetView)?;

    let rows = sqlx::query_as::<_, DbAssetSummary>(&format!(
        "SELECT {ASSET_COLUMNS}, \
           (SELECT COUNT(1) FROM tickets WHERE tickets.asset_id = assets.id) AS ticket_count, \
           (SELECT COUNT(1) FROM maintenance_logs WHERE maintenance_logs.asset_id = assets.id) AS maintenance_count \
         FROM assets ORDER BY created_at DESC",
    ))
    .fetch_all(&state.pool)
    .await?;

    let assets: Vec<AssetSummary> = rows
        .into_iter()
        .map(AssetSummary::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(assets))
}

#[utoipa::path(
    post,
    path = "/api/assets",
    tag = "Assets",
    request_body = AssetCreateRequest,
    responses(
        (status = 201, description = "Asset created", body = Asset),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "No valid session or insufficient role"),
        (status = 409, description = "Duplicate asset tag or serial number")
    )
)]
pub async fn create_asset(
    State(state): State<AppState>,
    session: SessionUser,
    Json(payload): Json<AssetCreateRequest>,
) -> AppResult<(StatusCode, Json<Asset>)> {
    policy::require(session.role, Action::AssetWrite)?;

    let required =
        || AppError::bad_request("Asset tag, type, department, and serial number are required");
    let asset_tag = payload.asset_tag.filter(|v| !v.trim().is_empty()).ok_or_else(required)?;
    let asset_type = payload.asset_type.filter(|v| !v.trim().is_empty()).ok_or_else(required)?;
    let department = payload.department.filter(|v| !v.trim().is_empty()).ok_or_else(required)?;
    let serial_number = payload
        .serial_number
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(required)?;

    if !ASSET_TYPES.contains(&asset_type.as_str()) {
        return Err(AppError::bad_request("Unknown asset type"));
    }

    // UX fast path; the UNIQUE constraints are what actually hold under
    // concurrent submissions.
    ensure_tag_available(&state.pool, &asset_tag, None).await?;
    ensure_serial_available(&state.pool, &serial_number, None).await?;

    let specifications = payload
        .specifications
        .filter(|value| !value.is_null())
        .map(|value| value.to_string());
    let now = utc_now();
    let asset_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO assets (id, asset_tag, asset_type, department, cpu, ram, storage, serial_number, specifications, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(asset_id)
    .bind(&asset_tag)
    .bind(&asset_type)
    .bind(&department)
    .bind(&payload.cpu)
    .bind(&payload.ram)
    .bind(&payload.storage)
    .bind(&serial_number)
    .bind(&specifications)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await
    .map_err(|err| AppError::conflict_on_unique(err, "Asset tag or serial number already exists"))?;

    let asset: Asset = fetch_asset(&state.pool, asset_id).await?.try_into()?;

    Ok((StatusCode::CREATED, Json(asset)))
}

#[utoipa::path(
    get,
    path = "/api/assets/{id}",
    tag = "Assets",
    params(("id" = Uuid, Path, description = "Asset id")),
    responses(
        (status = 200, description = "Asset with tickets and maintenance history", body = AssetDetail),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn get_asset(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AssetDetail>> {
    policy::require(session.role, Action::AssetView)?;

    let asset: Asset = fetch_asset(&state.pool, id).await?.try_into()?;

    let tickets = sqlx::query_as::<_, DbTicket>(
        "SELECT t.id, t.title, t.description, t.status, t.priority, t.reported_by, \
           u.name AS reporter_name, t.assigned_to, t.asset_id, t.department, t.resolution, t.created_at, t.updated_at \
         FROM tickets t LEFT JOIN users u ON u.id = t.reported_by \
         WHERE t.asset_id = ? ORDER BY t.created_at DESC",
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    let logs = sqlx::query_as::<_, DbMaintenanceLog>(
        "SELECT m.id, m.asset_id, a.asset_tag, m.action, m.description, m.ram_details, m.test_result, \
           m.technician, u.name AS technician_name, m.created_at \
         FROM maintenance_logs m \
         LEFT JOIN assets a ON a.id = m.asset_id \
         LEFT JOIN users u ON u.id = m.technician \
         WHERE m.asset_id = ? ORDER BY m.created_at DESC",
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    let tickets: Vec<Ticket> = tickets
        .into_iter()
        .map(Ticket::try_from)
        .collect::<Result<_, _>>()?;
    let maintenance_logs: Vec<MaintenanceLog> = logs.into_iter().map(MaintenanceLog::from).collect();

    Ok(Json(AssetDetail {
        asset,
        tickets,
        maintenance_logs,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/assets/{id}",
    tag = "Assets",
    params(("id" = Uuid, Path, description = "Asset id")),
    request_body = AssetUpdateRequest,
    responses(
        (status = 200, description = "Asset updated", body = Asset),
        (status = 401, description = "No valid session or insufficient role"),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "Duplicate asset tag or serial number")
    )
)]
pub async fn update_asset(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssetUpdateRequest>,
) -> AppResult<Json<Asset>> {
    policy::require(session.role, Action::AssetWrite)?;

    let mut asset = fetch_asset(&state.pool, id).await?;

    if let Some(asset_tag) = payload.asset_tag {
        if asset_tag != asset.asset_tag {
            ensure_tag_available(&state.pool, &asset_tag, Some(id)).await?;
        }
        asset.asset_tag = asset_tag;
    }
    if let Some(asset_type) = payload.asset_type {
        if !ASSET_TYPES.contains(&asset_type.as_str()) {
            return Err(AppError::bad_request("Unknown asset type"));
        }
        asset.asset_type = asset_type;
    }
    if let Some(department) = payload.department {
        asset.department = department;
    }
    if payload.cpu.is_some() {
        asset.cpu = payload.cpu;
    }
    if payload.ram.is_some() {
        asset.ram = payload.ram;
    }
    if payload.storage.is_some() {
        asset.storage = payload.storage;
    }
    if let Some(serial_number) = payload.serial_number {
        if serial_number != asset.serial_number {
            ensure_serial_available(&state.pool, &serial_number, Some(id)).await?;
        }
        asset.serial_number = serial_number;
    }
    if let Some(value) = payload.specifications {
        asset.specifications = if value.is_null() { None } else { Some(value.to_string()) };
    }

    let now = utc_now();

    sqlx::query(
        "UPDATE assets SET asset_tag = ?, asset_type = ?, department = ?, cpu = ?, ram = ?, storage = ?, \
         serial_number = ?, specifications = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&asset.asset_tag)
    .bind(&asset.asset_type)
    .bind(&asset.department)
    .bind(&asset.cpu)
    .bind(&asset.ram)
    .bind(&asset.storage)
    .bind(&asset.serial_number)
    .bind(&asset.specifications)
    .bind(now)
    .bind(id)
    .execute(&state.pool)
    .await
    .map_err(|err| AppError::conflict_on_unique(err, "Asset tag or serial number already exists"))?;

    let asset: Asset = fetch_asset(&state.pool, id).await?.try_into()?;

    Ok(Json(asset))
}

#[utoipa::path(
    delete,
    path = "/api/assets/{id}",
    tag = "Assets",
    params(("id" = Uuid, Path, description = "Asset id")),
    responses(
        (status = 200, description = "Asset and dependent records removed"),
        (status = 401, description = "No valid session or insufficient role"),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn delete_asset(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    policy::require(session.role, Action::AssetDelete)?;

    ensure_asset(&state.pool, id).await?;

    // Dependent tickets and maintenance logs go with the asset via the
    // ON DELETE CASCADE foreign keys.
    sqlx::query("DELETE FROM assets WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    tracing::info!(asset_id = %id, user_id = %session.user_id, "asset deleted");

    Ok(Json(json!({ "success": true })))
}

pub(crate) async fn ensure_asset(pool: &SqlitePool, asset_id: Uuid) -> AppResult<()> {
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM assets WHERE id = ?")
        .bind(asset_id)
        .fetch_one(pool)
        .await?;

    if exists == 0 {
        return Err(AppError::not_found("Asset not found"));
    }

    Ok(())
}

async fn ensure_tag_available(pool: &SqlitePool, asset_tag: &str, exclude: Option<Uuid>) -> AppResult<()> {
    let count: i64 = match exclude {
        Some(id) => {
            sqlx::query_scalar("SELECT COUNT(1) FROM assets WHERE asset_tag = ? AND id != ?")
                .bind(asset_tag)
                .bind(id)
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(1) FROM assets WHERE asset_tag = ?")
                .bind(asset_tag)
                .fetch_one(pool)
                .await?
        }
    };

    if count > 0 {
        return Err(AppError::conflict("Asset tag already exists"));
    }

    Ok(())
}

async fn ensure_serial_available(pool: &SqlitePool, serial_number: &str, exclude: Option<Uuid>) -> AppResult<()> {
    let count: i64 = match exclude {
        Some(id) => {
            sqlx::query_scalar("SELECT COUNT(1) FROM assets WHERE serial_number = ? AND id != ?")
                .bind(serial_number)
                .bind(id)
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(1) FROM assets WHERE serial_number = ?")
                .bind(serial_number)
                .fetch_one(pool)
                .await?
        }
    };

    if count > 0 {
        return Err(AppError::conflict("Serial number already exists"));
    }

    Ok(())
}

async fn fetch_asset(pool: &SqlitePool, asset_id: Uuid) -> AppResult<DbAsset> {
    sqlx::query_as::<_, DbAsset>(&format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = ?"))
        .bind(asset_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Asset not found"))
}
