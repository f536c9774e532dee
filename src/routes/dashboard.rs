use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::models::asset::{Asset, DbAsset};
use crate::models::maintenance::{DbMaintenanceLog, MaintenanceLog};
use crate::models::ticket::{DbTicket, Ticket};
use crate::policy::{self, Action};
use crate::session::SessionUser;

const RECENT_LIMIT: i64 = 5;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub active_tickets: i64,
    pub open_tickets: i64,
    pub in_progress_tickets: i64,
    pub resolved_tickets: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_repairs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_assets: Option<i64>,
    pub recent_tickets: Vec<Ticket>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recent_maintenance: Vec<MaintenanceLog>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub department_assets: Vec<Asset>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Role-dependent dashboard figures", body = DashboardResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    session: SessionUser,
) -> AppResult<Json<DashboardResponse>> {
    if policy::permits(session.role, Action::TicketManage) {
        org_dashboard(&state.pool).await.map(Json)
    } else {
        staff_dashboard(&state.pool, session.user_id).await.map(Json)
    }
}

async fn org_dashboard(pool: &SqlitePool) -> AppResult<DashboardResponse> {
    let active_tickets =
        count(pool, "SELECT COUNT(1) FROM tickets WHERE status IN ('OPEN', 'IN_PROGRESS')").await?;
    let open_tickets = count(pool, "SELECT COUNT(1) FROM tickets WHERE status = 'OPEN'").await?;
    let in_progress_tickets =
        count(pool, "SELECT COUNT(1) FROM tickets WHERE status = 'IN_PROGRESS'").await?;
    let resolved_tickets =
        count(pool, "SELECT COUNT(1) FROM tickets WHERE status = 'RESOLVED'").await?;
    let pending_repairs =
        count(pool, "SELECT COUNT(1) FROM maintenance_logs WHERE test_result = 'Fail'").await?;
    let total_assets = count(pool, "SELECT COUNT(1) FROM assets").await?;

    let recent_tickets = sqlx::query_as::<_, DbTicket>(
        "SELECT t.id, t.title, t.description, t.status, t.priority, t.reported_by, \
           u.name AS reporter_name, t.assigned_to, t.asset_id, t.department, t.resolution, t.created_at, t.updated_at \
         FROM tickets t LEFT JOIN users u ON u.id = t.reported_by \
         ORDER BY t.created_at DESC LIMIT ?",
    )
    .bind(RECENT_LIMIT)
    .fetch_all(pool)
    .await?;

    let recent_maintenance = sqlx::query_as::<_, DbMaintenanceLog>(
        "SELECT m.id, m.asset_id, a.asset_tag, m.action, m.description, m.ram_details, m.test_result, \
           m.technician, u.name AS technician_name, m.created_at \
         FROM maintenance_logs m \
         LEFT JOIN assets a ON a.id = m.asset_id \
         LEFT JOIN users u ON u.id = m.technician \
         ORDER BY m.created_at DESC LIMIT ?",
    )
    .bind(RECENT_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(DashboardResponse {
        active_tickets,
        open_tickets,
        in_progress_tickets,
        resolved_tickets,
        pending_repairs: Some(pending_repairs),
        total_assets: Some(total_assets),
        recent_tickets: recent_tickets
            .into_iter()
            .map(Ticket::try_from)
            .collect::<Result<_, _>>()?,
        recent_maintenance: recent_maintenance.into_iter().map(MaintenanceLog::from).collect(),
        department_assets: Vec::new(),
    })
}

async fn staff_dashboard(pool: &SqlitePool, user_id: Uuid) -> AppResult<DashboardResponse> {
    let active_tickets = count_own(
        pool,
        "SELECT COUNT(1) FROM tickets WHERE reported_by = ? AND status IN ('OPEN', 'IN_PROGRESS')",
        user_id,
    )
    .await?;
    let open_tickets = count_own(
        pool,
        "SELECT COUNT(1) FROM tickets WHERE reported_by = ? AND status = 'OPEN'",
        user_id,
    )
    .await?;
    let in_progress_tickets = count_own(
        pool,
        "SELECT COUNT(1) FROM tickets WHERE reported_by = ? AND status = 'IN_PROGRESS'",
        user_id,
    )
    .await?;
    let resolved_tickets = count_own(
        pool,
        "SELECT COUNT(1) FROM tickets WHERE reported_by = ? AND status = 'RESOLVED'",
        user_id,
    )
    .await?;

    let recent_tickets = sqlx::query_as::<_, DbTicket>(
        "SELECT t.id, t.title, t.description, t.status, t.priority, t.reported_by, \
           u.name AS reporter_name, t.assigned_to, t.asset_id, t.department, t.resolution, t.created_at, t.updated_at \
         FROM tickets t LEFT JOIN users u ON u.id = t.reported_by \
         WHERE t.reported_by = ? ORDER BY t.created_at DESC LIMIT ?",
    )
    .bind(user_id)
    .bind(RECENT_LIMIT)
    .fetch_all(pool)
    .await?;

    // The department comes from the credential row. The session stays valid
    // even when the row is gone, so an absent row just means no
    // department view.
    let department: Option<String> =
        sqlx::query_scalar("SELECT department FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .flatten();

    let department_assets = match department {
        Some(department) => {
            let rows = sqlx::query_as::<_, DbAsset>(
                "SELECT id, asset_tag, asset_type, department, cpu, ram, storage, serial_number, specifications, created_at, updated_at \
                 FROM assets WHERE department = ? ORDER BY created_at DESC",
            )
            .bind(department)
            .fetch_all(pool)
            .await?;

            rows.into_iter().map(Asset::try_from).collect::<Result<_, _>>()?
        }
        None => Vec::new(),
    };

    Ok(DashboardResponse {
        active_tickets,
        open_tickets,
        in_progress_tickets,
        resolved_tickets,
        pending_repairs: None,
        total_assets: None,
        recent_tickets: recent_tickets
            .into_iter()
            .map(Ticket::try_from)
            .collect::<Result<_, _>>()?,
        recent_maintenance: Vec::new(),
        department_assets,
    })
}

async fn count(pool: &SqlitePool, sql: &str) -> AppResult<i64> {
    Ok(sqlx::query_scalar(sql).fetch_one(pool).await?)
}

async fn count_own(pool: &SqlitePool, sql: &str, user_id: Uuid) -> AppResult<i64> {
    Ok(sqlx::query_scalar(sql).bind(user_id).fetch_one(pool).await?)
}
