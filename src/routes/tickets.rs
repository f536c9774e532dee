use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::ticket::{
    DbTicket, Priority, Ticket, TicketCreateRequest, TicketStatus, TicketUpdateRequest,
};
use crate::policy::{self, Action};
use crate::session::SessionUser;
use crate::utils::utc_now;

const TICKET_COLUMNS: &str = "t.id, t.title, t.description, t.status, t.priority, t.reported_by, \
    u.name AS reporter_name, t.assigned_to, t.asset_id, t.department, t.resolution, t.created_at, t.updated_at";

#[utoipa::path(
    get,
    path = "/api/tickets",
    tag = "Tickets",
    responses(
        (status = 200, description = "Tickets visible to the caller", body = [Ticket]),
        (status = 401, description = "No valid session")
    )
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    session: SessionUser,
) -> AppResult<Json<Vec<Ticket>>> {
    // Managers see the whole queue; everyone else only what they reported.
    let rows = if policy::permits(session.role, Action::TicketManage) {
        sqlx::query_as::<_, DbTicket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets t LEFT JOIN users u ON u.id = t.reported_by ORDER BY t.created_at DESC",
        ))
        .fetch_all(&state.pool)
        .await?
    } else {
        sqlx::query_as::<_, DbTicket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets t LEFT JOIN users u ON u.id = t.reported_by WHERE t.reported_by = ? ORDER BY t.created_at DESC",
        ))
        .bind(session.user_id)
        .fetch_all(&state.pool)
        .await?
    };

    let tickets: Vec<Ticket> = rows
        .into_iter()
        .map(Ticket::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(tickets))
}

#[utoipa::path(
    post,
    path = "/api/tickets",
    tag = "Tickets",
    request_body = TicketCreateRequest,
    responses(
        (status = 201, description = "Ticket created", body = Ticket),
        (status = 400, description = "Missing title or description"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Referenced asset not found")
    )
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    session: SessionUser,
    Json(payload): Json<TicketCreateRequest>,
) -> AppResult<(StatusCode, Json<Ticket>)> {
    policy::require(session.role, Action::TicketReport)?;

    let required = || AppError::bad_request("Title and description are required");
    let title = payload.title.filter(|v| !v.trim().is_empty()).ok_or_else(required)?;
    let description = payload
        .description
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(required)?;

    if let Some(asset_id) = payload.asset_id {
        crate::routes::assets::ensure_asset(&state.pool, asset_id).await?;
    }

    let priority = payload.priority.unwrap_or(Priority::Medium);
    let now = utc_now();
    let ticket_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO tickets (id, title, description, status, priority, reported_by, asset_id, department, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(ticket_id)
    .bind(&title)
    .bind(&description)
    .bind(TicketStatus::Open.as_str())
    .bind(priority.as_str())
    .bind(session.user_id)
    .bind(payload.asset_id)
    .bind(&payload.department)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let ticket: Ticket = fetch_ticket(&state.pool, ticket_id).await?.try_into()?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

#[utoipa::path(
    patch,
    path = "/api/tickets/{id}",
    tag = "Tickets",
    params(("id" = Uuid, Path, description = "Ticket id")),
    request_body = TicketUpdateRequest,
    responses(
        (status = 200, description = "Ticket updated", body = Ticket),
        (status = 401, description = "No valid session or insufficient role"),
        (status = 404, description = "Ticket not found")
    )
)]
pub async fn update_ticket(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TicketUpdateRequest>,
) -> AppResult<Json<Ticket>> {
    // Role check comes before any store access; a denied request must not
    // observe or touch the ticket.
    policy::require(session.role, Action::TicketManage)?;

    let mut ticket = fetch_ticket(&state.pool, id).await?;

    if let Some(status) = payload.status {
        ticket.status = status.as_str().to_string();
    }
    if let Some(priority) = payload.priority {
        ticket.priority = priority.as_str().to_string();
    }
    if payload.resolution.is_some() {
        ticket.resolution = payload.resolution.clone();
    }
    if payload.assigned_to.is_some() {
        ticket.assigned_to = payload.assigned_to;
    }

    let now = utc_now();

    sqlx::query(
        "UPDATE tickets SET status = ?, priority = ?, resolution = ?, assigned_to = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&ticket.status)
    .bind(&ticket.priority)
    .bind(&ticket.resolution)
    .bind(ticket.assigned_to)
    .bind(now)
    .bind(id)
    .execute(&state.pool)
    .await?;

    let ticket: Ticket = fetch_ticket(&state.pool, id).await?.try_into()?;

    Ok(Json(ticket))
}

async fn fetch_ticket(pool: &SqlitePool, ticket_id: Uuid) -> AppResult<DbTicket> {
    sqlx::query_as::<_, DbTicket>(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets t LEFT JOIN users u ON u.id = t.reported_by WHERE t.id = ?",
    ))
    .bind(ticket_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Ticket not found"))
}
