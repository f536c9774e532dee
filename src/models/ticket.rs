use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Resolved => "RESOLVED",
        }
    }

    pub fn parse(value: &str) -> Option<TicketStatus> {
        match value {
            "OPEN" => Some(TicketStatus::Open),
            "IN_PROGRESS" => Some(TicketStatus::InProgress),
            "RESOLVED" => Some(TicketStatus::Resolved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }

    pub fn parse(value: &str) -> Option<Priority> {
        match value {
            "LOW" => Some(Priority::Low),
            "MEDIUM" => Some(Priority::Medium),
            "HIGH" => Some(Priority::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub reported_by: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the ticket queries; `reporter_name` is joined in from the
/// users table.
#[derive(Debug, Clone, FromRow)]
pub struct DbTicket {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub reported_by: Uuid,
    pub reporter_name: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub asset_id: Option<Uuid>,
    pub department: Option<String>,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbTicket> for Ticket {
    type Error = AppError;

    fn try_from(value: DbTicket) -> Result<Self, Self::Error> {
        let status = TicketStatus::parse(&value.status)
            .ok_or_else(|| AppError::internal(format!("unknown ticket status: {}", value.status)))?;
        let priority = Priority::parse(&value.priority)
            .ok_or_else(|| AppError::internal(format!("unknown ticket priority: {}", value.priority)))?;

        Ok(Ticket {
            id: value.id,
            title: value.title,
            description: value.description,
            status,
            priority,
            reported_by: value.reported_by,
            reporter_name: value.reporter_name,
            assigned_to: value.assigned_to,
            asset_id: value.asset_id,
            department: value.department,
            resolution: value.resolution,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketCreateRequest {
    #[schema(example = "Monitor flickers")]
    pub title: Option<String>,
    #[schema(example = "Screen goes black for a second every few minutes.")]
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub asset_id: Option<Uuid>,
    #[schema(example = "Finance")]
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdateRequest {
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub resolution: Option<String>,
    pub assigned_to: Option<Uuid>,
}
