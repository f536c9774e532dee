use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::policy::Role;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Credential row. The password hash lives only here and is stripped on
/// conversion; no response DTO ever carries it.
#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbUser> for User {
    type Error = AppError;

    fn try_from(value: DbUser) -> Result<Self, Self::Error> {
        let role = Role::parse(&value.role)
            .ok_or_else(|| AppError::internal(format!("unknown role in users table: {}", value.role)))?;

        Ok(User {
            id: value.id,
            name: value.name,
            email: value.email,
            role,
            department: value.department,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// Required fields are optional here so that an incomplete body becomes a
/// 400 with a readable message rather than a deserialize failure.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
    #[schema(example = "ada@trackr.gov")]
    pub email: Option<String>,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: Option<String>,
    #[schema(example = "STAFF")]
    pub role: Option<String>,
    #[schema(example = "Finance")]
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@trackr.gov")]
    pub email: Option<String>,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    pub user: SignupUser,
}

/// Minimal public identity returned by login; intentionally smaller than
/// [`User`].
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub user: PublicUser,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}
