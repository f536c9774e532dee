use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceLog {
    pub id: Uuid,
    pub asset_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_tag: Option<String>,
    pub action: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_result: Option<String>,
    pub technician: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row shape of the maintenance queries; `asset_tag` and
/// `technician_name` are joined in.
#[derive(Debug, Clone, FromRow)]
pub struct DbMaintenanceLog {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub asset_tag: Option<String>,
    pub action: String,
    pub description: String,
    pub ram_details: Option<String>,
    pub test_result: Option<String>,
    pub technician: Uuid,
    pub technician_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbMaintenanceLog> for MaintenanceLog {
    fn from(value: DbMaintenanceLog) -> Self {
        MaintenanceLog {
            id: value.id,
            asset_id: value.asset_id,
            asset_tag: value.asset_tag,
            action: value.action,
            description: value.description,
            ram_details: value.ram_details,
            test_result: value.test_result,
            technician: value.technician,
            technician_name: value.technician_name,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceCreateRequest {
    pub asset_id: Option<Uuid>,
    #[schema(example = "RAM upgrade")]
    pub action: Option<String>,
    #[schema(example = "Replaced 2x8GB with 2x16GB modules.")]
    pub description: Option<String>,
    pub ram_details: Option<String>,
    #[schema(example = "Pass")]
    pub test_result: Option<String>,
}
