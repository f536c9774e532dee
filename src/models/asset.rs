use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::maintenance::MaintenanceLog;
use crate::models::ticket::Ticket;

/// Fixed hardware catalog. Type-specific detail beyond cpu/ram/storage
/// goes into the free-form `specifications` JSON column.
pub const ASSET_TYPES: &[&str] = &[
    "COMPUTER",
    "LAPTOP",
    "PRINTER",
    "MONITOR",
    "SERVER",
    "NETWORK_EQUIPMENT",
    "TABLET",
    "PHONE",
    "OTHER",
];

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: Uuid,
    pub asset_tag: String,
    pub asset_type: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
    pub serial_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub specifications: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbAsset {
    pub id: Uuid,
    pub asset_tag: String,
    pub asset_type: String,
    pub department: String,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub serial_number: String,
    pub specifications: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbAsset> for Asset {
    type Error = AppError;

    fn try_from(value: DbAsset) -> Result<Self, Self::Error> {
        let specifications = value
            .specifications
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|err| AppError::internal(format!("invalid specifications json: {err}")))?;

        Ok(Asset {
            id: value.id,
            asset_tag: value.asset_tag,
            asset_type: value.asset_type,
            department: value.department,
            cpu: value.cpu,
            ram: value.ram,
            storage: value.storage,
            serial_number: value.serial_number,
            specifications,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// List view: asset plus how many tickets and maintenance logs reference
/// it.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    #[serde(flatten)]
    pub asset: Asset,
    pub ticket_count: i64,
    pub maintenance_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbAssetSummary {
    pub id: Uuid,
    pub asset_tag: String,
    pub asset_type: String,
    pub department: String,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub serial_number: String,
    pub specifications: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ticket_count: i64,
    pub maintenance_count: i64,
}

impl TryFrom<DbAssetSummary> for AssetSummary {
    type Error = AppError;

    fn try_from(value: DbAssetSummary) -> Result<Self, Self::Error> {
        let ticket_count = value.ticket_count;
        let maintenance_count = value.maintenance_count;
        let asset = DbAsset {
            id: value.id,
            asset_tag: value.asset_tag,
            asset_type: value.asset_type,
            department: value.department,
            cpu: value.cpu,
            ram: value.ram,
            storage: value.storage,
            serial_number: value.serial_number,
            specifications: value.specifications,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
        .try_into()?;

        Ok(AssetSummary {
            asset,
            ticket_count,
            maintenance_count,
        })
    }
}

/// Detail view: the asset together with its tickets and maintenance
/// history.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetDetail {
    #[serde(flatten)]
    pub asset: Asset,
    pub tickets: Vec<Ticket>,
    pub maintenance_logs: Vec<MaintenanceLog>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetCreateRequest {
    #[schema(example = "ASSET-001")]
    pub asset_tag: Option<String>,
    #[schema(example = "COMPUTER")]
    pub asset_type: Option<String>,
    #[schema(example = "Finance")]
    pub department: Option<String>,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    #[schema(example = "SN-2024-001")]
    pub serial_number: Option<String>,
    #[schema(value_type = Object)]
    pub specifications: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetUpdateRequest {
    pub asset_tag: Option<String>,
    pub asset_type: Option<String>,
    pub department: Option<String>,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub serial_number: Option<String>,
    #[schema(value_type = Object)]
    pub specifications: Option<Value>,
}
