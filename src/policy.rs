//! Role policy: a fixed decision table over the three-tier role model.
//!
//! Every mutating handler consults [`permits`] after the session is
//! resolved and before touching the store. New roles or actions extend the
//! table; call sites never grow role conditionals of their own.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{AppError, AppResult};

/// Closed role enumeration. STAFF reports and reads, IT_OFFICER manages
/// tickets/assets/maintenance, ADMIN additionally owns destructive
/// operations. The ordering is per-action, not a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Staff,
    ItOfficer,
    Admin,
}

impl Role {
    /// Roles a user may pick at self-service signup. ADMIN accounts are
    /// provisioned out-of-band by the seed tool.
    pub const SELF_SERVICE: &'static [Role] = &[Role::Staff, Role::ItOfficer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "STAFF",
            Role::ItOfficer => "IT_OFFICER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "STAFF" => Some(Role::Staff),
            "IT_OFFICER" => Some(Role::ItOfficer),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations gated by role. Each variant corresponds to one row of the
/// grants table below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create a ticket, view one's own tickets.
    TicketReport,
    /// View all tickets; change status, priority, resolution, assignee.
    TicketManage,
    /// Read the asset inventory.
    AssetView,
    /// Create or update an asset.
    AssetWrite,
    /// Remove an asset and its dependent records.
    AssetDelete,
    /// Create and view maintenance logs.
    MaintenanceLog,
}

const GRANTS: &[(Action, &[Role])] = &[
    (Action::TicketReport, &[Role::Staff, Role::ItOfficer, Role::Admin]),
    (Action::TicketManage, &[Role::ItOfficer, Role::Admin]),
    (Action::AssetView, &[Role::Staff, Role::ItOfficer, Role::Admin]),
    (Action::AssetWrite, &[Role::ItOfficer, Role::Admin]),
    (Action::AssetDelete, &[Role::Admin]),
    (Action::MaintenanceLog, &[Role::ItOfficer, Role::Admin]),
];

/// Pure decision function over the grants table. Anything not listed is
/// denied.
pub fn permits(role: Role, action: Action) -> bool {
    GRANTS
        .iter()
        .find(|(granted, _)| *granted == action)
        .map(|(_, roles)| roles.contains(&role))
        .unwrap_or(false)
}

/// Handler-side guard: turns a denied action into the authorization
/// failure the API reports.
pub fn require(role: Role, action: Action) -> AppResult<()> {
    if permits(role, action) {
        Ok(())
    } else {
        Err(AppError::forbidden("Unauthorized"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_table_is_exhaustive() {
        // (action, staff, officer, admin)
        let expected = [
            (Action::TicketReport, true, true, true),
            (Action::TicketManage, false, true, true),
            (Action::AssetView, true, true, true),
            (Action::AssetWrite, false, true, true),
            (Action::AssetDelete, false, false, true),
            (Action::MaintenanceLog, false, true, true),
        ];

        for (action, staff, officer, admin) in expected {
            assert_eq!(permits(Role::Staff, action), staff, "{action:?} for STAFF");
            assert_eq!(permits(Role::ItOfficer, action), officer, "{action:?} for IT_OFFICER");
            assert_eq!(permits(Role::Admin, action), admin, "{action:?} for ADMIN");
        }
    }

    #[test]
    fn admin_is_not_self_service() {
        assert!(Role::SELF_SERVICE.contains(&Role::Staff));
        assert!(Role::SELF_SERVICE.contains(&Role::ItOfficer));
        assert!(!Role::SELF_SERVICE.contains(&Role::Admin));
    }

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Staff, Role::ItOfficer, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("SUPERUSER"), None);
        assert_eq!(Role::parse("staff"), None);
    }

    #[test]
    fn denied_action_is_an_authorization_failure() {
        assert!(require(Role::ItOfficer, Action::TicketManage).is_ok());
        assert!(matches!(
            require(Role::Staff, Action::AssetDelete),
            Err(AppError::Forbidden(_))
        ));
    }
}
