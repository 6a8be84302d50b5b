//! User, role, and access models

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Staff roles, in decreasing order of privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    CoAdmin,
    Biller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::CoAdmin => "co_admin",
            Role::Biller => "biller",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "co_admin" => Some(Role::CoAdmin),
            "biller" => Some(Role::Biller),
            _ => None,
        }
    }
}

/// Application views subject to role gating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Inventory,
    Billing,
    ViewBills,
    ProfitAnalysis,
    InventoryHistory,
    DailyReport,
    UserAdmin,
    AuditLog,
    Settings,
}

/// The views a role may reach
pub fn allowed_views(role: Role) -> &'static [View] {
    match role {
        Role::Admin => &[
            View::Inventory,
            View::Billing,
            View::ViewBills,
            View::ProfitAnalysis,
            View::InventoryHistory,
            View::DailyReport,
            View::UserAdmin,
            View::AuditLog,
            View::Settings,
        ],
        Role::CoAdmin => &[
            View::Inventory,
            View::Billing,
            View::ViewBills,
            View::ProfitAnalysis,
            View::InventoryHistory,
            View::DailyReport,
            View::Settings,
        ],
        Role::Biller => &[View::Billing, View::ViewBills],
    }
}

pub fn can_access(role: Role, view: View) -> bool {
    allowed_views(role).contains(&view)
}

/// Views that additionally require a step-up grant, independent of role
pub fn requires_step_up(view: View) -> bool {
    matches!(
        view,
        View::ProfitAnalysis | View::InventoryHistory | View::AuditLog
    )
}

/// Derived liveness; never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Online,
    Offline,
}

/// A user is Online while `last_seen` falls within the liveness window
pub fn presence_status(
    last_seen: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> UserStatus {
    match last_seen {
        Some(seen) if seen > now - window => UserStatus::Online,
        _ => UserStatus::Offline,
    }
}

/// A user account as exposed by the API (credentials never leave the backend)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn biller_sees_only_billing_views() {
        assert!(can_access(Role::Biller, View::Billing));
        assert!(can_access(Role::Biller, View::ViewBills));
        assert!(!can_access(Role::Biller, View::Inventory));
        assert!(!can_access(Role::Biller, View::ProfitAnalysis));
        assert!(!can_access(Role::Biller, View::UserAdmin));
    }

    #[test]
    fn co_admin_is_shut_out_of_identity_and_audit() {
        assert!(can_access(Role::CoAdmin, View::Inventory));
        assert!(can_access(Role::CoAdmin, View::Settings));
        assert!(!can_access(Role::CoAdmin, View::UserAdmin));
        assert!(!can_access(Role::CoAdmin, View::AuditLog));
    }

    #[test]
    fn admin_reaches_everything() {
        for view in [
            View::Inventory,
            View::Billing,
            View::ViewBills,
            View::ProfitAnalysis,
            View::InventoryHistory,
            View::DailyReport,
            View::UserAdmin,
            View::AuditLog,
            View::Settings,
        ] {
            assert!(can_access(Role::Admin, view));
        }
    }

    #[test]
    fn step_up_gates_the_sensitive_views_only() {
        assert!(requires_step_up(View::ProfitAnalysis));
        assert!(requires_step_up(View::InventoryHistory));
        assert!(requires_step_up(View::AuditLog));
        assert!(!requires_step_up(View::Billing));
        assert!(!requires_step_up(View::UserAdmin));
    }

    #[test]
    fn presence_window_boundaries() {
        let now = Utc::now();
        let window = Duration::minutes(5);

        assert_eq!(
            presence_status(Some(now - Duration::minutes(1)), now, window),
            UserStatus::Online
        );
        assert_eq!(
            presence_status(Some(now - Duration::minutes(6)), now, window),
            UserStatus::Offline
        );
        assert_eq!(presence_status(None, now, window), UserStatus::Offline);
    }
}
