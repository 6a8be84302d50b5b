//! Authorization gate tests
//!
//! Role-to-view visibility, step-up gating, presence derivation, and the
//! credential validation rules.

use chrono::{Duration, Utc};
use proptest::prelude::*;

use shared::{
    allowed_views, can_access, presence_status, requires_step_up, validation, Role, UserStatus,
    View,
};

const ALL_VIEWS: [View; 9] = [
    View::Inventory,
    View::Billing,
    View::ViewBills,
    View::ProfitAnalysis,
    View::InventoryHistory,
    View::DailyReport,
    View::UserAdmin,
    View::AuditLog,
    View::Settings,
];

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn admin_sees_every_view() {
        for view in ALL_VIEWS {
            assert!(can_access(Role::Admin, view));
        }
    }

    #[test]
    fn co_admin_loses_user_admin_and_audit_log_only() {
        let denied: Vec<View> = ALL_VIEWS
            .into_iter()
            .filter(|v| !can_access(Role::CoAdmin, *v))
            .collect();
        assert_eq!(denied, vec![View::UserAdmin, View::AuditLog]);
    }

    #[test]
    fn biller_gets_billing_and_view_bills_only() {
        let granted: Vec<View> = ALL_VIEWS
            .into_iter()
            .filter(|v| can_access(Role::Biller, *v))
            .collect();
        assert_eq!(granted, vec![View::Billing, View::ViewBills]);
    }

    #[test]
    fn step_up_views_are_the_sensitive_three() {
        let gated: Vec<View> = ALL_VIEWS.into_iter().filter(|v| requires_step_up(*v)).collect();
        assert_eq!(
            gated,
            vec![View::ProfitAnalysis, View::InventoryHistory, View::AuditLog]
        );
    }

    #[test]
    fn recent_activity_shows_online() {
        let now = Utc::now();
        let window = Duration::seconds(300);
        assert_eq!(
            presence_status(Some(now - Duration::seconds(30)), now, window),
            UserStatus::Online
        );
    }

    #[test]
    fn stale_or_missing_activity_shows_offline() {
        let now = Utc::now();
        let window = Duration::seconds(300);
        assert_eq!(
            presence_status(Some(now - Duration::seconds(301)), now, window),
            UserStatus::Offline
        );
        assert_eq!(presence_status(None, now, window), UserStatus::Offline);
    }

    #[test]
    fn password_minimum_length_is_six() {
        assert!(validation::validate_password("123456").is_ok());
        assert!(validation::validate_password("12345").is_err());
        assert!(validation::validate_password("").is_err());
    }

    #[test]
    fn usernames_must_be_trimmed_and_non_empty() {
        assert!(validation::validate_username("cashier1").is_ok());
        assert!(validation::validate_username("").is_err());
        assert!(validation::validate_username(" cashier1").is_err());
    }

    #[test]
    fn role_storage_form_round_trips() {
        for role in [Role::Admin, Role::CoAdmin, Role::Biller] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("owner"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Admin), Just(Role::CoAdmin), Just(Role::Biller)]
    }

    fn view_strategy() -> impl Strategy<Value = View> {
        prop::sample::select(ALL_VIEWS.to_vec())
    }

    proptest! {
        /// allowed_views and can_access always agree
        #[test]
        fn visibility_matrix_is_consistent(role in role_strategy(), view in view_strategy()) {
            prop_assert_eq!(can_access(role, view), allowed_views(role).contains(&view));
        }

        /// Anything a co-admin can reach, an admin can reach; anything a
        /// biller can reach, a co-admin can reach
        #[test]
        fn privilege_is_monotonic(view in view_strategy()) {
            if can_access(Role::Biller, view) {
                prop_assert!(can_access(Role::CoAdmin, view));
            }
            if can_access(Role::CoAdmin, view) {
                prop_assert!(can_access(Role::Admin, view));
            }
        }

        /// Presence flips exactly at the window boundary
        #[test]
        fn presence_respects_the_window(age in 0i64..10_000, window in 1i64..10_000) {
            let now = Utc::now();
            let status = presence_status(
                Some(now - Duration::seconds(age)),
                now,
                Duration::seconds(window),
            );
            if age < window {
                prop_assert_eq!(status, UserStatus::Online);
            } else {
                prop_assert_eq!(status, UserStatus::Offline);
            }
        }
    }
}
