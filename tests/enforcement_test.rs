use chrono::Utc;
use umrah_entitlements::subscription::{
    Action, EntitlementAuditEvent, FailingTenantStore, FailingUsageStore, InMemoryTenantStore,
    InMemoryUsageStore, Plans, RecordingAuditLogger, SubscriptionEnforcer, SubscriptionError,
    SubscriptionStatus,
};
use umrah_entitlements::testing::{TestTenant, fake};

type Enforcer = SubscriptionEnforcer<InMemoryTenantStore, InMemoryUsageStore, RecordingAuditLogger>;

struct Harness {
    tenants: InMemoryTenantStore,
    usage: InMemoryUsageStore,
    audit: RecordingAuditLogger,
    enforcer: Enforcer,
}

fn harness() -> Harness {
    let tenants = InMemoryTenantStore::new();
    let usage = InMemoryUsageStore::new();
    let audit = RecordingAuditLogger::new();
    let enforcer = SubscriptionEnforcer::new(tenants.clone(), usage.clone(), Plans::standard())
        .with_audit_logger(audit.clone());

    Harness {
        tenants,
        usage,
        audit,
        enforcer,
    }
}

const ALL_ACTIONS: [&str; 7] = [
    "create_package",
    "create_booking",
    "upload_photos",
    "access_analytics",
    "priority_support",
    "featured_listings",
    "export_report",
];

#[tokio::test]
async fn test_blocked_statuses_deny_every_action() {
    let h = harness();

    for status in [
        SubscriptionStatus::Inactive,
        SubscriptionStatus::Expired,
        SubscriptionStatus::Cancelled,
    ] {
        // Unexpired end date and the most generous plan: still blocked
        let tenant = TestTenant::builder()
            .with_status(status)
            .with_plan("enterprise")
            .subscription_ends_in_days(30)
            .build();
        let id = tenant.id.clone();
        h.tenants.insert(tenant);

        for action in ALL_ACTIONS {
            let decision = h.enforcer.check_action_allowed(&id, action).await;
            assert!(!decision.allowed, "{} should deny {}", status, action);
            assert!(matches!(
                decision.denial(),
                Some(SubscriptionError::SubscriptionBlocked { .. })
            ));
        }
    }

    assert_eq!(h.tenants.update_count(), 0);
}

#[tokio::test]
async fn test_blocked_messages() {
    let h = harness();
    let cancelled = TestTenant::builder().with_status(SubscriptionStatus::Cancelled).build();
    let inactive = TestTenant::builder().with_status(SubscriptionStatus::Inactive).build();
    h.tenants.insert(cancelled.clone());
    h.tenants.insert(inactive.clone());

    let d = h.enforcer.check_action_allowed(&cancelled.id, Action::CreatePackage).await;
    assert_eq!(d.reason, "Subscription has been cancelled. Please subscribe again to continue.");

    let d = h.enforcer.check_action_allowed(&inactive.id, Action::CreatePackage).await;
    assert_eq!(
        d.reason,
        "Subscription is inactive. Please contact support to reactivate your account."
    );
}

#[tokio::test]
async fn test_past_end_date_expires_once_and_stays_denied() {
    let h = harness();
    let tenant = TestTenant::builder()
        .with_status(SubscriptionStatus::Active)
        .with_plan("premium")
        .subscription_ends_in_hours(-2)
        .build();
    let id = tenant.id.clone();
    h.tenants.insert(tenant);

    let first = h.enforcer.check_action_allowed(&id, Action::CreateBooking).await;
    assert!(!first.allowed);
    assert_eq!(first.reason, "Subscription has expired. Please renew to continue.");
    assert_eq!(first.subscription_status, Some(SubscriptionStatus::Expired));
    assert_eq!(h.tenants.get(&id).unwrap().subscription_status, SubscriptionStatus::Expired);
    assert_eq!(h.tenants.update_count(), 1);

    // Now hits the blocked-status path; no second write
    let second = h.enforcer.check_action_allowed(&id, Action::CreateBooking).await;
    assert!(!second.allowed);
    assert_eq!(second.reason, "Subscription has expired. Please renew to continue.");
    assert_eq!(second.subscription_status, None);
    assert_eq!(h.tenants.update_count(), 1);
}

#[tokio::test]
async fn test_lapsed_trial_scenario() {
    let h = harness();
    let tenant = TestTenant::builder()
        .with_status(SubscriptionStatus::Trial)
        .trial_ends_in_days(-1)
        .build();
    let id = tenant.id.clone();
    h.tenants.insert(tenant);

    let decision = h.enforcer.check_action_allowed(&id, "access_analytics").await;

    assert_eq!(
        serde_json::to_value(&decision).unwrap(),
        serde_json::json!({
            "allowed": false,
            "reason": "Trial period has expired. Please upgrade to continue.",
            "subscriptionStatus": "expired"
        })
    );
    assert_eq!(h.tenants.get(&id).unwrap().subscription_status, SubscriptionStatus::Expired);

    let events = h.audit.events().await;
    assert!(matches!(
        &events[0],
        EntitlementAuditEvent::SubscriptionAutoExpired { previous_status, expiry, .. }
            if previous_status == "trial" && expiry == "trial_end"
    ));
}

#[tokio::test]
async fn test_active_tenant_ignores_trial_end_date() {
    let h = harness();
    let tenant = TestTenant::builder()
        .with_status(SubscriptionStatus::Active)
        .trial_ends_in_days(-10)
        .build();
    let id = tenant.id.clone();
    h.tenants.insert(tenant);

    let decision = h.enforcer.check_action_allowed(&id, Action::CreatePackage).await;
    assert!(decision.allowed);
    assert_eq!(h.tenants.update_count(), 0);
}

#[tokio::test]
async fn test_running_trial_is_allowed() {
    let h = harness();
    let tenant = TestTenant::builder()
        .with_status(SubscriptionStatus::Trial)
        .trial_ends_in_days(5)
        .build();
    let id = tenant.id.clone();
    h.tenants.insert(tenant);

    let decision = h.enforcer.check_action_allowed(&id, Action::CreatePackage).await;
    assert!(decision.allowed);
    assert_eq!(decision.reason, "Package creation allowed (0/5 used)");
}

#[tokio::test]
async fn test_invalid_or_missing_plan() {
    let h = harness();
    let unknown = TestTenant::builder().with_plan("platinum").build();
    let unset = TestTenant::builder().without_plan().build();
    h.tenants.insert(unknown.clone());
    h.tenants.insert(unset.clone());

    for id in [&unknown.id, &unset.id] {
        // Unrecognized actions still need a valid plan
        let decision = h.enforcer.check_action_allowed(id, "export_report").await;
        assert!(!decision.allowed);
        assert_eq!(decision.reason, "Invalid subscription plan");
    }
}

#[tokio::test]
async fn test_package_quota_boundary() {
    let h = harness();
    let tenant = TestTenant::generate();
    let id = tenant.id.clone();
    h.tenants.insert(tenant);

    h.usage.set_packages(&id, 4);
    let decision = h.enforcer.check_action_allowed(&id, Action::CreatePackage).await;
    assert!(decision.allowed);
    assert_eq!(decision.reason, "Package creation allowed (4/5 used)");
    assert_eq!((decision.limit, decision.current), (Some(5), Some(4)));

    h.usage.set_packages(&id, 5);
    let decision = h.enforcer.check_action_allowed(&id, Action::CreatePackage).await;
    assert!(!decision.allowed);
    assert_eq!(
        decision.reason,
        "Package limit reached. Your plan allows 5 packages, you currently have 5."
    );
    assert_eq!((decision.limit, decision.current), (Some(5), Some(5)));
}

#[tokio::test]
async fn test_unlimited_packages_allow_any_count() {
    let h = harness();
    let tenant = TestTenant::builder().with_plan("enterprise").build();
    let id = tenant.id.clone();
    h.tenants.insert(tenant);

    for count in [0, 5, 1_000_000, u64::MAX] {
        h.usage.set_packages(&id, count);
        let decision = h.enforcer.check_action_allowed(&id, Action::CreatePackage).await;
        assert!(decision.allowed);
        assert_eq!(decision.reason, "Unlimited packages allowed");
        assert_eq!(decision.limit, None);
    }
}

#[tokio::test]
async fn test_monthly_bookings_only_count_this_month() {
    let h = harness();
    let tenant = TestTenant::generate();
    let id = tenant.id.clone();
    h.tenants.insert(tenant);

    let month_start = umrah_entitlements::subscription::start_of_month(&chrono::Local::now());
    h.usage.add_bookings(&id, 200, month_start - chrono::Duration::days(1));
    h.usage.add_bookings(&id, 49, Utc::now());

    let decision = h.enforcer.check_action_allowed(&id, Action::CreateBooking).await;
    assert!(decision.allowed);
    assert_eq!(decision.current, Some(49));

    h.usage.add_booking(&id, Utc::now());
    let decision = h.enforcer.check_action_allowed(&id, Action::CreateBooking).await;
    assert!(!decision.allowed);
    assert!(decision.reason.starts_with("Monthly booking limit reached."));
}

#[tokio::test]
async fn test_feature_gates() {
    let h = harness();
    let basic = TestTenant::generate();
    let premium = TestTenant::builder().with_plan("premium").build();
    h.tenants.insert(basic.clone());
    h.tenants.insert(premium.clone());

    let d = h.enforcer.check_action_allowed(&basic.id, Action::AccessAnalytics).await;
    assert!(!d.allowed);
    assert!(d.reason.contains("upgrade"));

    let d = h.enforcer.check_action_allowed(&premium.id, Action::AccessAnalytics).await;
    assert!(d.allowed);

    let d = h.enforcer.check_action_allowed(&premium.id, Action::FeaturedListings).await;
    assert!(d.allowed);

    let d = h.enforcer.check_action_allowed(&premium.id, Action::PrioritySupport).await;
    assert!(!d.allowed);
}

#[tokio::test]
async fn test_unrecognized_action_fails_open() {
    let h = harness();
    let tenant = TestTenant::generate();
    let id = tenant.id.clone();
    h.tenants.insert(tenant);
    h.usage.set_packages(&id, 5);

    let decision = h.enforcer.check_action_allowed(&id, "export_report").await;
    assert!(decision.allowed);
    assert_eq!(decision.reason, "No specific limits for this action");
}

#[tokio::test]
async fn test_unknown_and_non_company_tenants() {
    let h = harness();
    let pilgrim = TestTenant::builder().with_role("user").with_plan("enterprise").build();
    h.tenants.insert(pilgrim.clone());

    for id in [pilgrim.id, fake::tenant_id()] {
        let decision = h.enforcer.check_action_allowed(&id, Action::CreatePackage).await;
        assert!(!decision.allowed);
        assert_eq!(decision.reason, "Company not found");
    }
}

#[tokio::test]
async fn test_storage_failure_is_a_denial() {
    let tenants = InMemoryTenantStore::new();
    let tenant = TestTenant::generate();
    let id = tenant.id.clone();
    tenants.insert(tenant);
    let enforcer = SubscriptionEnforcer::new(
        tenants,
        FailingUsageStore::new("connection refused"),
        Plans::standard(),
    );

    for action in ALL_ACTIONS {
        let decision = enforcer.check_action_allowed(&id, action).await;
        assert!(!decision.allowed);
        assert_eq!(decision.reason, "Error checking subscription limits");
        assert_eq!(decision.error.as_deref(), Some("connection refused"));
    }
}

#[tokio::test]
async fn test_tenant_lookup_failure_is_a_denial() {
    let audit = RecordingAuditLogger::new();
    let enforcer = SubscriptionEnforcer::new(
        FailingTenantStore::failing_reads("connection reset"),
        InMemoryUsageStore::new(),
        Plans::standard(),
    )
    .with_audit_logger(audit.clone());

    for action in ALL_ACTIONS {
        let decision = enforcer.check_action_allowed(&fake::tenant_id(), action).await;
        assert!(!decision.allowed);
        assert_eq!(decision.reason, "Error checking subscription limits");
        assert_eq!(decision.error.as_deref(), Some("connection reset"));
        assert_eq!(decision.subscription_status, None);
    }

    let events = audit.events().await;
    assert_eq!(events.len(), ALL_ACTIONS.len());
    assert!(events.iter().all(|e| matches!(e, EntitlementAuditEvent::EnforcementFailed { .. })));
}

#[tokio::test]
async fn test_expiry_write_failure_is_a_denial() {
    let tenants = InMemoryTenantStore::new();
    let tenant = TestTenant::builder()
        .with_status(SubscriptionStatus::Active)
        .subscription_ends_in_days(-1)
        .build();
    let id = tenant.id.clone();
    tenants.insert(tenant);

    let enforcer = SubscriptionEnforcer::new(
        FailingTenantStore::failing_writes(tenants.clone(), "write refused"),
        InMemoryUsageStore::new(),
        Plans::standard(),
    );

    let decision = enforcer.check_action_allowed(&id, Action::CreatePackage).await;
    assert!(!decision.allowed);
    assert_eq!(decision.reason, "Error checking subscription limits");
    assert_eq!(decision.error.as_deref(), Some("write refused"));
    assert_eq!(decision.subscription_status, None);
    assert_eq!(tenants.get(&id).unwrap().subscription_status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn test_get_current_usage() {
    let h = harness();
    let id = fake::tenant_id();
    h.usage.set_packages(&id, 3);
    h.usage.add_bookings(&id, 2, Utc::now());
    h.usage.set_photos(&id, &fake::package_id(), 9);

    let usage = h.enforcer.get_current_usage(&id).await.unwrap();
    assert_eq!(usage.packages, 3);
    assert_eq!(usage.bookings_this_month, 2);
    assert_eq!(usage.max_photos_in_package, 0);

    let enforcer = SubscriptionEnforcer::new(
        InMemoryTenantStore::new(),
        FailingUsageStore::new("read timeout"),
        Plans::standard(),
    );
    let err = enforcer.get_current_usage(&id).await.unwrap_err();
    assert_eq!(err.message(), "read timeout");
}
