//! Subscription entitlements for company tenants.
//!
//! Decides whether a company may create packages, take bookings, upload
//! photos or use gated features, based on its subscription status, plan
//! quotas and live usage counts. Also produces a status summary with
//! proactive warnings and a list of upgrade suggestions.
//!
//! # Features
//!
//! - `seaorm` - Enables the SeaORM-backed store
//! - `test-util` - Exports in-memory stores and audit recorders
//!
//! # Example
//!
//! ```rust,ignore
//! use umrah_entitlements::subscription::{Action, Plans, SubscriptionEnforcer};
//!
//! let enforcer = SubscriptionEnforcer::new(tenant_store, usage_store, Plans::standard());
//!
//! let decision = enforcer.check_action_allowed(&company_id, Action::CreatePackage).await;
//! if !decision.is_allowed() {
//!     return Err(ApiError::Forbidden(decision.reason));
//! }
//!
//! // Dashboard data
//! let summary = enforcer.get_subscription_status(&company_id).await?;
//! let suggestions = enforcer.get_upgrade_suggestions(&company_id).await?;
//! ```

pub mod actions;
pub mod audit;
pub mod decision;
pub mod enforcement;
pub mod error;
pub mod plans;
#[cfg(feature = "seaorm")]
pub mod sea_orm_store;
pub mod status;
pub mod storage;
pub mod suggestions;
pub mod usage;
pub mod validation;

// Plan exports
pub use plans::{
    Feature, LimitCheckResult, PlanBuilder, PlanConfig, PlanLimits, Plans, PlansBuilder, Quota,
    StoredPlan,
};

// Storage exports
pub use storage::{
    COMPANY_ROLE, SubscriptionStatus, Tenant, TenantStore, TenantUpdate, UsageStore,
};

// Usage exports
pub use usage::{UsageSnapshot, start_of_month};

// Action and decision exports
pub use actions::{Action, Requirement};
pub use decision::Decision;

// Enforcement exports
pub use enforcement::SubscriptionEnforcer;

// Status and advisory exports
pub use status::{PlanSummary, Severity, SubscriptionSummary, Warning, WarningKind};
pub use suggestions::{UpgradeSuggestion, Urgency};

// Audit exports
pub use audit::{
    EntitlementAuditEvent, EntitlementAuditLogger, NoOpAuditLogger, TracingAuditLogger,
};

// Error exports
pub use error::{ExpiryKind, SubscriptionError};

// SeaORM storage exports
#[cfg(feature = "seaorm")]
pub use sea_orm_store::SeaOrmSubscriptionStore;

// Validation exports
pub use validation::{validate_plan_id, validate_tenant_id};

// Test exports
#[cfg(any(test, feature = "test-util"))]
pub use audit::test::RecordingAuditLogger;
#[cfg(any(test, feature = "test-util"))]
pub use storage::test::{
    FailingTenantStore, FailingUsageStore, InMemoryTenantStore, InMemoryUsageStore,
};
