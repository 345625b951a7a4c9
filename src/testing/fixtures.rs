//! Test fixtures for tenant records.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::subscription::{COMPANY_ROLE, SubscriptionStatus, Tenant};

/// Helper functions for generating fake ids
pub mod fake {
    use super::*;

    /// Generate a fake company id
    pub fn tenant_id() -> String {
        format!("co_{}", Uuid::new_v4().simple())
    }

    /// Generate a fake package id
    pub fn package_id() -> String {
        format!("pkg_{}", &Uuid::new_v4().simple().to_string()[..12])
    }

    /// Generate a fake UUID as a string
    pub fn uuid() -> String {
        Uuid::new_v4().to_string()
    }
}

/// Entry point for building tenant records in tests
pub struct TestTenant;

impl TestTenant {
    /// Create a new tenant builder
    pub fn builder() -> TestTenantBuilder {
        TestTenantBuilder::default()
    }

    /// An active company on the basic plan with a generated id
    pub fn generate() -> Tenant {
        Self::builder().build()
    }
}

/// Builder for tenant records.
///
/// Defaults to an active company on the `basic` plan with no end dates.
pub struct TestTenantBuilder {
    id: Option<String>,
    role: String,
    status: SubscriptionStatus,
    plan: Option<String>,
    subscription_end_date: Option<chrono::DateTime<Utc>>,
    trial_end_date: Option<chrono::DateTime<Utc>>,
}

impl Default for TestTenantBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTenantBuilder {
    pub fn new() -> Self {
        Self {
            id: None,
            role: COMPANY_ROLE.to_string(),
            status: SubscriptionStatus::Active,
            plan: Some("basic".to_string()),
            subscription_end_date: None,
            trial_end_date: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_status(mut self, status: SubscriptionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = Some(plan.into());
        self
    }

    /// Leave the plan unset
    pub fn without_plan(mut self) -> Self {
        self.plan = None;
        self
    }

    /// End date relative to now; negative values are in the past
    pub fn subscription_ends_in_days(mut self, days: i64) -> Self {
        self.subscription_end_date = Some(Utc::now() + Duration::days(days));
        self
    }

    /// End date relative to now, in hours
    pub fn subscription_ends_in_hours(mut self, hours: i64) -> Self {
        self.subscription_end_date = Some(Utc::now() + Duration::hours(hours));
        self
    }

    /// Trial end relative to now; negative values are in the past
    pub fn trial_ends_in_days(mut self, days: i64) -> Self {
        self.trial_end_date = Some(Utc::now() + Duration::days(days));
        self
    }

    pub fn build(self) -> Tenant {
        Tenant {
            id: self.id.unwrap_or_else(fake::tenant_id),
            role: self.role,
            subscription_status: self.status,
            subscription_plan: self.plan,
            subscription_end_date: self.subscription_end_date,
            trial_end_date: self.trial_end_date,
        }
    }
}
