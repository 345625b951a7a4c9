//! Storage traits for tenant subscription records and usage counts.
//!
//! Implement these traits over your database. In-memory implementations are
//! provided for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Role a tenant record must carry for entitlement checks to apply.
pub const COMPANY_ROLE: &str = "company";

/// Subscription lifecycle state cached on the tenant record.
///
/// The stored value may lag behind the clock; the enforcer reconciles it
/// against the end dates on every `check_action_allowed` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Inactive,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    /// Parse a stored status string. Unknown values are treated as inactive.
    #[must_use]
    pub fn parse(status: &str) -> Self {
        match status {
            "trial" => Self::Trial,
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            "expired" => Self::Expired,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Inactive,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses that deny every action without looking at plan or usage.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Inactive | Self::Expired | Self::Cancelled)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The subscription-related fields of a tenant (company) record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub role: String,
    pub subscription_status: SubscriptionStatus,
    pub subscription_plan: Option<String>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub trial_end_date: Option<DateTime<Utc>>,
}

impl Tenant {
    /// Check if this record is a company account.
    #[must_use]
    pub fn is_company(&self) -> bool {
        self.role == COMPANY_ROLE
    }

    /// Check if the subscription end date has passed.
    #[must_use]
    pub fn subscription_ended(&self, now: DateTime<Utc>) -> bool {
        self.subscription_end_date.is_some_and(|end| end < now)
    }

    /// Check if the trial has run out. Only meaningful while in trial.
    #[must_use]
    pub fn trial_ended(&self, now: DateTime<Utc>) -> bool {
        self.subscription_status == SubscriptionStatus::Trial
            && self.trial_end_date.is_some_and(|end| end < now)
    }
}

/// A partial update to a tenant's subscription fields.
///
/// `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantUpdate {
    pub subscription_status: Option<SubscriptionStatus>,
    pub subscription_plan: Option<Option<String>>,
    pub subscription_end_date: Option<Option<DateTime<Utc>>>,
    pub trial_end_date: Option<Option<DateTime<Utc>>>,
}

impl TenantUpdate {
    /// An update that only changes the status.
    #[must_use]
    pub fn status(status: SubscriptionStatus) -> Self {
        Self {
            subscription_status: Some(status),
            ..Default::default()
        }
    }

    /// Apply the update to a record in place.
    pub fn apply(&self, tenant: &mut Tenant) {
        if let Some(status) = self.subscription_status {
            tenant.subscription_status = status;
        }
        if let Some(plan) = &self.subscription_plan {
            tenant.subscription_plan = plan.clone();
        }
        if let Some(end) = self.subscription_end_date {
            tenant.subscription_end_date = end;
        }
        if let Some(end) = self.trial_end_date {
            tenant.trial_end_date = end;
        }
    }
}

/// Trait for reading and updating tenant subscription records.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Find a tenant by id, regardless of role.
    async fn find_by_id(&self, tenant_id: &str) -> Result<Option<Tenant>>;

    /// Apply a partial update to a tenant.
    ///
    /// Must be durable by the time the future resolves.
    async fn update(&self, tenant_id: &str, update: &TenantUpdate) -> Result<()>;
}

/// Trait for the aggregate counts entitlement checks are made against.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Count every package the tenant has ever created.
    async fn count_packages(&self, tenant_id: &str) -> Result<u64>;

    /// Count bookings on the tenant's packages created at or after `since`.
    async fn count_bookings_since(&self, tenant_id: &str, since: DateTime<Utc>) -> Result<u64>;

    /// Count photos attached to one package.
    ///
    /// The default reports zero, which makes the photo quota a no-op.
    /// Override this once photo storage is tracked.
    async fn count_package_photos(&self, _tenant_id: &str, _package_id: &str) -> Result<u64> {
        Ok(0)
    }
}

/// In-memory stores for testing.
#[cfg(any(test, feature = "test-util"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, RwLock};

    /// In-memory tenant store.
    ///
    /// Wraps data in Arc for cheap cloning.
    #[derive(Default, Clone)]
    pub struct InMemoryTenantStore {
        tenants: Arc<RwLock<HashMap<String, Tenant>>>,
        updates: Arc<AtomicUsize>,
    }

    impl InMemoryTenantStore {
        /// Create a new in-memory store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Insert or replace a tenant.
        pub fn insert(&self, tenant: Tenant) {
            self.tenants.write().unwrap().insert(tenant.id.clone(), tenant);
        }

        /// Read a tenant without going through the trait.
        pub fn get(&self, tenant_id: &str) -> Option<Tenant> {
            self.tenants.read().unwrap().get(tenant_id).cloned()
        }

        /// Number of `update` calls seen so far.
        pub fn update_count(&self) -> usize {
            self.updates.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TenantStore for InMemoryTenantStore {
        async fn find_by_id(&self, tenant_id: &str) -> Result<Option<Tenant>> {
            Ok(self.tenants.read().unwrap().get(tenant_id).cloned())
        }

        async fn update(&self, tenant_id: &str, update: &TenantUpdate) -> Result<()> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            if let Some(tenant) = self.tenants.write().unwrap().get_mut(tenant_id) {
                update.apply(tenant);
            }
            Ok(())
        }
    }

    /// Tenant store that fails either every lookup or every update.
    ///
    /// Lookups in write-failure mode are served from the wrapped store.
    #[derive(Clone)]
    pub struct FailingTenantStore {
        inner: InMemoryTenantStore,
        fail_reads: bool,
        message: String,
    }

    impl FailingTenantStore {
        /// A store whose `find_by_id` always fails.
        #[must_use]
        pub fn failing_reads(message: &str) -> Self {
            Self {
                inner: InMemoryTenantStore::new(),
                fail_reads: true,
                message: message.to_string(),
            }
        }

        /// A store that reads from `inner` but whose `update` always fails.
        #[must_use]
        pub fn failing_writes(inner: InMemoryTenantStore, message: &str) -> Self {
            Self {
                inner,
                fail_reads: false,
                message: message.to_string(),
            }
        }
    }

    #[async_trait]
    impl TenantStore for FailingTenantStore {
        async fn find_by_id(&self, tenant_id: &str) -> Result<Option<Tenant>> {
            if self.fail_reads {
                return Err(crate::error::EntitlementError::internal(self.message.clone()));
            }
            self.inner.find_by_id(tenant_id).await
        }

        async fn update(&self, _tenant_id: &str, _update: &TenantUpdate) -> Result<()> {
            Err(crate::error::EntitlementError::internal(self.message.clone()))
        }
    }

    #[derive(Default)]
    struct TenantUsage {
        packages: u64,
        bookings: Vec<DateTime<Utc>>,
        photos: HashMap<String, u64>,
    }

    /// In-memory usage store.
    #[derive(Default, Clone)]
    pub struct InMemoryUsageStore {
        usage: Arc<RwLock<HashMap<String, TenantUsage>>>,
    }

    impl InMemoryUsageStore {
        /// Create a new in-memory store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Set the lifetime package count for a tenant.
        pub fn set_packages(&self, tenant_id: &str, count: u64) {
            self.usage
                .write()
                .unwrap()
                .entry(tenant_id.to_string())
                .or_default()
                .packages = count;
        }

        /// Record a booking created at the given time.
        pub fn add_booking(&self, tenant_id: &str, created_at: DateTime<Utc>) {
            self.usage
                .write()
                .unwrap()
                .entry(tenant_id.to_string())
                .or_default()
                .bookings
                .push(created_at);
        }

        /// Record `count` bookings created at the given time.
        pub fn add_bookings(&self, tenant_id: &str, count: u64, created_at: DateTime<Utc>) {
            for _ in 0..count {
                self.add_booking(tenant_id, created_at);
            }
        }

        /// Set the photo count for one package.
        pub fn set_photos(&self, tenant_id: &str, package_id: &str, count: u64) {
            self.usage
                .write()
                .unwrap()
                .entry(tenant_id.to_string())
                .or_default()
                .photos
                .insert(package_id.to_string(), count);
        }
    }

    #[async_trait]
    impl UsageStore for InMemoryUsageStore {
        async fn count_packages(&self, tenant_id: &str) -> Result<u64> {
            Ok(self
                .usage
                .read()
                .unwrap()
                .get(tenant_id)
                .map(|u| u.packages)
                .unwrap_or(0))
        }

        async fn count_bookings_since(&self, tenant_id: &str, since: DateTime<Utc>) -> Result<u64> {
            Ok(self
                .usage
                .read()
                .unwrap()
                .get(tenant_id)
                .map(|u| u.bookings.iter().filter(|at| **at >= since).count() as u64)
                .unwrap_or(0))
        }

        async fn count_package_photos(&self, tenant_id: &str, package_id: &str) -> Result<u64> {
            Ok(self
                .usage
                .read()
                .unwrap()
                .get(tenant_id)
                .and_then(|u| u.photos.get(package_id).copied())
                .unwrap_or(0))
        }
    }

    /// Usage store whose reads always fail.
    #[derive(Debug, Clone)]
    pub struct FailingUsageStore {
        message: String,
    }

    impl FailingUsageStore {
        #[must_use]
        pub fn new(message: &str) -> Self {
            Self {
                message: message.to_string(),
            }
        }
    }

    #[async_trait]
    impl UsageStore for FailingUsageStore {
        async fn count_packages(&self, _tenant_id: &str) -> Result<u64> {
            Err(crate::error::EntitlementError::internal(self.message.clone()))
        }

        async fn count_bookings_since(&self, _tenant_id: &str, _since: DateTime<Utc>) -> Result<u64> {
            Err(crate::error::EntitlementError::internal(self.message.clone()))
        }
    }
}
