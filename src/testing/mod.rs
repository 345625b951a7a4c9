//! Testing utilities for code built on the entitlement engine.
//!
//! Provides a tenant builder and id generators. The in-memory stores live
//! next to their traits in [`crate::subscription::storage::test`].
//!
//! # Example
//!
//! ```rust,ignore
//! use umrah_entitlements::subscription::{InMemoryTenantStore, SubscriptionStatus};
//! use umrah_entitlements::testing::TestTenant;
//!
//! let tenants = InMemoryTenantStore::new();
//! let tenant = TestTenant::builder()
//!     .with_status(SubscriptionStatus::Trial)
//!     .trial_ends_in_days(-1)
//!     .build();
//! tenants.insert(tenant.clone());
//! ```

mod fixtures;

pub use fixtures::{TestTenant, TestTenantBuilder, fake};
