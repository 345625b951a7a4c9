//! Reasons an entitlement check can deny an action.
//!
//! The `Display` text of each variant is the user-facing reason carried by a
//! denied [`Decision`](super::Decision). Variants can also be converted into
//! `EntitlementError` for the `Result`-returning views.

use std::fmt;

use super::plans::{Feature, Quota};
use super::storage::SubscriptionStatus;

/// Which end date triggered a lazy expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryKind {
    /// `subscription_end_date` has passed.
    SubscriptionEnd,
    /// `trial_end_date` has passed while in trial.
    TrialEnd,
}

impl ExpiryKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubscriptionEnd => "subscription_end",
            Self::TrialEnd => "trial_end",
        }
    }
}

/// Subscription-specific denial conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// No company with this id.
    TenantNotFound { tenant_id: String },
    /// The tenant's plan id is unset or not in the catalog.
    InvalidPlan { plan_id: Option<String> },
    /// The stored status denies everything.
    SubscriptionBlocked { status: SubscriptionStatus },
    /// An end date passed and the status was just moved to expired.
    SubscriptionExpiredAtCheck { expiry: ExpiryKind },
    /// Usage has reached the plan's cap.
    QuotaExceeded { quota: Quota, limit: u64, current: u64 },
    /// The plan does not include the feature.
    FeatureNotEntitled { feature: Feature },
    /// Reading tenant or usage data failed.
    Internal { message: String },
}

impl fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TenantNotFound { .. } => write!(f, "Company not found"),
            Self::InvalidPlan { .. } => write!(f, "Invalid subscription plan"),
            Self::SubscriptionBlocked { status } => match status {
                SubscriptionStatus::Inactive => write!(
                    f,
                    "Subscription is inactive. Please contact support to reactivate your account."
                ),
                SubscriptionStatus::Expired => {
                    write!(f, "Subscription has expired. Please renew to continue.")
                }
                SubscriptionStatus::Cancelled => write!(
                    f,
                    "Subscription has been cancelled. Please subscribe again to continue."
                ),
                other => write!(f, "Subscription is {}", other),
            },
            Self::SubscriptionExpiredAtCheck { expiry } => match expiry {
                ExpiryKind::SubscriptionEnd => {
                    write!(f, "Subscription has expired. Please renew to continue.")
                }
                ExpiryKind::TrialEnd => {
                    write!(f, "Trial period has expired. Please upgrade to continue.")
                }
            },
            Self::QuotaExceeded { quota, limit, current } => match quota {
                Quota::Packages => write!(
                    f,
                    "Package limit reached. Your plan allows {} packages, you currently have {}.",
                    limit, current
                ),
                Quota::MonthlyBookings => write!(
                    f,
                    "Monthly booking limit reached. Your plan allows {} bookings per month, you currently have {}.",
                    limit, current
                ),
                Quota::PhotosPerPackage => write!(
                    f,
                    "Photo limit reached. Your plan allows {} photos per package, this package currently has {}.",
                    limit, current
                ),
            },
            Self::FeatureNotEntitled { feature } => write!(
                f,
                "{} is not available in your current plan. Please upgrade to access this feature.",
                feature.display_name()
            ),
            Self::Internal { .. } => write!(f, "Error checking subscription limits"),
        }
    }
}

impl std::error::Error for SubscriptionError {}

impl SubscriptionError {
    /// Stable machine-readable tag for this condition.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TenantNotFound { .. } => "tenant_not_found",
            Self::InvalidPlan { .. } => "invalid_plan",
            Self::SubscriptionBlocked { .. } => "subscription_blocked",
            Self::SubscriptionExpiredAtCheck { .. } => "subscription_expired",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::FeatureNotEntitled { .. } => "feature_not_entitled",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Check if the denial is due to the tenant's own state rather than a
    /// backend failure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Check if this is a backend failure.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

impl From<SubscriptionError> for crate::error::EntitlementError {
    fn from(err: SubscriptionError) -> Self {
        match &err {
            SubscriptionError::TenantNotFound { .. } | SubscriptionError::InvalidPlan { .. } => {
                crate::error::EntitlementError::NotFound(err.to_string())
            }

            SubscriptionError::SubscriptionBlocked { .. }
            | SubscriptionError::SubscriptionExpiredAtCheck { .. }
            | SubscriptionError::QuotaExceeded { .. }
            | SubscriptionError::FeatureNotEntitled { .. } => {
                crate::error::EntitlementError::Forbidden(err.to_string())
            }

            SubscriptionError::Internal { message } => {
                crate::error::EntitlementError::Internal(message.clone())
            }
        }
    }
}
