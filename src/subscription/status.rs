//! Subscription status summaries and proactive warnings.
//!
//! A summary reports the status exactly as stored. It never reconciles the
//! status against the clock; that only happens in `check_action_allowed`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::plans::{PlanConfig, PlanLimits, Quota};
use super::storage::{SubscriptionStatus, Tenant};
use super::usage::UsageSnapshot;
use crate::config::EnforcementConfig;

const SECONDS_PER_DAY: i64 = 86_400;

/// Point-in-time view of a tenant's subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSummary {
    pub status: SubscriptionStatus,
    pub plan: PlanSummary,
    pub usage: UsageSnapshot,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub trial_end_date: Option<DateTime<Utc>>,
    /// Whole days left before the end date, rounded up. `None` once it has passed.
    pub days_until_expiry: Option<i64>,
    pub warnings: Vec<Warning>,
}

impl SubscriptionSummary {
    /// Build a summary from stored data and live usage.
    #[must_use]
    pub fn build(
        tenant: &Tenant,
        plan: &PlanConfig,
        usage: UsageSnapshot,
        config: &EnforcementConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let mut warnings = usage_warnings(&plan.limits, &usage, config);
        warnings.extend(expiry_warning(tenant.subscription_end_date, now, config));

        Self {
            status: tenant.subscription_status,
            plan: PlanSummary::from(plan),
            usage,
            subscription_end_date: tenant.subscription_end_date,
            trial_end_date: tenant.trial_end_date,
            days_until_expiry: tenant
                .subscription_end_date
                .and_then(|end| days_until(end, now)),
            warnings,
        }
    }

    /// Check if any warning is critical.
    #[must_use]
    pub fn has_critical_warning(&self) -> bool {
        self.warnings.iter().any(|w| w.severity == Severity::Critical)
    }
}

/// The plan fields shown in a summary. Unlimited quotas serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub id: String,
    pub name: String,
    pub price_cents: u64,
    pub currency: String,
    pub max_packages: Option<u64>,
    pub max_bookings_per_month: Option<u64>,
    pub max_photos_per_package: Option<u64>,
    /// Granted flags by key, sorted.
    pub features: Vec<String>,
}

impl From<&PlanConfig> for PlanSummary {
    fn from(plan: &PlanConfig) -> Self {
        let mut features: Vec<String> = plan
            .features
            .iter()
            .map(|f| f.key().to_string())
            .chain(plan.custom_features.iter().cloned())
            .collect();
        features.sort();

        Self {
            id: plan.id.clone(),
            name: plan.name.clone(),
            price_cents: plan.price_cents,
            currency: plan.currency.clone(),
            max_packages: plan.limits.max_packages,
            max_bookings_per_month: plan.limits.max_bookings_per_month,
            max_photos_per_package: plan.limits.max_photos_per_package,
            features,
        }
    }
}

/// A proactive alert about usage or expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    PackageLimit,
    BookingLimit,
    SubscriptionExpiry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

/// Check if `usage` has reached `percent` of `limit`.
///
/// Integer arithmetic, so exactly 80% counts as reaching 80%. An untouched
/// zero limit is not considered reached.
pub(crate) fn percent_reached(usage: u64, limit: u64, percent: u32) -> bool {
    if limit == 0 && usage == 0 {
        return false;
    }
    u128::from(usage) * 100 >= u128::from(limit) * u128::from(percent)
}

/// Whole days from `now` until `end`, rounded up. `None` if `end` is not in the future.
#[must_use]
pub fn days_until(end: DateTime<Utc>, now: DateTime<Utc>) -> Option<i64> {
    if end <= now {
        return None;
    }
    let seconds = (end - now).num_seconds();
    Some(((seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY).max(1))
}

/// Warnings for the package and monthly booking quotas. Unlimited quotas are skipped.
#[must_use]
pub fn usage_warnings(
    limits: &PlanLimits,
    usage: &UsageSnapshot,
    config: &EnforcementConfig,
) -> Vec<Warning> {
    [Quota::Packages, Quota::MonthlyBookings]
        .into_iter()
        .filter_map(|quota| {
            let limit = limits.get(quota)?;
            let current = usage.get(quota);

            let severity = if percent_reached(current, limit, config.usage_critical_percent) {
                Severity::Critical
            } else if percent_reached(current, limit, config.usage_warning_percent) {
                Severity::Warning
            } else {
                return None;
            };

            Some(quota_warning(quota, current, limit, severity))
        })
        .collect()
}

fn quota_warning(quota: Quota, current: u64, limit: u64, severity: Severity) -> Warning {
    let (kind, noun) = match quota {
        Quota::MonthlyBookings => (WarningKind::BookingLimit, "monthly booking"),
        _ => (WarningKind::PackageLimit, "package"),
    };

    let message = if current >= limit {
        format!("You have reached your {} limit ({}/{} used).", noun, current, limit)
    } else if severity == Severity::Critical {
        format!("You have almost reached your {} limit ({}/{} used).", noun, current, limit)
    } else {
        format!("You are approaching your {} limit ({}/{} used).", noun, current, limit)
    };

    Warning {
        kind,
        message,
        severity,
    }
}

/// Warning for an end date that falls within the warning window.
///
/// A past end date yields nothing; that case is a hard deny in
/// `check_action_allowed` instead.
#[must_use]
pub fn expiry_warning(
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &EnforcementConfig,
) -> Option<Warning> {
    let days = days_until(end?, now)?;

    let severity = if days <= config.expiry_critical_days {
        Severity::Critical
    } else if days <= config.expiry_warning_days {
        Severity::Warning
    } else {
        return None;
    };

    let message = if days == 1 {
        "Your subscription expires in 1 day. Renew now to avoid interruption.".to_string()
    } else {
        format!(
            "Your subscription expires in {} days. Renew now to avoid interruption.",
            days
        )
    };

    Some(Warning {
        kind: WarningKind::SubscriptionExpiry,
        message,
        severity,
    })
}
