//! Entitlement enforcement.
//!
//! [`SubscriptionEnforcer`] decides whether a company may perform an action,
//! given its stored subscription state, the plan catalog and live usage.

use chrono::{Local, Utc};

use super::actions::{Action, Requirement};
use super::audit::{EntitlementAuditEvent, EntitlementAuditLogger, TracingAuditLogger};
use super::decision::Decision;
use super::error::{ExpiryKind, SubscriptionError};
use super::plans::{Feature, LimitCheckResult, PlanConfig, Plans, Quota};
use super::status::SubscriptionSummary;
use super::storage::{SubscriptionStatus, Tenant, TenantStore, TenantUpdate, UsageStore};
use super::suggestions::{UpgradeSuggestion, suggest_upgrades};
use super::usage::{UsageSnapshot, collect_usage, start_of_month};
use super::validation::validate_tenant_id;
use crate::config::EnforcementConfig;
use crate::error::Result;

const LOG_TARGET: &str = "umrah::entitlements";

/// Entitlement engine for company tenants.
///
/// Holds no per-tenant state; every call reads the tenant record and live
/// usage counts afresh.
pub struct SubscriptionEnforcer<T: TenantStore, U: UsageStore, L: EntitlementAuditLogger = TracingAuditLogger> {
    tenants: T,
    usage: U,
    plans: Plans,
    config: EnforcementConfig,
    audit: L,
}

impl<T: TenantStore, U: UsageStore> SubscriptionEnforcer<T, U> {
    /// Create an enforcer with default thresholds and tracing-backed audit logging.
    #[must_use]
    pub fn new(tenants: T, usage: U, plans: Plans) -> Self {
        Self {
            tenants,
            usage,
            plans,
            config: EnforcementConfig::default(),
            audit: TracingAuditLogger,
        }
    }
}

impl<T: TenantStore, U: UsageStore, L: EntitlementAuditLogger> SubscriptionEnforcer<T, U, L> {
    /// Replace the warning and suggestion thresholds.
    #[must_use]
    pub fn with_config(mut self, config: EnforcementConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the audit logger.
    #[must_use]
    pub fn with_audit_logger<A: EntitlementAuditLogger>(self, audit: A) -> SubscriptionEnforcer<T, U, A> {
        SubscriptionEnforcer {
            tenants: self.tenants,
            usage: self.usage,
            plans: self.plans,
            config: self.config,
            audit,
        }
    }

    #[must_use]
    pub fn plans(&self) -> &Plans {
        &self.plans
    }

    #[must_use]
    pub fn config(&self) -> &EnforcementConfig {
        &self.config
    }

    /// Decide whether the tenant may perform `action`.
    ///
    /// Always returns a decision. Checks run in order and stop at the first
    /// denial: tenant lookup, blocked status, end-date expiry, trial expiry,
    /// plan resolution, usage, then the action's own quota or feature check.
    /// Unrecognized actions are allowed once the earlier checks pass.
    ///
    /// When an end date has passed the tenant's status is persisted as
    /// `expired` before the decision is returned. A failed write or usage
    /// read produces a denial carrying the error detail.
    ///
    /// Quota checks are best-effort under concurrency: two requests racing
    /// at the boundary can both read the same count and both be allowed.
    /// Callers that need a hard cap must reserve the resource transactionally
    /// in their own store.
    pub async fn check_action_allowed(&self, tenant_id: &str, action: impl Into<Action>) -> Decision {
        let action = action.into();

        let decision = match self.evaluate(tenant_id, &action).await {
            Ok(decision) => decision,
            Err(err) => {
                tracing::error!(
                    target: LOG_TARGET,
                    tenant_id = %tenant_id,
                    action = %action,
                    error = %err,
                    "entitlement check failed"
                );
                self.audit
                    .log(EntitlementAuditEvent::EnforcementFailed {
                        tenant_id: tenant_id.to_string(),
                        action: action.to_string(),
                        error: err.message(),
                    })
                    .await;
                return Decision::deny(SubscriptionError::Internal {
                    message: err.message(),
                });
            }
        };

        if let Some(denial) = decision.denial() {
            tracing::debug!(
                target: LOG_TARGET,
                tenant_id = %tenant_id,
                action = %action,
                kind = denial.kind(),
                "action denied"
            );
            self.audit
                .log(EntitlementAuditEvent::ActionDenied {
                    tenant_id: tenant_id.to_string(),
                    action: action.to_string(),
                    kind: denial.kind().to_string(),
                    reason: decision.reason.clone(),
                })
                .await;
        } else {
            tracing::debug!(
                target: LOG_TARGET,
                tenant_id = %tenant_id,
                action = %action,
                reason = %decision.reason,
                "action allowed"
            );
        }

        decision
    }

    /// Live usage counts for a tenant.
    ///
    /// The photo count is zero since no package is in scope. Read failures
    /// are returned as-is.
    pub async fn get_current_usage(&self, tenant_id: &str) -> Result<UsageSnapshot> {
        validate_tenant_id(tenant_id)?;
        collect_usage(&self.usage, tenant_id, start_of_month(&Local::now()), None).await
    }

    /// Stored status, plan, usage and proactive warnings for a tenant.
    ///
    /// Read-only: a lapsed end date is not written back here.
    pub async fn get_subscription_status(&self, tenant_id: &str) -> Result<SubscriptionSummary> {
        let (tenant, plan, usage) = self.load_account(tenant_id).await?;
        Ok(SubscriptionSummary::build(&tenant, plan, usage, &self.config, Utc::now()))
    }

    /// Upgrade advice based on quota proximity and missing features.
    pub async fn get_upgrade_suggestions(&self, tenant_id: &str) -> Result<Vec<UpgradeSuggestion>> {
        let (_, plan, usage) = self.load_account(tenant_id).await?;
        Ok(suggest_upgrades(&self.plans, plan, &usage, &self.config))
    }

    async fn evaluate(&self, tenant_id: &str, action: &Action) -> Result<Decision> {
        let Some(tenant) = self.find_company(tenant_id).await? else {
            return Ok(Decision::deny(SubscriptionError::TenantNotFound {
                tenant_id: tenant_id.to_string(),
            }));
        };

        if tenant.subscription_status.is_blocked() {
            return Ok(Decision::deny(SubscriptionError::SubscriptionBlocked {
                status: tenant.subscription_status,
            }));
        }

        if let Some(expiry) = self.expire_if_lapsed(&tenant).await? {
            return Ok(Decision::deny(SubscriptionError::SubscriptionExpiredAtCheck { expiry }));
        }

        let Some(plan) = self.plans.resolve(tenant.subscription_plan.as_deref()) else {
            return Ok(Decision::deny(SubscriptionError::InvalidPlan {
                plan_id: tenant.subscription_plan.clone(),
            }));
        };

        let month_start = start_of_month(&Local::now());
        let usage = collect_usage(&self.usage, &tenant.id, month_start, action.package_id()).await?;

        Ok(match action.requirement() {
            Requirement::Quota(quota) => quota_decision(plan, quota, usage.get(quota)),
            Requirement::Feature(feature) => feature_decision(plan, feature),
            Requirement::None => Decision::allow("No specific limits for this action"),
        })
    }

    /// Look up a company tenant. Malformed ids and non-company records count as missing.
    async fn find_company(&self, tenant_id: &str) -> Result<Option<Tenant>> {
        if validate_tenant_id(tenant_id).is_err() {
            tracing::debug!(target: LOG_TARGET, "rejected malformed tenant id");
            return Ok(None);
        }

        Ok(self
            .tenants
            .find_by_id(tenant_id)
            .await?
            .filter(Tenant::is_company))
    }

    /// Persist `expired` if an end date has passed, returning which one did.
    async fn expire_if_lapsed(&self, tenant: &Tenant) -> Result<Option<ExpiryKind>> {
        let now = Utc::now();
        let expiry = if tenant.subscription_ended(now) {
            ExpiryKind::SubscriptionEnd
        } else if tenant.trial_ended(now) {
            ExpiryKind::TrialEnd
        } else {
            return Ok(None);
        };

        self.tenants
            .update(&tenant.id, &TenantUpdate::status(SubscriptionStatus::Expired))
            .await?;

        tracing::info!(
            target: LOG_TARGET,
            tenant_id = %tenant.id,
            previous_status = %tenant.subscription_status,
            trigger = expiry.as_str(),
            "subscription marked expired"
        );
        self.audit
            .log(EntitlementAuditEvent::SubscriptionAutoExpired {
                tenant_id: tenant.id.clone(),
                previous_status: tenant.subscription_status.to_string(),
                expiry: expiry.as_str().to_string(),
            })
            .await;

        Ok(Some(expiry))
    }

    /// Tenant, plan and usage for the read-only views.
    async fn load_account(&self, tenant_id: &str) -> Result<(Tenant, &PlanConfig, UsageSnapshot)> {
        let tenant = self
            .find_company(tenant_id)
            .await?
            .ok_or_else(|| SubscriptionError::TenantNotFound {
                tenant_id: tenant_id.to_string(),
            })?;

        let plan = self
            .plans
            .resolve(tenant.subscription_plan.as_deref())
            .ok_or_else(|| SubscriptionError::InvalidPlan {
                plan_id: tenant.subscription_plan.clone(),
            })?;

        let usage = collect_usage(&self.usage, &tenant.id, start_of_month(&Local::now()), None).await?;

        Ok((tenant, plan, usage))
    }
}

fn quota_decision(plan: &PlanConfig, quota: Quota, current: u64) -> Decision {
    match plan.check_limit(quota, current) {
        LimitCheckResult::Unlimited => Decision::allow(match quota {
            Quota::Packages => "Unlimited packages allowed",
            Quota::MonthlyBookings => "Unlimited bookings allowed",
            Quota::PhotosPerPackage => "Unlimited photos allowed",
        }),
        LimitCheckResult::WithinLimit { current, max } => {
            let verb = match quota {
                Quota::Packages => "Package creation",
                Quota::MonthlyBookings => "Booking creation",
                Quota::PhotosPerPackage => "Photo upload",
            };
            Decision::allow_within(format!("{} allowed ({}/{} used)", verb, current, max), max, current)
        }
        LimitCheckResult::AtLimit { current, max } => Decision::deny(SubscriptionError::QuotaExceeded {
            quota,
            limit: max,
            current,
        }),
    }
}

fn feature_decision(plan: &PlanConfig, feature: Feature) -> Decision {
    if plan.has_feature(feature) {
        Decision::allow(format!("{} available", feature.display_name()))
    } else {
        Decision::deny(SubscriptionError::FeatureNotEntitled { feature })
    }
}
