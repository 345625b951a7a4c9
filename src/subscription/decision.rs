//! Allow/deny decisions.

use serde::Serialize;

use super::error::SubscriptionError;
use super::storage::SubscriptionStatus;

/// The outcome of an entitlement check.
///
/// Every failure path, including storage errors, is folded into a denied
/// decision, so callers can branch on [`Decision::is_allowed`] directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[must_use = "decision must be checked to enforce access control"]
pub struct Decision {
    pub allowed: bool,
    pub reason: String,
    /// Plan cap for quota-bound actions (absent when unlimited).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Current usage for quota-bound actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<u64>,
    /// Set when the check itself moved the tenant to a new status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<SubscriptionStatus>,
    /// Underlying error detail for internal failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    denial: Option<SubscriptionError>,
}

impl Decision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            limit: None,
            current: None,
            subscription_status: None,
            error: None,
            denial: None,
        }
    }

    /// Allowed quota check with its usage figures.
    pub fn allow_within(reason: impl Into<String>, limit: u64, current: u64) -> Self {
        Self {
            limit: Some(limit),
            current: Some(current),
            ..Self::allow(reason)
        }
    }

    /// Build a denial from its condition, filling in the figures it carries.
    pub fn deny(denial: SubscriptionError) -> Self {
        let mut decision = Self {
            allowed: false,
            reason: denial.to_string(),
            limit: None,
            current: None,
            subscription_status: None,
            error: None,
            denial: None,
        };

        match &denial {
            SubscriptionError::QuotaExceeded { limit, current, .. } => {
                decision.limit = Some(*limit);
                decision.current = Some(*current);
            }
            SubscriptionError::SubscriptionExpiredAtCheck { .. } => {
                decision.subscription_status = Some(SubscriptionStatus::Expired);
            }
            SubscriptionError::Internal { message } => {
                decision.error = Some(message.clone());
            }
            _ => {}
        }

        decision.denial = Some(denial);
        decision
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// The condition behind a denial, if denied.
    #[must_use]
    pub fn denial(&self) -> Option<&SubscriptionError> {
        self.denial.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::error::ExpiryKind;
    use crate::subscription::plans::Quota;
    use serde_json::json;

    #[test]
    fn test_quota_denial_shape() {
        let decision = Decision::deny(SubscriptionError::QuotaExceeded {
            quota: Quota::Packages,
            limit: 5,
            current: 5,
        });

        assert_eq!(
            serde_json::to_value(&decision).unwrap(),
            json!({
                "allowed": false,
                "reason": "Package limit reached. Your plan allows 5 packages, you currently have 5.",
                "limit": 5,
                "current": 5
            })
        );
        assert_eq!(decision.denial().unwrap().kind(), "quota_exceeded");
    }

    #[test]
    fn test_expiry_denial_carries_status() {
        let decision = Decision::deny(SubscriptionError::SubscriptionExpiredAtCheck {
            expiry: ExpiryKind::TrialEnd,
        });

        assert_eq!(
            serde_json::to_value(&decision).unwrap(),
            json!({
                "allowed": false,
                "reason": "Trial period has expired. Please upgrade to continue.",
                "subscriptionStatus": "expired"
            })
        );
    }

    #[test]
    fn test_internal_denial_carries_error() {
        let decision = Decision::deny(SubscriptionError::Internal {
            message: "connection reset".to_string(),
        });
        assert!(!decision.is_allowed());
        assert_eq!(decision.reason, "Error checking subscription limits");
        assert_eq!(decision.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_allow_shapes() {
        let decision = Decision::allow("No specific limits for this action");
        assert_eq!(
            serde_json::to_value(&decision).unwrap(),
            json!({"allowed": true, "reason": "No specific limits for this action"})
        );
        assert!(decision.denial().is_none());

        let decision = Decision::allow_within("Package creation allowed (2/5 used)", 5, 2);
        assert_eq!(decision.limit, Some(5));
        assert_eq!(decision.current, Some(2));
    }
}
