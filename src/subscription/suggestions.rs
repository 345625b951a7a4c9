//! Upgrade advice derived from usage and plan features.

use serde::Serialize;

use super::plans::{Feature, PlanConfig, Plans, Quota};
use super::status::percent_reached;
use super::usage::UsageSnapshot;
use crate::config::EnforcementConfig;

/// A suggested plan change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeSuggestion {
    pub reason: String,
    pub suggestion: String,
    pub urgency: Urgency,
    /// Cheapest catalog plan that resolves the limitation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_plan: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Optional,
    Recommended,
    Critical,
}

/// Features whose absence produces an optional suggestion.
///
/// Featured listings are gated by `check_action_allowed` but never suggested.
const SUGGESTED_FEATURES: [Feature; 2] = [Feature::AnalyticsAccess, Feature::PrioritySupport];

/// Build the suggestion list for a tenant on `plan`.
///
/// Quota suggestions come first (packages, then bookings), followed by
/// missing features.
#[must_use]
pub fn suggest_upgrades(
    plans: &Plans,
    plan: &PlanConfig,
    usage: &UsageSnapshot,
    config: &EnforcementConfig,
) -> Vec<UpgradeSuggestion> {
    let quotas = [Quota::Packages, Quota::MonthlyBookings]
        .into_iter()
        .filter_map(|quota| quota_suggestion(plans, plan, quota, usage.get(quota), config));

    let features = SUGGESTED_FEATURES
        .into_iter()
        .filter(|feature| !plan.has_feature(*feature))
        .map(|feature| feature_suggestion(plans, plan, feature));

    quotas.chain(features).collect()
}

fn quota_suggestion(
    plans: &Plans,
    plan: &PlanConfig,
    quota: Quota,
    current: u64,
    config: &EnforcementConfig,
) -> Option<UpgradeSuggestion> {
    let limit = plan.limits.get(quota)?;
    if !percent_reached(current, limit, config.suggestion_percent) {
        return None;
    }

    let urgency = if current >= limit {
        Urgency::Critical
    } else {
        Urgency::Recommended
    };

    let (reason, noun) = match quota {
        Quota::Packages => (
            format!("You are using {} of {} packages allowed by your plan.", current, limit),
            "packages",
        ),
        Quota::MonthlyBookings => (
            format!("You have {} of {} bookings allowed this month.", current, limit),
            "monthly bookings",
        ),
        Quota::PhotosPerPackage => (
            format!("You are using {} of {} photos allowed per package.", current, limit),
            "photos per package",
        ),
    };

    let target = plans.cheapest_with_more(plan, quota);
    let suggestion = match target {
        Some(target) if target.limits.get(quota).is_none() => {
            format!("Upgrade to {} for unlimited {}.", target.name, noun)
        }
        Some(target) => format!("Upgrade to {} for more {}.", target.name, noun),
        None => format!("Contact support about a plan with more {}.", noun),
    };

    Some(UpgradeSuggestion {
        reason,
        suggestion,
        urgency,
        suggested_plan: target.map(|p| p.id.clone()),
    })
}

fn feature_suggestion(plans: &Plans, plan: &PlanConfig, feature: Feature) -> UpgradeSuggestion {
    let target = plans.cheapest_with_feature(plan, feature);
    let benefit = match feature {
        Feature::AnalyticsAccess => "detailed insights into your packages and bookings",
        Feature::PrioritySupport => "faster responses from our support team",
        Feature::FeaturedListings => "featured placement for your packages",
    };

    let suggestion = match target {
        Some(target) => format!("Upgrade to {} for {}.", target.name, benefit),
        None => format!("Upgrade your plan for {}.", benefit),
    };

    UpgradeSuggestion {
        reason: format!("{} is not included in your current plan.", feature.display_name()),
        suggestion,
        urgency: Urgency::Optional,
        suggested_plan: target.map(|p| p.id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(packages: u64, bookings: u64) -> UsageSnapshot {
        UsageSnapshot {
            packages,
            bookings_this_month: bookings,
            max_photos_in_package: 0,
        }
    }

    #[test]
    fn test_basic_plan_low_usage_suggests_features_only() {
        let plans = Plans::standard();
        let basic = plans.get("basic").unwrap();

        let suggestions = suggest_upgrades(&plans, basic, &usage(1, 5), &EnforcementConfig::default());

        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.iter().all(|s| s.urgency == Urgency::Optional));
        assert!(suggestions[0].reason.starts_with("Analytics access"));
        assert_eq!(suggestions[0].suggested_plan.as_deref(), Some("premium"));
        assert!(suggestions[1].reason.starts_with("Priority support"));
        assert_eq!(suggestions[1].suggested_plan.as_deref(), Some("enterprise"));
    }

    #[test]
    fn test_quota_urgency() {
        let plans = Plans::standard();
        let basic = plans.get("basic").unwrap();
        let config = EnforcementConfig::default();

        let suggestions = suggest_upgrades(&plans, basic, &usage(4, 50), &config);
        assert_eq!(suggestions[0].urgency, Urgency::Recommended);
        assert!(suggestions[0].reason.contains("4 of 5 packages"));
        assert_eq!(suggestions[0].suggested_plan.as_deref(), Some("premium"));
        assert_eq!(suggestions[1].urgency, Urgency::Critical);
        assert!(suggestions[1].reason.contains("50 of 50 bookings"));

        let suggestions = suggest_upgrades(&plans, basic, &usage(3, 0), &config);
        assert!(suggestions.iter().all(|s| s.urgency == Urgency::Optional));
    }

    #[test]
    fn test_featured_listings_never_suggested() {
        let plans = Plans::standard();
        let premium = plans.get("premium").unwrap();
        assert!(!premium.has_feature(Feature::PrioritySupport));

        let suggestions = suggest_upgrades(&plans, premium, &usage(0, 0), &EnforcementConfig::default());
        assert_eq!(suggestions.len(), 1);
        assert!(suggestions[0].reason.starts_with("Priority support"));
        assert!(!suggestions.iter().any(|s| s.reason.contains("Featured")));
    }

    #[test]
    fn test_enterprise_gets_nothing() {
        let plans = Plans::standard();
        let enterprise = plans.get("enterprise").unwrap();
        let suggestions = suggest_upgrades(
            &plans,
            enterprise,
            &usage(100_000, 100_000),
            &EnforcementConfig::default(),
        );
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_unlimited_target_wording() {
        let plans = Plans::builder()
            .plan("small")
                .name("Small")
                .price_cents(100)
                .max_packages(2)
                .feature(Feature::AnalyticsAccess)
                .feature(Feature::PrioritySupport)
                .done()
            .plan("big")
                .name("Big")
                .price_cents(200)
                .done()
            .build();
        let small = plans.get("small").unwrap();

        let suggestions = suggest_upgrades(&plans, small, &usage(2, 0), &EnforcementConfig::default());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].suggestion, "Upgrade to Big for unlimited packages.");
        assert_eq!(suggestions[0].urgency, Urgency::Critical);
    }

    #[test]
    fn test_no_covering_plan() {
        let plans = Plans::builder()
            .plan("only")
                .name("Only")
                .max_packages(1)
                .done()
            .build();
        let only = plans.get("only").unwrap();

        let suggestions = suggest_upgrades(&plans, only, &usage(1, 0), &EnforcementConfig::default());
        assert_eq!(suggestions[0].suggested_plan, None);
        assert_eq!(suggestions[0].suggestion, "Contact support about a plan with more packages.");
        assert_eq!(suggestions[1].suggestion, "Upgrade your plan for detailed insights into your packages and bookings.");
    }

    #[test]
    fn test_serialize() {
        let plans = Plans::standard();
        let suggestions = suggest_upgrades(
            &plans,
            plans.get("basic").unwrap(),
            &usage(5, 0),
            &EnforcementConfig::default(),
        );
        let json = serde_json::to_value(&suggestions[0]).unwrap();
        assert_eq!(json["urgency"], "critical");
        assert_eq!(json["suggestedPlan"], "premium");
    }
}
