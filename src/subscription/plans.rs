//! Plan catalog.
//!
//! Plans are a small, read-only table of quotas and feature flags. Lookups are
//! synchronous; an unknown or unset plan id resolves to `None`.
//!
//! # Code-configured plans
//!
//! ```rust
//! use umrah_entitlements::subscription::{Feature, Plans};
//!
//! let plans = Plans::builder()
//!     .plan("basic")
//!         .name("Basic")
//!         .price_cents(19_900)
//!         .max_packages(5)
//!         .max_bookings_per_month(50)
//!         .done()
//!     .plan("premium")
//!         .name("Premium")
//!         .price_cents(49_900)
//!         .max_packages(20)
//!         .feature(Feature::AnalyticsAccess)
//!         .done()
//!     .build();
//!
//! assert!(plans.resolve(Some("basic")).is_some());
//! assert!(plans.resolve(Some("gold")).is_none());
//! ```
//!
//! # JSON-configured plans
//!
//! Plans can also be loaded from a JSON array where each entry carries a
//! `features` object of quotas (`-1` = unlimited) and boolean flags:
//!
//! ```rust
//! use umrah_entitlements::subscription::Plans;
//!
//! let plans = Plans::from_json(r#"[
//!     {"id": "basic", "name": "Basic", "price": 19900,
//!      "features": {"maxPackages": 5, "maxBookingsPerMonth": -1, "analyticsAccess": false}}
//! ]"#).unwrap();
//!
//! let basic = plans.get("basic").unwrap();
//! assert_eq!(basic.limits.max_packages, Some(5));
//! assert_eq!(basic.limits.max_bookings_per_month, None);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::validation::validate_plan_id;
use crate::error::{EntitlementError, Result};

/// A boolean feature flag a plan may grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    #[serde(rename = "analyticsAccess")]
    AnalyticsAccess,
    #[serde(rename = "prioritySupport")]
    PrioritySupport,
    #[serde(rename = "featuredListings")]
    FeaturedListings,
}

impl Feature {
    /// Key used for this flag in plan definitions.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::AnalyticsAccess => "analyticsAccess",
            Self::PrioritySupport => "prioritySupport",
            Self::FeaturedListings => "featuredListings",
        }
    }

    /// Human-readable name used in decision reasons.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::AnalyticsAccess => "Analytics access",
            Self::PrioritySupport => "Priority support",
            Self::FeaturedListings => "Featured listings",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A countable resource capped by a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quota {
    /// Lifetime count of packages created by the tenant.
    Packages,
    /// Bookings created since the first day of the current month.
    MonthlyBookings,
    /// Photos attached to a single package.
    PhotosPerPackage,
}

impl Quota {
    /// Key used for this quota in plan definitions.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Packages => "maxPackages",
            Self::MonthlyBookings => "maxBookingsPerMonth",
            Self::PhotosPerPackage => "maxPhotosPerPackage",
        }
    }
}

/// A collection of plan configurations.
#[derive(Clone, Debug, Default)]
pub struct Plans {
    plans: HashMap<String, PlanConfig>,
}

impl Plans {
    /// Create a new empty plans collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing plans.
    #[must_use]
    pub fn builder() -> PlansBuilder {
        PlansBuilder::new()
    }

    /// The built-in catalog offered to companies.
    ///
    /// | Plan | Packages | Bookings/month | Photos/package | Flags |
    /// |------|----------|----------------|----------------|-------|
    /// | basic | 5 | 50 | 10 | - |
    /// | premium | 20 | 200 | 25 | analytics, featured |
    /// | enterprise | unlimited | unlimited | unlimited | all |
    #[must_use]
    pub fn standard() -> Self {
        Self::builder()
            .plan("basic")
                .name("Basic")
                .price_cents(19_900)
                .max_packages(5)
                .max_bookings_per_month(50)
                .max_photos_per_package(10)
                .done()
            .plan("premium")
                .name("Premium")
                .price_cents(49_900)
                .max_packages(20)
                .max_bookings_per_month(200)
                .max_photos_per_package(25)
                .features([Feature::AnalyticsAccess, Feature::FeaturedListings])
                .done()
            .plan("enterprise")
                .name("Enterprise")
                .price_cents(99_900)
                .features([
                    Feature::AnalyticsAccess,
                    Feature::PrioritySupport,
                    Feature::FeaturedListings,
                ])
                .done()
            .build()
    }

    /// Load plans from a JSON array of plan definitions.
    ///
    /// # Errors
    ///
    /// Returns a bad-request error if the JSON is malformed, a plan id is
    /// not a valid identifier, or a quota is not a whole number or `-1`.
    pub fn from_json(json: &str) -> Result<Self> {
        let stored: Vec<StoredPlan> = serde_json::from_str(json)?;
        for plan in &stored {
            validate_plan_id(&plan.id)?;
        }
        Self::from_stored(stored)
    }

    /// Create a Plans collection from stored plan definitions.
    ///
    /// # Errors
    ///
    /// Returns a bad-request error if any quota is malformed.
    pub fn from_stored(stored: Vec<StoredPlan>) -> Result<Self> {
        let plans = stored
            .into_iter()
            .map(|sp| PlanConfig::try_from(sp).map(|config| (config.id.clone(), config)))
            .collect::<Result<_>>()?;
        Ok(Self { plans })
    }

    /// Add a single plan config, replacing any plan with the same id.
    pub fn add(&mut self, config: PlanConfig) {
        self.plans.insert(config.id.clone(), config);
    }

    /// Get a plan by ID.
    #[must_use]
    pub fn get(&self, plan_id: &str) -> Option<&PlanConfig> {
        self.plans.get(plan_id)
    }

    /// Resolve a tenant's (possibly unset) plan id.
    #[must_use]
    pub fn resolve(&self, plan_id: Option<&str>) -> Option<&PlanConfig> {
        plan_id.and_then(|id| self.get(id))
    }

    /// Check if a plan exists.
    #[must_use]
    pub fn contains(&self, plan_id: &str) -> bool {
        self.plans.contains_key(plan_id)
    }

    /// Get the number of plans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Check if there are no plans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Iterate over all plans.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlanConfig)> {
        self.plans.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Cheapest plan other than `current` that lifts the given quota.
    #[must_use]
    pub fn cheapest_with_more(&self, current: &PlanConfig, quota: Quota) -> Option<&PlanConfig> {
        let current_limit = current.limits.get(quota);
        self.cheapest_matching(current, |plan| match (plan.limits.get(quota), current_limit) {
            (None, Some(_)) => true,
            (Some(candidate), Some(limit)) => candidate > limit,
            (_, None) => false,
        })
    }

    /// Cheapest plan other than `current` that grants the feature.
    #[must_use]
    pub fn cheapest_with_feature(&self, current: &PlanConfig, feature: Feature) -> Option<&PlanConfig> {
        self.cheapest_matching(current, |plan| plan.has_feature(feature))
    }

    fn cheapest_matching<F>(&self, current: &PlanConfig, predicate: F) -> Option<&PlanConfig>
    where
        F: Fn(&PlanConfig) -> bool,
    {
        self.plans
            .values()
            .filter(|p| p.id != current.id && predicate(p))
            // Ties broken by id so the answer is stable across HashMap orderings
            .min_by(|a, b| a.price_cents.cmp(&b.price_cents).then_with(|| a.id.cmp(&b.id)))
    }
}

/// Configuration for a single plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanConfig {
    /// Plan identifier (e.g., "basic", "premium").
    pub id: String,
    /// Display name for the plan.
    pub name: String,
    /// Price in minor currency units.
    pub price_cents: u64,
    /// Currency code (e.g., "sar", "usd").
    pub currency: String,
    /// Quota limits for this plan.
    pub limits: PlanLimits,
    /// Known feature flags granted by this plan.
    pub features: HashSet<Feature>,
    /// Flags granted by this plan that this crate does not gate on itself.
    pub custom_features: HashSet<String>,
}

impl PlanConfig {
    /// Check if this plan grants a feature.
    #[must_use]
    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Check a flag by its key, including custom flags.
    #[must_use]
    pub fn has_flag(&self, key: &str) -> bool {
        self.features.iter().any(|f| f.key() == key) || self.custom_features.contains(key)
    }

    /// Check if a resource usage is within limits.
    #[must_use]
    pub fn check_limit(&self, quota: Quota, current: u64) -> LimitCheckResult {
        self.limits.check(quota, current)
    }
}

/// Quota limits for a plan. `None` means unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlanLimits {
    /// Maximum number of packages over the tenant's lifetime.
    pub max_packages: Option<u64>,
    /// Maximum bookings per calendar month.
    pub max_bookings_per_month: Option<u64>,
    /// Maximum photos per package.
    pub max_photos_per_package: Option<u64>,
}

impl PlanLimits {
    /// Create unlimited limits.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Get a specific limit value.
    #[must_use]
    pub fn get(&self, quota: Quota) -> Option<u64> {
        match quota {
            Quota::Packages => self.max_packages,
            Quota::MonthlyBookings => self.max_bookings_per_month,
            Quota::PhotosPerPackage => self.max_photos_per_package,
        }
    }

    /// Check if a resource usage is within limits.
    #[must_use]
    pub fn check(&self, quota: Quota, current: u64) -> LimitCheckResult {
        match self.get(quota) {
            None => LimitCheckResult::Unlimited,
            Some(max) if current < max => LimitCheckResult::WithinLimit { current, max },
            Some(max) => LimitCheckResult::AtLimit { current, max },
        }
    }

    /// Convert a wire value to a limit. Only `-1` means unlimited; whole-number
    /// floats are accepted, anything else is rejected.
    fn from_wire(plan_id: &str, key: &str, value: &serde_json::Value) -> Result<Option<u64>> {
        if let Some(n) = value.as_u64() {
            return Ok(Some(n));
        }
        if value.as_i64() == Some(-1) {
            return Ok(None);
        }
        if let Some(f) = value.as_f64() {
            if f == -1.0 {
                return Ok(None);
            }
            if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
                return Ok(Some(f as u64));
            }
        }
        Err(EntitlementError::bad_request(format!(
            "plan '{}': {} must be a non-negative whole number or -1, got {}",
            plan_id, key, value
        )))
    }
}

/// Result of checking a resource limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LimitCheckResult {
    /// No limit on this resource.
    Unlimited,
    /// Usage is within the limit.
    WithinLimit { current: u64, max: u64 },
    /// Usage has reached or exceeded the limit.
    AtLimit { current: u64, max: u64 },
}

impl LimitCheckResult {
    /// Check if usage is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Unlimited | Self::WithinLimit { .. })
    }

    /// Check if at or over limit.
    #[must_use]
    pub fn is_at_limit(&self) -> bool {
        matches!(self, Self::AtLimit { .. })
    }
}

/// A plan definition as stored in configuration files or a database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredPlan {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Price in minor currency units.
    #[serde(default, alias = "price_cents")]
    pub price: u64,
    #[serde(default)]
    pub currency: Option<String>,
    /// Quotas and boolean flags, keyed as in [`Quota::key`] and [`Feature::key`].
    #[serde(default)]
    pub features: serde_json::Value,
}

impl TryFrom<StoredPlan> for PlanConfig {
    type Error = EntitlementError;

    fn try_from(stored: StoredPlan) -> Result<Self> {
        let mut limits = PlanLimits::default();
        let mut features = HashSet::new();
        let mut custom_features = HashSet::new();

        if let Some(obj) = stored.features.as_object() {
            for (key, value) in obj {
                let quota = match key.as_str() {
                    "maxPackages" => Some(&mut limits.max_packages),
                    "maxBookingsPerMonth" => Some(&mut limits.max_bookings_per_month),
                    "maxPhotosPerPackage" => Some(&mut limits.max_photos_per_package),
                    _ => None,
                };
                if let Some(slot) = quota {
                    *slot = PlanLimits::from_wire(&stored.id, key, value)?;
                } else if value.as_bool().unwrap_or(false) {
                    match key.as_str() {
                        "analyticsAccess" => {
                            features.insert(Feature::AnalyticsAccess);
                        }
                        "prioritySupport" => {
                            features.insert(Feature::PrioritySupport);
                        }
                        "featuredListings" => {
                            features.insert(Feature::FeaturedListings);
                        }
                        _ => {
                            custom_features.insert(key.clone());
                        }
                    }
                }
            }
        }

        Ok(Self {
            name: stored.name.unwrap_or_else(|| stored.id.clone()),
            id: stored.id,
            price_cents: stored.price,
            currency: stored.currency.unwrap_or_else(|| "sar".to_string()),
            limits,
            features,
            custom_features,
        })
    }
}

/// Builder for constructing a collection of plans.
#[derive(Debug, Default)]
pub struct PlansBuilder {
    plans: HashMap<String, PlanConfig>,
}

impl PlansBuilder {
    /// Create a new plans builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start defining a new plan.
    #[must_use]
    pub fn plan(self, id: &str) -> PlanBuilder {
        PlanBuilder {
            parent: self,
            id: id.to_string(),
            name: None,
            price_cents: 0,
            currency: None,
            limits: PlanLimits::default(),
            features: HashSet::new(),
            custom_features: HashSet::new(),
        }
    }

    /// Build the plans collection.
    #[must_use]
    pub fn build(self) -> Plans {
        Plans { plans: self.plans }
    }

    fn add_plan(mut self, config: PlanConfig) -> Self {
        self.plans.insert(config.id.clone(), config);
        self
    }
}

/// Builder for a single plan configuration.
#[derive(Debug)]
pub struct PlanBuilder {
    parent: PlansBuilder,
    id: String,
    name: Option<String>,
    price_cents: u64,
    currency: Option<String>,
    limits: PlanLimits,
    features: HashSet<Feature>,
    custom_features: HashSet<String>,
}

impl PlanBuilder {
    /// Set the display name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the price in minor currency units.
    #[must_use]
    pub fn price_cents(mut self, price: u64) -> Self {
        self.price_cents = price;
        self
    }

    /// Set the currency code.
    #[must_use]
    pub fn currency(mut self, currency: &str) -> Self {
        self.currency = Some(currency.to_lowercase());
        self
    }

    /// Set the maximum number of packages.
    #[must_use]
    pub fn max_packages(mut self, max: u64) -> Self {
        self.limits.max_packages = Some(max);
        self
    }

    /// Set the maximum bookings per calendar month.
    #[must_use]
    pub fn max_bookings_per_month(mut self, max: u64) -> Self {
        self.limits.max_bookings_per_month = Some(max);
        self
    }

    /// Set the maximum photos per package.
    #[must_use]
    pub fn max_photos_per_package(mut self, max: u64) -> Self {
        self.limits.max_photos_per_package = Some(max);
        self
    }

    /// Set the full limits configuration.
    #[must_use]
    pub fn limits(mut self, limits: PlanLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Grant a single feature.
    #[must_use]
    pub fn feature(mut self, feature: Feature) -> Self {
        self.features.insert(feature);
        self
    }

    /// Grant several features.
    #[must_use]
    pub fn features<I>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = Feature>,
    {
        self.features.extend(features);
        self
    }

    /// Grant a flag this crate does not know about.
    #[must_use]
    pub fn custom_feature(mut self, key: &str) -> Self {
        self.custom_features.insert(key.to_string());
        self
    }

    /// Finish defining this plan and return to the parent builder.
    #[must_use]
    pub fn done(self) -> PlansBuilder {
        let config = PlanConfig {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            price_cents: self.price_cents,
            currency: self.currency.unwrap_or_else(|| "sar".to_string()),
            limits: self.limits,
            features: self.features,
            custom_features: self.custom_features,
        };
        self.parent.add_plan(config)
    }
}
