//! Actions a company can ask permission for.

use std::fmt;
use std::str::FromStr;

use super::plans::{Feature, Quota};

/// An action to check against a tenant's subscription.
///
/// Parsing never fails: unknown names become [`Action::Unrecognized`], which
/// is allowed once the tenant, status and plan checks pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreatePackage,
    CreateBooking,
    /// Add photos to a package. Without a package id the current count is zero.
    UploadPhotos { package_id: Option<String> },
    AccessAnalytics,
    PrioritySupport,
    FeaturedListings,
    Unrecognized(String),
}

/// What an action is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Quota(Quota),
    Feature(Feature),
    None,
}

impl Action {
    /// Photo upload scoped to a package.
    #[must_use]
    pub fn upload_photos(package_id: impl Into<String>) -> Self {
        Self::UploadPhotos {
            package_id: Some(package_id.into()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreatePackage => "create_package",
            Self::CreateBooking => "create_booking",
            Self::UploadPhotos { .. } => "upload_photos",
            Self::AccessAnalytics => "access_analytics",
            Self::PrioritySupport => "priority_support",
            Self::FeaturedListings => "featured_listings",
            Self::Unrecognized(name) => name,
        }
    }

    #[must_use]
    pub fn requirement(&self) -> Requirement {
        match self {
            Self::CreatePackage => Requirement::Quota(Quota::Packages),
            Self::CreateBooking => Requirement::Quota(Quota::MonthlyBookings),
            Self::UploadPhotos { .. } => Requirement::Quota(Quota::PhotosPerPackage),
            Self::AccessAnalytics => Requirement::Feature(Feature::AnalyticsAccess),
            Self::PrioritySupport => Requirement::Feature(Feature::PrioritySupport),
            Self::FeaturedListings => Requirement::Feature(Feature::FeaturedListings),
            Self::Unrecognized(_) => Requirement::None,
        }
    }

    /// Package whose photos are counted, if any.
    #[must_use]
    pub fn package_id(&self) -> Option<&str> {
        match self {
            Self::UploadPhotos { package_id } => package_id.as_deref(),
            _ => None,
        }
    }
}

impl FromStr for Action {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "create_package" => Self::CreatePackage,
            "create_booking" => Self::CreateBooking,
            "upload_photos" => Self::UploadPhotos { package_id: None },
            "access_analytics" => Self::AccessAnalytics,
            "priority_support" => Self::PrioritySupport,
            "featured_listings" => Self::FeaturedListings,
            other => Self::Unrecognized(other.to_string()),
        })
    }
}

impl From<&str> for Action {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(action) => action,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_actions() {
        assert_eq!(Action::from("create_package"), Action::CreatePackage);
        assert_eq!(Action::from("create_booking"), Action::CreateBooking);
        assert_eq!(Action::from("upload_photos"), Action::UploadPhotos { package_id: None });
        assert_eq!(Action::from("access_analytics"), Action::AccessAnalytics);
        assert_eq!(Action::from("priority_support"), Action::PrioritySupport);
        assert_eq!(Action::from("featured_listings"), Action::FeaturedListings);
    }

    #[test]
    fn test_parse_unknown_action() {
        let action = Action::from("do_something_new");
        assert_eq!(action, Action::Unrecognized("do_something_new".to_string()));
        assert_eq!(action.to_string(), "do_something_new");
        assert_eq!(action.requirement(), Requirement::None);
    }

    #[test]
    fn test_requirements() {
        assert_eq!(Action::CreatePackage.requirement(), Requirement::Quota(Quota::Packages));
        assert_eq!(
            Action::upload_photos("pkg_1").requirement(),
            Requirement::Quota(Quota::PhotosPerPackage)
        );
        assert_eq!(
            Action::FeaturedListings.requirement(),
            Requirement::Feature(Feature::FeaturedListings)
        );
    }

    #[test]
    fn test_package_id() {
        assert_eq!(Action::upload_photos("pkg_9").package_id(), Some("pkg_9"));
        assert_eq!(Action::CreatePackage.package_id(), None);
        assert_eq!(Action::upload_photos("pkg_9").to_string(), "upload_photos");
    }
}
