//! Usage snapshots.
//!
//! A snapshot is computed from live counts on every check and never stored.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::plans::Quota;
use super::storage::UsageStore;
use crate::error::Result;

/// Live usage counts for a tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    /// Packages ever created by the tenant, including inactive ones.
    pub packages: u64,
    /// Bookings created since the first day of the current month.
    pub bookings_this_month: u64,
    /// Photos on the package being checked; zero when no package is in scope.
    pub max_photos_in_package: u64,
}

impl UsageSnapshot {
    /// The count compared against a quota.
    #[must_use]
    pub fn get(&self, quota: Quota) -> u64 {
        match quota {
            Quota::Packages => self.packages,
            Quota::MonthlyBookings => self.bookings_this_month,
            Quota::PhotosPerPackage => self.max_photos_in_package,
        }
    }
}

/// Granularity used to step over a DST gap at local midnight.
const GAP_STEP_MINUTES: i64 = 15;

/// Midnight on the first day of `now`'s month, in `now`'s timezone.
///
/// If local midnight falls in a DST gap, the first local time that exists
/// after it is used instead.
pub fn start_of_month<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let tz = now.timezone();
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|midnight| {
            (0..24 * 60 / GAP_STEP_MINUTES).find_map(|step| {
                let local = midnight + Duration::minutes(step * GAP_STEP_MINUTES);
                tz.from_local_datetime(&local).earliest()
            })
        })
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

/// Run the three usage counts concurrently.
///
/// The reads are independent, so none waits on another. The first failure is
/// returned as-is.
pub(crate) async fn collect_usage<U: UsageStore + ?Sized>(
    store: &U,
    tenant_id: &str,
    month_start: DateTime<Utc>,
    package_id: Option<&str>,
) -> Result<UsageSnapshot> {
    let photos = async {
        match package_id {
            Some(package_id) => store.count_package_photos(tenant_id, package_id).await,
            None => Ok(0),
        }
    };

    let (packages, bookings_this_month, max_photos_in_package) = futures::try_join!(
        store.count_packages(tenant_id),
        store.count_bookings_since(tenant_id, month_start),
        photos,
    )?;

    Ok(UsageSnapshot {
        packages,
        bookings_this_month,
        max_photos_in_package,
    })
}
