//! Consistency check between two views of a vendor's releases.
//!
//! The store never deletes on merge, so a release that was present before
//! an update and is missing afterwards was lost through some other path.
//! That is reported as `Disappeared`.
//!
//! A vendor that changes a release in place (new checksum, moved link)
//! does not make the old record disappear: merge keeps it and adds the new
//! identity next to it. Comparing the pre-update snapshot against what the
//! vendor actually served catches that case, reported as `Withdrawn`.
//!
//! `Withdrawn` is reported on the transition only: once the vendor has
//! served a fetch without the release, later fetches without it are quiet.

use std::collections::BTreeSet;
use std::fmt;

use log::{error, warn};

use crate::comparator::{ReleaseIdentity, contains_release, sorted_by_identity};
use crate::schema::{Release, ReleaseList, Vendor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Present before the update, absent from the store afterwards
    Disappeared,

    /// Still stored, but no longer served by the vendor
    Withdrawn,
}

/// Observational signal about one previously known release.
///
/// Alerts never trigger a compensating action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyAlert {
    pub kind: AlertKind,
    pub vendor: Vendor,
    pub release_name: String,
    pub release_link: String,
}

impl ConsistencyAlert {
    fn new(kind: AlertKind, vendor: Vendor, release: &Release) -> Self {
        Self {
            kind,
            vendor,
            release_name: release.release_name.clone(),
            release_link: release.release_link.clone(),
        }
    }

    /// Writes the alert to the log sink.
    pub fn log(&self) {
        match self.kind {
            AlertKind::Disappeared => error!("{}", self),
            AlertKind::Withdrawn => warn!("{}", self),
        }
    }
}

impl fmt::Display for ConsistencyAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AlertKind::Disappeared => write!(
                f,
                "Release disappeared or has mutated, contact {} to find out why {} {}",
                self.vendor, self.release_name, self.release_link
            ),
            AlertKind::Withdrawn => write!(
                f,
                "Release no longer published by {}, removed or re-published under a new identity: {} {}",
                self.vendor, self.release_name, self.release_link
            ),
        }
    }
}

/// Compares the pre-update snapshot with the post-update snapshot and,
/// when the fetch succeeded, with the fetched list.
///
/// Each release of `before` yields at most one alert; `Disappeared` takes
/// precedence over `Withdrawn`. Pass `fetched = None` after a failed fetch
/// so an outage produces no `Withdrawn` alerts.
///
/// `previously_served` holds the identities of the vendor's last
/// successful fetch. When present, only releases in it can be `Withdrawn`;
/// when `None` (first successful fetch) every stored release can.
pub fn check(
    vendor: Vendor,
    before: &ReleaseList,
    after: &ReleaseList,
    fetched: Option<&ReleaseList>,
    previously_served: Option<&BTreeSet<ReleaseIdentity>>,
) -> Vec<ConsistencyAlert> {
    let after_sorted = sorted_by_identity(after.iter());
    let fetched_sorted = fetched.map(|list| sorted_by_identity(list.iter()));

    before
        .iter()
        .filter_map(|release| {
            if !contains_release(&after_sorted, release) {
                return Some(ConsistencyAlert::new(AlertKind::Disappeared, vendor, release));
            }
            let served = fetched_sorted.as_ref()?;
            if contains_release(served, release) {
                return None;
            }
            let was_served =
                previously_served.is_none_or(|ids| ids.contains(&ReleaseIdentity::of(release)));
            was_served.then(|| ConsistencyAlert::new(AlertKind::Withdrawn, vendor, release))
        })
        .collect()
}

/// Identities of a fetched list, kept as the `previously_served` baseline
/// of the next check.
pub fn served_identities(fetched: &ReleaseList) -> BTreeSet<ReleaseIdentity> {
    fetched.iter().map(ReleaseIdentity::of).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn release(name: &str) -> Release {
        Release {
            release_name: name.to_string(),
            release_link: format!("https://example.com/{name}"),
            timestamp: Utc.with_ymd_and_hms(2024, 4, 16, 12, 0, 0).unwrap(),
            vendor: Vendor::Alibaba,
            openjdk_version_data: None,
            binaries: Vec::new(),
        }
    }

    fn list(names: &[&str]) -> ReleaseList {
        names.iter().map(|n| release(n)).collect::<Vec<_>>().into()
    }

    #[test]
    fn unchanged_views_raise_nothing() {
        let before = list(&["a", "b"]);

        assert!(check(Vendor::Alibaba, &before, &before, Some(&before), None).is_empty());
    }

    #[test]
    fn missing_after_is_disappeared() {
        let alerts = check(
            Vendor::Alibaba,
            &list(&["a", "b"]),
            &list(&["a"]),
            Some(&list(&["a"])),
            None,
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Disappeared);
        assert_eq!(alerts[0].release_name, "b");
        assert_eq!(alerts[0].release_link, "https://example.com/b");
        assert!(alerts[0].to_string().contains("contact alibaba"));
    }

    #[test]
    fn missing_from_fetch_is_withdrawn() {
        let alerts = check(
            Vendor::Alibaba,
            &list(&["a", "b"]),
            &list(&["a", "b", "c"]),
            Some(&list(&["a", "c"])),
            None,
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Withdrawn);
        assert_eq!(alerts[0].release_name, "b");
    }

    #[test]
    fn failed_fetch_skips_withdrawn_check() {
        let before = list(&["a", "b"]);

        assert!(check(Vendor::Alibaba, &before, &before, None, None).is_empty());
    }

    #[test]
    fn one_alert_per_release() {
        let alerts = check(
            Vendor::Alibaba,
            &list(&["a", "b"]),
            &list(&[]),
            Some(&list(&[])),
            None,
        );

        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.kind == AlertKind::Disappeared));
    }

    #[test]
    fn withdrawn_only_on_transition() {
        let before = list(&["a", "b", "c"]);
        let fetched = list(&["a", "c"]);

        // b was already missing from the previous fetch
        let quiet = served_identities(&fetched);
        assert!(check(Vendor::Alibaba, &before, &before, Some(&fetched), Some(&quiet)).is_empty());

        // b was served last time and is gone now
        let loud = served_identities(&before);
        let alerts = check(Vendor::Alibaba, &before, &before, Some(&fetched), Some(&loud));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Withdrawn);
        assert_eq!(alerts[0].release_name, "b");
    }

    #[test]
    fn disappeared_ignores_served_baseline() {
        let before = list(&["a", "b"]);
        let after = list(&["a"]);
        let served = served_identities(&list(&["a"]));

        let alerts = check(Vendor::Alibaba, &before, &after, Some(&after), Some(&served));

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Disappeared);
    }
}
