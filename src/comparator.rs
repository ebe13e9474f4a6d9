//! Release identity and ordering.
//!
//! `compare_releases` is the single source of truth for deciding whether
//! two releases are "the same real-world release". Stores use it for
//! deduplication, the updater uses it for the disappearance check.
//!
//! The ordering is derived from a normalized projection (`ReleaseIdentity`),
//! so it is total, deterministic and stable across calls by construction.

use std::cmp::Ordering;

use serde::Serialize;

use crate::schema::{Binary, Release, Vendor};
use crate::util::{normalize_link, normalize_name};

/// Normalized identity of a release.
///
/// Fields that vendors are known to re-serialize cosmetically (link case,
/// trailing slashes, binary ordering, sub-millisecond timestamps) are
/// normalized here. Everything else is part of the identity, so a changed
/// checksum or a moved package yields a different release.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ReleaseIdentity {
    vendor: Vendor,
    release_name: String,
    release_link: String,
    timestamp_ms: i64,
    openjdk_version: Option<String>,
    binaries: Vec<BinaryIdentity>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
struct BinaryIdentity {
    os: String,
    architecture: String,
    image_type: String,
    package_link: Option<String>,
    sha256sum: Option<String>,
}

impl ReleaseIdentity {
    pub fn of(release: &Release) -> Self {
        let mut binaries: Vec<BinaryIdentity> =
            release.binaries.iter().map(BinaryIdentity::of).collect();
        binaries.sort();

        Self {
            vendor: release.vendor,
            release_name: normalize_name(&release.release_name),
            release_link: normalize_link(&release.release_link),
            timestamp_ms: release.timestamp.timestamp_millis(),
            openjdk_version: release
                .openjdk_version_data
                .as_ref()
                .map(|v| v.openjdk_version.trim().to_string()),
            binaries,
        }
    }

    /// Stable string form, used as a key by external stores.
    pub fn to_key(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl BinaryIdentity {
    fn of(binary: &Binary) -> Self {
        Self {
            os: binary.os.trim().to_ascii_lowercase(),
            architecture: binary.architecture.trim().to_ascii_lowercase(),
            image_type: binary.image_type.trim().to_ascii_lowercase(),
            package_link: binary.package.as_ref().map(|p| normalize_link(&p.link)),
            sha256sum: binary
                .package
                .as_ref()
                .and_then(|p| p.sha256sum.as_ref())
                .map(|s| s.trim().to_ascii_lowercase()),
        }
    }
}

/// Total order over releases. `Ordering::Equal` means same release.
pub fn compare_releases(a: &Release, b: &Release) -> Ordering {
    ReleaseIdentity::of(a).cmp(&ReleaseIdentity::of(b))
}

/// Borrowed view of `releases` sorted by `compare_releases`, ready for
/// `contains_release` lookups.
pub fn sorted_by_identity<'a, I>(releases: I) -> Vec<&'a Release>
where
    I: IntoIterator<Item = &'a Release>,
{
    let mut sorted: Vec<&Release> = releases.into_iter().collect();
    sorted.sort_by(|a, b| compare_releases(a, b));
    sorted
}

/// Whether `sorted` (see `sorted_by_identity`) holds a release comparing
/// equal to `release`.
pub fn contains_release(sorted: &[&Release], release: &Release) -> bool {
    sorted
        .binary_search_by(|probe| compare_releases(probe, release))
        .is_ok()
}
