use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Vendor identifier.
///
/// Every marketplace participant has exactly one variant here. Which of
/// them are actually polled is decided by configuration.
///
/// CONTRACT:
/// - The serialized (lowercase) name must match `vendor` in config.json
/// - The name is also used in store keys, so it must remain stable
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Adoptium,
    Alibaba,
    Azul,
    Huawei,
    Ibm,
    Microsoft,
    Redhat,
}

impl Vendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Adoptium => "adoptium",
            Vendor::Alibaba => "alibaba",
            Vendor::Azul => "azul",
            Vendor::Huawei => "huawei",
            Vendor::Ibm => "ibm",
            Vendor::Microsoft => "microsoft",
            Vendor::Redhat => "redhat",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ------------------------------------------------------------
// Release
// ------------------------------------------------------------
//
// One published release as served by a vendor repository.
//
// Two releases coming from different fetches are never compared with
// `==`. Identity is decided by `comparator::compare_releases`, which
// tolerates cosmetic re-serialization (see `ReleaseIdentity`).
//
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// Display name (e.g. "jdk-17.0.8+7")
    pub release_name: String,

    /// Link to the release page at the vendor
    pub release_link: String,

    /// Publication time
    pub timestamp: DateTime<Utc>,

    /// Publishing vendor
    pub vendor: Vendor,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openjdk_version_data: Option<OpenjdkVersionData>,

    #[serde(default)]
    pub binaries: Vec<Binary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenjdkVersionData {
    pub major: u32,
    pub openjdk_version: String,
}

/// A single downloadable artifact of a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binary {
    pub os: String,
    pub architecture: String,
    pub image_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<Package>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub link: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256sum: Option<String>,
}

// ------------------------------------------------------------
// Release list
// ------------------------------------------------------------
//
// Unordered batch exchanged between fetcher, store and updater.
// The container does not enforce uniqueness; that is the store's job.
//
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseList {
    #[serde(default)]
    pub releases: Vec<Release>,
}

impl ReleaseList {
    pub fn new(releases: Vec<Release>) -> Self {
        Self { releases }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Release> {
        self.releases.iter()
    }
}

impl From<Vec<Release>> for ReleaseList {
    fn from(releases: Vec<Release>) -> Self {
        Self { releases }
    }
}

impl IntoIterator for ReleaseList {
    type Item = Release;
    type IntoIter = std::vec::IntoIter<Release>;

    fn into_iter(self) -> Self::IntoIter {
        self.releases.into_iter()
    }
}
