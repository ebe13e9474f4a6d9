use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use crate::comparator::ReleaseIdentity;
use crate::error::StoreError;
use crate::schema::{Release, ReleaseList, Vendor};

use super::ReleaseStore;

/// In-process store.
///
/// Releases are keyed by identity, so duplicates within one merge and
/// across merges collapse naturally. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    vendors: RwLock<HashMap<Vendor, BTreeMap<ReleaseIdentity, Release>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `releases` for `vendor`.
    pub fn with_releases(vendor: Vendor, releases: impl IntoIterator<Item = Release>) -> Self {
        let entries = releases
            .into_iter()
            .map(|r| (ReleaseIdentity::of(&r), r))
            .collect();

        Self {
            vendors: RwLock::new(HashMap::from([(vendor, entries)])),
        }
    }
}

#[async_trait::async_trait]
impl ReleaseStore for MemoryStore {
    async fn snapshot(&self, vendor: Vendor) -> Result<ReleaseList, StoreError> {
        let vendors = self.vendors.read().await;
        let releases = vendors
            .get(&vendor)
            .map(|stored| stored.values().cloned().collect())
            .unwrap_or_default();

        Ok(ReleaseList::new(releases))
    }

    async fn merge(&self, vendor: Vendor, releases: ReleaseList) -> Result<ReleaseList, StoreError> {
        if releases.is_empty() {
            return Ok(ReleaseList::empty());
        }

        // Later duplicates win, matching a sequential upsert.
        let batch: BTreeMap<ReleaseIdentity, Release> = releases
            .into_iter()
            .map(|r| (ReleaseIdentity::of(&r), r))
            .collect();

        let mut vendors = self.vendors.write().await;
        let stored = vendors.entry(vendor).or_default();

        let mut added = Vec::new();
        for (identity, release) in batch {
            if stored.insert(identity, release.clone()).is_none() {
                added.push(release);
            }
        }

        Ok(ReleaseList::new(added))
    }
}
