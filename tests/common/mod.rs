//! Shared test doubles: scripted fetchers and instrumented stores.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};

use marketplace_updater::comparator::{contains_release, sorted_by_identity};
use marketplace_updater::error::{FetchError, StoreError};
use marketplace_updater::schema::{Release, ReleaseList, Vendor};
use marketplace_updater::store::{MemoryStore, ReleaseStore};
use marketplace_updater::updater::ReleaseUpdater;
use marketplace_updater::vendors::ClientMap;
use marketplace_updater::vendors::fetcher::ReleaseFetcher;

pub fn release(vendor: Vendor, name: &str) -> Release {
    Release {
        release_name: name.to_string(),
        release_link: format!("https://{vendor}.example.com/releases/{name}"),
        timestamp: Utc.with_ymd_and_hms(2024, 10, 15, 9, 30, 0).unwrap(),
        vendor,
        openjdk_version_data: None,
        binaries: Vec::new(),
    }
}

pub fn names(list: &ReleaseList) -> Vec<String> {
    let mut names: Vec<String> = list.iter().map(|r| r.release_name.clone()).collect();
    names.sort();
    names
}

pub fn updater_with(store: Arc<dyn ReleaseStore>, fetchers: Vec<Arc<dyn ReleaseFetcher>>) -> ReleaseUpdater {
    let clients: ClientMap = fetchers.into_iter().map(|f| (f.vendor(), f)).collect();
    ReleaseUpdater::new(store, clients)
}

// ---------------------------------------------------------------------------
// Fetchers
// ---------------------------------------------------------------------------

/// Serves whatever list was last set, counting calls.
pub struct StaticFetcher {
    vendor: Vendor,
    releases: Mutex<Vec<Release>>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(vendor: Vendor, releases: Vec<Release>) -> Arc<Self> {
        Self::with_delay(vendor, releases, Duration::ZERO)
    }

    pub fn with_delay(vendor: Vendor, releases: Vec<Release>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            vendor,
            releases: Mutex::new(releases),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, releases: Vec<Release>) {
        *self.releases.lock().unwrap() = releases;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ReleaseFetcher for StaticFetcher {
    fn vendor(&self) -> Vendor {
        self.vendor
    }

    async fn fetch(&self) -> Result<ReleaseList, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(ReleaseList::new(self.releases.lock().unwrap().clone()))
    }
}

/// Always fails like an unreachable vendor.
pub struct FailingFetcher {
    vendor: Vendor,
    pub calls: AtomicUsize,
}

impl FailingFetcher {
    pub fn new(vendor: Vendor) -> Arc<Self> {
        Arc::new(Self {
            vendor,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ReleaseFetcher for FailingFetcher {
    fn vendor(&self) -> Vendor {
        self.vendor
    }

    async fn fetch(&self) -> Result<ReleaseList, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FetchError::Status {
            url: format!("https://{}.example.com/index.json", self.vendor),
            status: 503,
        })
    }
}

/// Panics on every fetch.
pub struct PanickingFetcher {
    vendor: Vendor,
    pub calls: AtomicUsize,
}

impl PanickingFetcher {
    pub fn new(vendor: Vendor) -> Arc<Self> {
        Arc::new(Self {
            vendor,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ReleaseFetcher for PanickingFetcher {
    fn vendor(&self) -> Vendor {
        self.vendor
    }

    async fn fetch(&self) -> Result<ReleaseList, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("vendor {} returned garbage", self.vendor);
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Snapshot,
    Merge,
}

/// MemoryStore that records every operation and slows merges down so
/// unsynchronized callers would interleave.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    pub events: Mutex<Vec<(Vendor, StoreOp)>>,
    merges_in_flight: AtomicUsize,
    pub overlapping_merges: AtomicUsize,
}

impl RecordingStore {
    pub fn events(&self) -> Vec<(Vendor, StoreOp)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ReleaseStore for RecordingStore {
    async fn snapshot(&self, vendor: Vendor) -> Result<ReleaseList, StoreError> {
        self.events.lock().unwrap().push((vendor, StoreOp::Snapshot));
        tokio::task::yield_now().await;
        self.inner.snapshot(vendor).await
    }

    async fn merge(&self, vendor: Vendor, releases: ReleaseList) -> Result<ReleaseList, StoreError> {
        self.events.lock().unwrap().push((vendor, StoreOp::Merge));
        if self.merges_in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapping_merges.fetch_add(1, Ordering::SeqCst);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = self.inner.merge(vendor, releases).await;
        self.merges_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// MemoryStore that loses the given releases during the next merge, as
/// if some other path had deleted them.
pub struct LossyStore {
    inner: MemoryStore,
    pending_loss: Mutex<Vec<Release>>,
    lost: Mutex<Vec<Release>>,
}

impl LossyStore {
    pub fn new(vendor: Vendor, stored: Vec<Release>) -> Self {
        Self {
            inner: MemoryStore::with_releases(vendor, stored),
            pending_loss: Mutex::new(Vec::new()),
            lost: Mutex::new(Vec::new()),
        }
    }

    pub fn lose_on_next_merge(&self, releases: Vec<Release>) {
        self.pending_loss.lock().unwrap().extend(releases);
    }
}

#[async_trait::async_trait]
impl ReleaseStore for LossyStore {
    async fn snapshot(&self, vendor: Vendor) -> Result<ReleaseList, StoreError> {
        let all = self.inner.snapshot(vendor).await?;
        let lost = self.lost.lock().unwrap().clone();
        let lost_sorted = sorted_by_identity(lost.iter());

        let visible = all
            .into_iter()
            .filter(|r| !contains_release(&lost_sorted, r))
            .collect::<Vec<_>>();
        Ok(ReleaseList::new(visible))
    }

    async fn merge(&self, vendor: Vendor, releases: ReleaseList) -> Result<ReleaseList, StoreError> {
        let added = self.inner.merge(vendor, releases).await?;
        let pending = std::mem::take(&mut *self.pending_loss.lock().unwrap());
        self.lost.lock().unwrap().extend(pending);
        Ok(added)
    }
}

/// Store whose snapshot always fails.
pub struct BrokenStore;

#[async_trait::async_trait]
impl ReleaseStore for BrokenStore {
    async fn snapshot(&self, _vendor: Vendor) -> Result<ReleaseList, StoreError> {
        Err(StoreError::Codec(
            serde_json::from_str::<Release>("not json").unwrap_err(),
        ))
    }

    async fn merge(&self, _vendor: Vendor, _releases: ReleaseList) -> Result<ReleaseList, StoreError> {
        Ok(ReleaseList::empty())
    }
}
