use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::comparator::ReleaseIdentity;
use crate::error::{StoreError, UpdateError};
use crate::metrics::UpdateMetrics;
use crate::schema::{ReleaseList, Vendor};
use crate::store::ReleaseStore;
use crate::vendors::ClientMap;

use super::consistency::{self, AlertKind, ConsistencyAlert};

/// Outcome of one reconciliation of one vendor.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub vendor: Vendor,

    /// Releases that were not in the store before this update
    pub added: ReleaseList,

    /// Number of releases stored for the vendor after the update
    pub total_after: usize,

    pub alerts: Vec<ConsistencyAlert>,

    /// True when nothing could be fetched (fetch error or no client) and
    /// an empty list was merged instead
    pub fetch_failed: bool,
}

/// Serializes fetch → merge → diff for every vendor.
///
/// One instance per process, shared via `Arc` with every call site (the
/// scheduler and any manual trigger). It owns the only update lock, so at
/// most one `update`, for any vendor, runs at a time.
///
/// GUARANTEES:
/// - Fetch failures never propagate, they degrade to an empty fetch
/// - Alerts are logged, never acted upon
/// - No retries; the next scheduled run is the retry
///
pub struct ReleaseUpdater {
    store: Arc<dyn ReleaseStore>,
    clients: ClientMap,
    lock: Mutex<HashMap<Vendor, BTreeSet<ReleaseIdentity>>>,
    metrics: UpdateMetrics,
}

impl ReleaseUpdater {
    pub fn new(store: Arc<dyn ReleaseStore>, clients: ClientMap) -> Self {
        Self {
            store,
            clients,
            lock: Mutex::new(HashMap::new()),
            metrics: UpdateMetrics::default(),
        }
    }

    /// Vendors with a client, in stable order.
    pub fn vendors(&self) -> impl Iterator<Item = Vendor> + '_ {
        self.clients.keys().copied()
    }

    pub fn metrics(&self) -> &UpdateMetrics {
        &self.metrics
    }

    /// Updates one vendor and returns the releases that were new.
    pub async fn update(&self, vendor: Vendor) -> Result<ReleaseList, UpdateError> {
        Ok(self.reconcile(vendor).await?.added)
    }

    /// Updates one vendor and returns the full outcome.
    pub async fn reconcile(&self, vendor: Vendor) -> Result<UpdateReport, UpdateError> {
        let mut last_served = self.lock.lock().await;
        let store_err = |source: StoreError| UpdateError::Store { vendor, source };

        let before = self.store.snapshot(vendor).await.map_err(store_err)?;

        let fetched = self.fetch(vendor).await;
        let fetch_failed = fetched.is_none();

        let added = self
            .store
            .merge(vendor, fetched.clone().unwrap_or_default())
            .await
            .map_err(store_err)?;

        let after = self.store.snapshot(vendor).await.map_err(store_err)?;

        info!(
            "Updated {}, found {} releases, {} updated",
            vendor,
            after.len(),
            added.len()
        );
        for release in added.iter() {
            info!("New release added {} {}", vendor, release.release_name);
        }

        let alerts = consistency::check(
            vendor,
            &before,
            &after,
            fetched.as_ref(),
            last_served.get(&vendor),
        );
        if let Some(list) = &fetched {
            last_served.insert(vendor, consistency::served_identities(list));
        }
        for alert in &alerts {
            alert.log();
        }

        self.record(&added, &alerts);

        Ok(UpdateReport {
            vendor,
            total_after: after.len(),
            added,
            alerts,
            fetch_failed,
        })
    }

    /// Reads the vendor's releases. `None` means no data this cycle.
    ///
    /// Releases carrying another vendor's name are dropped, a vendor may
    /// only publish into its own namespace.
    async fn fetch(&self, vendor: Vendor) -> Option<ReleaseList> {
        let Some(client) = self.clients.get(&vendor) else {
            debug!("No client for {}, nothing to fetch", vendor);
            return None;
        };

        match client.fetch().await {
            Ok(list) => {
                let (own, foreign): (Vec<_>, Vec<_>) =
                    list.into_iter().partition(|r| r.vendor == vendor);
                for release in &foreign {
                    warn!(
                        "{} published {} under vendor {}, ignored",
                        vendor, release.release_name, release.vendor
                    );
                }
                Some(ReleaseList::new(own))
            }
            Err(e) => {
                UpdateMetrics::incr(&self.metrics.fetch_failures);
                warn!("Failed to fetch releases for {}: {}", vendor, e);
                None
            }
        }
    }

    fn record(&self, added: &ReleaseList, alerts: &[ConsistencyAlert]) {
        let m = &self.metrics;
        UpdateMetrics::incr(&m.vendor_updates);
        UpdateMetrics::add(&m.releases_added, added.len());

        let disappeared = alerts
            .iter()
            .filter(|a| a.kind == AlertKind::Disappeared)
            .count();
        UpdateMetrics::add(&m.releases_disappeared, disappeared);
        UpdateMetrics::add(&m.releases_withdrawn, alerts.len() - disappeared);
    }
}
