//! Vendor registry and client factory
//!
//! This module provides:
//! - The connection parameters of every configured vendor
//! - Construction of one `ReleaseFetcher` per vendor
//!
//! The rest of the application interacts with vendors exclusively through
//! the `ReleaseFetcher` trait.

pub mod fetcher;
pub mod marketplace;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::{error, info};

use crate::config::{HttpConfig, VendorConfig};
use crate::error::{ClientBuildError, StartupError};
use crate::schema::Vendor;

use fetcher::ReleaseFetcher;
use marketplace::MarketplaceClient;

/// Vendor → fetcher bindings, fixed for the process lifetime.
pub type ClientMap = BTreeMap<Vendor, Arc<dyn ReleaseFetcher>>;

/// Connection parameters of one vendor repository.
#[derive(Clone)]
pub struct ConnectionInfo {
    pub url: String,
    pub key: Option<String>,
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("url", &self.url)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// What to do when a vendor's client cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientBuildPolicy {
    /// Any failure aborts startup
    #[default]
    Abort,

    /// The failing vendor is logged and left out
    SkipAndLog,
}

impl ClientBuildPolicy {
    pub fn from_skip_flag(skip: bool) -> Self {
        if skip { Self::SkipAndLog } else { Self::Abort }
    }
}

/// Connection parameters of every enabled vendor.
///
/// Built once at startup. Vendors are iterated in `Vendor` order, which
/// keeps update runs and their logs in a stable sequence.
#[derive(Debug, Clone, Default)]
pub struct VendorRegistry {
    vendors: BTreeMap<Vendor, ConnectionInfo>,
}

impl VendorRegistry {
    /// Builds the registry from the enabled vendor entries of the config.
    pub fn from_config<'a, I>(entries: I) -> Result<Self, StartupError>
    where
        I: IntoIterator<Item = &'a VendorConfig>,
    {
        let mut vendors = BTreeMap::new();

        for entry in entries.into_iter().filter(|e| e.enabled) {
            let info = ConnectionInfo {
                url: entry.url.clone(),
                key: entry.key.clone(),
            };
            if vendors.insert(entry.vendor, info).is_some() {
                return Err(StartupError::DuplicateVendor(entry.vendor));
            }
        }

        Ok(Self { vendors })
    }

    pub fn vendor_info(&self) -> &BTreeMap<Vendor, ConnectionInfo> {
        &self.vendors
    }

    /// Derives the vendor → fetcher map by calling `build` once per vendor.
    ///
    /// Under `ClientBuildPolicy::Abort` the first failure is returned and
    /// no client map is produced.
    pub fn build_client_map<F>(
        &self,
        policy: ClientBuildPolicy,
        build: F,
    ) -> Result<ClientMap, StartupError>
    where
        F: Fn(Vendor, &ConnectionInfo) -> Result<Arc<dyn ReleaseFetcher>, ClientBuildError>,
    {
        let mut clients = ClientMap::new();

        for (&vendor, info) in &self.vendors {
            match build(vendor, info) {
                Ok(client) => {
                    info!("Client ready for {} at {}", vendor, info.url);
                    clients.insert(vendor, client);
                }
                Err(source) => match policy {
                    ClientBuildPolicy::Abort => {
                        return Err(StartupError::ClientBuild { vendor, source });
                    }
                    ClientBuildPolicy::SkipAndLog => {
                        error!("Skipping {}: could not build client: {}", vendor, source);
                    }
                },
            }
        }

        Ok(clients)
    }

    /// `build_client_map` with the HTTP marketplace client.
    pub fn build_marketplace_clients(
        &self,
        http: &HttpConfig,
        policy: ClientBuildPolicy,
    ) -> Result<ClientMap, StartupError> {
        self.build_client_map(policy, |vendor, info| {
            let client = MarketplaceClient::build(vendor, info, http)?;
            Ok(Arc::new(client) as Arc<dyn ReleaseFetcher>)
        })
    }
}
