use crate::error::FetchError;
use crate::schema::{ReleaseList, Vendor};

/// ReleaseFetcher is the seam between the updater and a vendor
/// repository.
///
/// One instance exists per vendor, built once at startup by the
/// `VendorRegistry` and shared for the life of the process.
///
/// CONTRACT:
/// - `fetch` returns everything the vendor currently publishes
/// - A transport or parse failure fails the whole fetch; partial results
///   are never returned
/// - Timeouts are the implementation's responsibility, the updater
///   waits as long as `fetch` takes
///
/// THREAD SAFETY:
/// - Must be Send + Sync, instances are shared across tasks
///
#[async_trait::async_trait]
pub trait ReleaseFetcher: Send + Sync {
    /// Vendor this fetcher reads from.
    fn vendor(&self) -> Vendor;

    async fn fetch(&self) -> Result<ReleaseList, FetchError>;
}
