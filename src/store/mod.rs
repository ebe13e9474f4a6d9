//! Release store
//!
//! The store is the only shared mutable resource of the updater. All
//! writes go through `merge`, all reads used by the consistency check go
//! through `snapshot`.
//!
//! Backends:
//! - `memory`: process-local, used when no Redis URL is configured
//! - `redis`:  one hash per vendor

pub mod memory;
pub mod redis;

use crate::error::StoreError;
use crate::schema::{ReleaseList, Vendor};

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Storage seam used by the updater.
///
/// CONTRACT:
/// - `snapshot` reflects every `merge` that completed before the call
/// - `merge` is an upsert keyed by release identity
///   (`comparator::ReleaseIdentity`); it never deletes
/// - `merge` returns exactly the releases whose identity was absent
///   before the call, deduplicated, in identity order
/// - Merging an empty list is a no-op returning an empty list
///
#[async_trait::async_trait]
pub trait ReleaseStore: Send + Sync {
    async fn snapshot(&self, vendor: Vendor) -> Result<ReleaseList, StoreError>;

    async fn merge(&self, vendor: Vendor, releases: ReleaseList) -> Result<ReleaseList, StoreError>;
}
