//! Error taxonomy of the updater.
//!
//! - `FetchError`: vendor-scoped, degraded to an empty fetch by the updater
//! - `StoreError`: surfaces as `UpdateError` and is caught per vendor by the
//!   scheduler
//! - `ClientBuildError` / `StartupError`: raised while assembling the
//!   process, fatal unless the registry is told to skip bad vendors
//!
//! Consistency alerts are not errors, see `updater::consistency`.

use crate::schema::Vendor;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("release codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("store failure while updating {vendor}: {source}")]
    Store {
        vendor: Vendor,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("invalid base url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("access key contains characters not allowed in a header")]
    InvalidKey,

    #[error("http client construction failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("vendor {0} is configured more than once")]
    DuplicateVendor(Vendor),

    #[error("could not build client for {vendor}: {source}")]
    ClientBuild {
        vendor: Vendor,
        #[source]
        source: ClientBuildError,
    },
}
