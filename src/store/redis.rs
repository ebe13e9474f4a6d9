use std::collections::BTreeMap;

use ::redis::AsyncCommands;
use ::redis::aio::MultiplexedConnection;
use log::info;

use crate::comparator::ReleaseIdentity;
use crate::error::StoreError;
use crate::schema::{Release, ReleaseList, Vendor};

use super::ReleaseStore;

/// Key prefix of the per-vendor release hashes.
pub const KEY_PREFIX: &str = "marketplace:releases";

/// Redis-backed store.
///
/// LAYOUT:
/// - One hash per vendor: `marketplace:releases:<vendor>`
/// - Field: serialized `ReleaseIdentity`
/// - Value: release JSON
///
/// A merge is one `MULTI`/`EXEC` pipeline with an `HSET` per release.
/// `HSET` replies 1 for a new field and 0 for an overwrite, which gives
/// the upsert and the "is new" answer together. The batch is encoded
/// before anything is sent, so a merge writes all releases or none.
///
/// The connection is multiplexed and cheap to clone, each call works on
/// its own clone.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = ::redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Connected to redis release store");
        Ok(Self { conn })
    }
}

fn hash_key(vendor: Vendor) -> String {
    format!("{KEY_PREFIX}:{vendor}")
}

#[async_trait::async_trait]
impl ReleaseStore for RedisStore {
    async fn snapshot(&self, vendor: Vendor) -> Result<ReleaseList, StoreError> {
        let mut conn = self.conn.clone();
        let values: Vec<String> = conn.hvals(hash_key(vendor)).await?;

        let mut releases = values
            .iter()
            .map(|raw| serde_json::from_str::<Release>(raw))
            .collect::<Result<Vec<_>, _>>()?;
        releases.sort_by_cached_key(ReleaseIdentity::of);

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

        let mut encoded = Vec::with_capacity(batch.len());
        for (identity, release) in batch {
            let field = identity.to_key()?;
            let value = serde_json::to_string(&release)?;
            encoded.push((field, value, release));
        }

        let key = hash_key(vendor);
        let mut pipe = ::redis::pipe();
        pipe.atomic();
        for (field, value, _) in &encoded {
            pipe.hset(&key, field, value);
        }

        let mut conn = self.conn.clone();
        let created: Vec<i64> = pipe.query_async(&mut conn).await?;

        let added = encoded
            .into_iter()
            .zip(created)
            .filter(|(_, reply)| *reply == 1)
            .map(|((_, _, release), _)| release)
            .collect();

        Ok(ReleaseList::new(added))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_key_uses_vendor_name() {
        assert_eq!(hash_key(Vendor::Redhat), "marketplace:releases:redhat");
    }
}
