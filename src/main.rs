// ------------------------------------------------------------
// External dependencies
// ------------------------------------------------------------

use rustls::crypto::{CryptoProvider, ring};

use marketplace_updater::config::Config;
use marketplace_updater::store::{MemoryStore, RedisStore, ReleaseStore};
use marketplace_updater::updater::{ReleaseUpdater, schedule_updates};
use marketplace_updater::vendors::{ClientBuildPolicy, VendorRegistry};

use anyhow::{Context, anyhow};
use log::{info, warn};
use std::fs;
use std::sync::Arc;

/// Environment variable pointing at the configuration file.
const CONFIG_PATH_ENV: &str = "MARKETPLACE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.json";

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Responsibilities:
// - Initialize logging and the TLS backend
// - Load configuration
// - Connect the release store
// - Build one marketplace client per vendor
// - Schedule updates and keep the process alive
//
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // --------------------------------------------------------
    // rustls >= 0.23 requires an explicit CryptoProvider
    // installation, once, before any client is built.
    // --------------------------------------------------------
    CryptoProvider::install_default(ring::default_provider())
        .map_err(|_| anyhow!("failed to install rustls CryptoProvider"))?;

    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path)?;

    // --------------------------------------------------------
    // Release store
    // --------------------------------------------------------
    let store: Arc<dyn ReleaseStore> = match config.store.redis_url.as_deref() {
        Some(url) => Arc::new(
            RedisStore::connect(url)
                .await
                .context("could not connect to redis release store")?,
        ),
        None => {
            warn!("No redis_url configured, releases are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    // --------------------------------------------------------
    // Vendor clients
    //
    // NOTE:
    // Under the default policy a single vendor with a broken
    // configuration aborts startup.
    // --------------------------------------------------------
    let registry = VendorRegistry::from_config(config.enabled_vendors())?;
    let policy = ClientBuildPolicy::from_skip_flag(config.skip_unbuildable_vendors);
    let clients = registry.build_marketplace_clients(&config.http, policy)?;

    if clients.is_empty() {
        warn!("No vendor clients available, updates will be no-ops");
    }

    let updater = Arc::new(ReleaseUpdater::new(store, clients));
    let schedule = schedule_updates(updater, config.update_period());

    // --------------------------------------------------------
    // The schedule is permanent; only process shutdown ends it.
    // --------------------------------------------------------
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, stopping update schedule");
    schedule.stop();

    Ok(())
}

// ------------------------------------------------------------
// Configuration loader
// ------------------------------------------------------------
//
// Reads the JSON configuration file and applies environment
// overrides (`UPDATE_PERIOD_IN_MIN`).
//
fn load_config(path: &str) -> anyhow::Result<Config> {
    let data = fs::read_to_string(path).with_context(|| format!("could not read {path}"))?;
    let mut cfg = Config::from_json(&data)?;
    cfg.apply_env_overrides(|key| std::env::var(key).ok())?;

    info!(
        "Loaded {} ({} vendors enabled, update every {} min)",
        path,
        cfg.enabled_vendors().count(),
        cfg.update_period_in_min
    );

    Ok(cfg)
}
