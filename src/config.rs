use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

use crate::schema::Vendor;

/// Default delay between two update runs.
pub const DEFAULT_UPDATE_PERIOD_IN_MIN: u64 = 60;

/// Environment variable overriding `update_period_in_min`.
pub const UPDATE_PERIOD_ENV: &str = "UPDATE_PERIOD_IN_MIN";

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// Top-level structure loaded from `config.json`.
//
// It defines:
// - The update period
// - The vendor repositories to poll
// - The store backend
// - HTTP client limits
//
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Delay between the end of one update run and the start of the next
    #[serde(default = "default_update_period")]
    pub update_period_in_min: u64,

    /// Vendor repositories
    pub vendors: Vec<VendorConfig>,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub http: HttpConfig,

    /// When true a vendor whose client cannot be built is logged and
    /// skipped instead of aborting startup
    #[serde(default)]
    pub skip_unbuildable_vendors: bool,
}

// ------------------------------------------------------------
// Vendor configuration
// ------------------------------------------------------------
//
// Connection parameters of one vendor repository.
//
// Notes:
// - `key` is security-sensitive and must never be committed.
// - `url` points at the repository root, `index.json` is resolved below it.
//
#[derive(Debug, Deserialize, Clone)]
pub struct VendorConfig {
    pub vendor: Vendor,

    /// Repository root URL
    pub url: String,

    /// Optional access key, forwarded as a bearer token
    #[serde(default)]
    pub key: Option<String>,

    /// Enables or disables this vendor at runtime
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// ------------------------------------------------------------
// Store configuration
// ------------------------------------------------------------
//
// Without `redis_url` releases are kept in memory and are lost on
// restart.
//
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    pub redis_url: Option<String>,
}

// ------------------------------------------------------------
// HTTP configuration
// ------------------------------------------------------------
//
// The updater imposes no timeout of its own; a hanging fetch holds the
// update lock until these limits fire.
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    /// Total timeout per request in seconds
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Maximum redirects to follow, 0 disables redirects
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            connect_timeout_secs: 10,
            max_redirects: 10,
        }
    }
}

fn default_update_period() -> u64 {
    DEFAULT_UPDATE_PERIOD_IN_MIN
}

fn default_enabled() -> bool {
    true
}

impl Config {
    pub fn from_json(data: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_json::from_str(data).context("invalid configuration json")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies environment overrides. `lookup` is `std::env::var` in
    /// production.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(UPDATE_PERIOD_ENV) {
            self.update_period_in_min = raw
                .trim()
                .parse()
                .with_context(|| format!("{UPDATE_PERIOD_ENV} must be a whole number of minutes, got '{raw}'"))?;
        }
        self.validate()
    }

    pub fn update_period(&self) -> Duration {
        Duration::from_secs(self.update_period_in_min.saturating_mul(60))
    }

    pub fn enabled_vendors(&self) -> impl Iterator<Item = &VendorConfig> {
        self.vendors.iter().filter(|v| v.enabled)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.update_period_in_min == 0 {
            bail!("update_period_in_min must be greater than zero");
        }
        Ok(())
    }
}
