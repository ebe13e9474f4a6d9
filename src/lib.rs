// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:     Configuration structs loaded from JSON
// - schema:     Vendor and release data model
// - comparator: Release identity and total ordering
// - util:       Link / name normalization helpers
// - error:      Error taxonomy
// - vendors:    Vendor registry and marketplace HTTP fetchers
// - store:      Release store seam and backends
// - updater:    Reconciliation (fetch → merge → diff) and scheduling
// - metrics:    Runtime counters
//
pub mod comparator;
pub mod config;
pub mod error;
pub mod metrics;
pub mod schema;
pub mod store;
pub mod updater;
pub mod util;
pub mod vendors;
