/// Updater module
///
/// This module groups all logic responsible for:
/// - Reconciling one vendor (fetch → merge → diff) under the update lock
/// - Detecting releases that disappeared or were withdrawn
/// - Driving the reconciliation for every vendor on a fixed delay
///
/// Design notes:
/// - Vendor-specific logic MUST NOT live here, it belongs to fetchers
/// - Storage details MUST NOT live here, they belong to stores
pub mod consistency;
pub mod coordinator;
pub mod scheduler;

pub use consistency::{AlertKind, ConsistencyAlert};
pub use coordinator::{ReleaseUpdater, UpdateReport};
pub use scheduler::{TickSummary, UpdateSchedule, run_update, schedule_updates};
