pub mod activity;
pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod scanner;
pub mod transport;
pub mod ui;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use activity::{ActivityPoller, ActivityState, DownloadSpeedHistory, PollOutcome};
pub use config::TelemetryConfig;
pub use error::{ConfigError, Operation, TelemetryError};
pub use models::{ActivitySample, Device, DeviceKey, DeviceStatus};
pub use network::TelemetryClient;
pub use scanner::{ScanCoordinator, ScanOutcome, ScanState};
pub use transport::{HttpTransport, TelemetryTransport};

// State behind these mutexes is plain data, so a poisoned lock is still usable.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
