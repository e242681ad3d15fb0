use crate::activity::{ActivityPoller, ActivityState};
use crate::config::TelemetryConfig;
use crate::error::TelemetryError;
use crate::scanner::{ScanCoordinator, ScanState};
use crate::transport::{HttpTransport, TelemetryTransport};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

/// Both telemetry components plus the runtime their requests run on.
///
/// The UI thread calls `scan_network` / `check_activity`; the busy flag is
/// set before the request is spawned, so a second tap in the same frame is
/// already rejected.
pub struct TelemetryClient {
    scanner: ScanCoordinator,
    activity: ActivityPoller,
    runtime: Handle,
}

impl TelemetryClient {
    pub fn new(transport: Arc<dyn TelemetryTransport>, runtime: Handle) -> Self {
        Self {
            scanner: ScanCoordinator::new(Arc::clone(&transport)),
            activity: ActivityPoller::new(transport),
            runtime,
        }
    }

    pub fn from_config(config: TelemetryConfig, runtime: Handle) -> Result<Self, TelemetryError> {
        info!(
            base_url = %config.base_url(),
            timeout = ?config.request_timeout(),
            "telemetry client configured"
        );
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), runtime))
    }

    /// Returns `false` when a scan was already in flight.
    pub fn scan_network(&self) -> bool {
        match self.scanner.begin() {
            Some(pending) => {
                self.runtime.spawn(pending.run());
                true
            }
            None => false,
        }
    }

    /// Returns `false` when a poll was already in flight.
    pub fn check_activity(&self) -> bool {
        match self.activity.begin() {
            Some(pending) => {
                self.runtime.spawn(pending.run());
                true
            }
            None => false,
        }
    }

    pub fn scan_state(&self) -> ScanState {
        self.scanner.snapshot()
    }

    pub fn activity_state(&self) -> ActivityState {
        self.activity.snapshot()
    }
}
