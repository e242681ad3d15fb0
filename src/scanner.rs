use crate::error::{Operation, TelemetryError};
use crate::lock_unpoisoned;
use crate::models::Device;
use crate::transport::TelemetryTransport;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanState {
    pub devices: Vec<Device>,
    pub scanning: bool,
}

#[derive(Debug)]
pub enum ScanOutcome {
    /// A discovery request was already in flight; nothing was sent.
    Skipped,
    Completed { devices: usize, dropped: usize },
    Failed(TelemetryError),
}

/// Owns the device list and the `scanning` flag.
///
/// At most one discovery request is outstanding at a time. A successful
/// response replaces the list wholesale; a failed one leaves it as it was.
#[derive(Clone)]
pub struct ScanCoordinator {
    transport: Arc<dyn TelemetryTransport>,
    state: Arc<Mutex<ScanState>>,
}

impl ScanCoordinator {
    pub fn new(transport: Arc<dyn TelemetryTransport>) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(ScanState::default())),
        }
    }

    pub fn snapshot(&self) -> ScanState {
        lock_unpoisoned(&self.state).clone()
    }

    pub fn is_scanning(&self) -> bool {
        lock_unpoisoned(&self.state).scanning
    }

    pub fn devices(&self) -> Vec<Device> {
        lock_unpoisoned(&self.state).devices.clone()
    }

    /// Checks and sets the `scanning` flag in one step.
    ///
    /// Returns `None` when a scan is already in flight. The returned
    /// `PendingScan` owns the flag until it is run or dropped.
    pub fn begin(&self) -> Option<PendingScan> {
        let mut state = lock_unpoisoned(&self.state);
        if state.scanning {
            debug!(operation = %Operation::Discovery, "scan already in flight, ignoring");
            return None;
        }
        state.scanning = true;

        Some(PendingScan {
            transport: Arc::clone(&self.transport),
            state: Arc::clone(&self.state),
            finished: false,
        })
    }

    pub async fn start_scan(&self) -> ScanOutcome {
        match self.begin() {
            Some(pending) => pending.run().await,
            None => ScanOutcome::Skipped,
        }
    }
}

pub struct PendingScan {
    transport: Arc<dyn TelemetryTransport>,
    state: Arc<Mutex<ScanState>>,
    finished: bool,
}

impl PendingScan {
    pub async fn run(mut self) -> ScanOutcome {
        let result = self.transport.fetch_devices().await;

        let mut state = lock_unpoisoned(&self.state);
        state.scanning = false;
        self.finished = true;

        match result {
            Ok(decoded) => {
                let devices = decoded.devices.len();
                state.devices = decoded.devices;
                info!(devices, dropped = decoded.dropped, "scan completed");
                ScanOutcome::Completed {
                    devices,
                    dropped: decoded.dropped,
                }
            }
            Err(e) => {
                error!(
                    operation = %Operation::Discovery,
                    kind = e.kind(),
                    error = %e,
                    "scan failed, device list unchanged"
                );
                ScanOutcome::Failed(e)
            }
        }
    }
}

impl Drop for PendingScan {
    // A scan future dropped mid-request must not leave the flag stuck.
    fn drop(&mut self) {
        if !self.finished {
            lock_unpoisoned(&self.state).scanning = false;
        }
    }
}
