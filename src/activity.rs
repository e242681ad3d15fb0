use crate::error::{Operation, TelemetryError};
use crate::lock_unpoisoned;
use crate::models::ActivitySample;
use crate::transport::TelemetryTransport;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// Every download speed observed this session, in arrival order.
///
/// Append-only: no windowing, no outlier rejection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadSpeedHistory {
    samples: Vec<f64>,
}

impl DownloadSpeedHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mbps: f64) {
        self.samples.push(mbps);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Arithmetic mean rounded to two decimals, `0.0` when empty.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mean = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        (mean * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityState {
    pub last_sample: Option<ActivitySample>,
    pub history: DownloadSpeedHistory,
    pub polling: bool,
}

impl ActivityState {
    pub fn average_download_speed(&self) -> f64 {
        self.history.average()
    }
}

#[derive(Debug)]
pub enum PollOutcome {
    /// A diagnostics request was already in flight; nothing was sent.
    Skipped,
    Completed { recorded_speed: bool },
    Failed(TelemetryError),
}

/// Owns the last activity sample, the download speed history and the
/// `polling` flag.
#[derive(Clone)]
pub struct ActivityPoller {
    transport: Arc<dyn TelemetryTransport>,
    state: Arc<Mutex<ActivityState>>,
}

impl ActivityPoller {
    pub fn new(transport: Arc<dyn TelemetryTransport>) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(ActivityState::default())),
        }
    }

    pub fn snapshot(&self) -> ActivityState {
        lock_unpoisoned(&self.state).clone()
    }

    pub fn is_polling(&self) -> bool {
        lock_unpoisoned(&self.state).polling
    }

    pub fn last_sample(&self) -> Option<ActivitySample> {
        lock_unpoisoned(&self.state).last_sample.clone()
    }

    pub fn average_download_speed(&self) -> f64 {
        lock_unpoisoned(&self.state).average_download_speed()
    }

    pub fn begin(&self) -> Option<PendingPoll> {
        let mut state = lock_unpoisoned(&self.state);
        if state.polling {
            debug!(operation = %Operation::Diagnostics, "poll already in flight, ignoring");
            return None;
        }
        state.polling = true;

        Some(PendingPoll {
            transport: Arc::clone(&self.transport),
            state: Arc::clone(&self.state),
            finished: false,
        })
    }

    pub async fn poll_activity(&self) -> PollOutcome {
        match self.begin() {
            Some(pending) => pending.run().await,
            None => PollOutcome::Skipped,
        }
    }
}

pub struct PendingPoll {
    transport: Arc<dyn TelemetryTransport>,
    state: Arc<Mutex<ActivityState>>,
    finished: bool,
}

impl PendingPoll {
    pub async fn run(mut self) -> PollOutcome {
        let result = self.transport.fetch_activity().await;

        let mut state = lock_unpoisoned(&self.state);
        state.polling = false;
        self.finished = true;

        match result {
            Ok(sample) => {
                let recorded_speed = match sample.download_speed {
                    Some(mbps) => {
                        state.history.push(mbps);
                        true
                    }
                    None => false,
                };
                info!(
                    latency_ms = sample.latency,
                    packet_loss = sample.packet_loss,
                    download_mbps = ?sample.download_speed,
                    upload_mbps = sample.upload_speed,
                    "activity sample received"
                );
                state.last_sample = Some(sample);
                PollOutcome::Completed { recorded_speed }
            }
            Err(e) => {
                error!(
                    operation = %Operation::Diagnostics,
                    kind = e.kind(),
                    error = %e,
                    "activity poll failed, last sample unchanged"
                );
                PollOutcome::Failed(e)
            }
        }
    }
}

impl Drop for PendingPoll {
    fn drop(&mut self) {
        if !self.finished {
            lock_unpoisoned(&self.state).polling = false;
        }
    }
}
