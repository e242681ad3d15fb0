use crate::config::TelemetryConfig;
use crate::error::TelemetryError;
use crate::models::{decode_activity_sample, decode_device_list, ActivitySample, DecodedDevices};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

/// Boundary to the remote scanning service.
///
/// `HttpTransport` talks to the real endpoints; tests substitute scripted
/// implementations.
#[async_trait]
pub trait TelemetryTransport: Send + Sync {
    /// `GET /api/devices`
    async fn fetch_devices(&self) -> Result<DecodedDevices, TelemetryError>;

    /// `GET /api/ping`
    async fn fetch_activity(&self) -> Result<ActivitySample, TelemetryError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    config: TelemetryConfig,
}

impl HttpTransport {
    pub fn new(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("network-telemetry-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    async fn get(&self, url: &Url) -> Result<Vec<u8>, TelemetryError> {
        match self.config.request_timeout() {
            Some(deadline) => tokio::time::timeout(deadline, self.get_body(url))
                .await
                .map_err(|_| TelemetryError::TimedOut(deadline))?,
            None => self.get_body(url).await,
        }
    }

    async fn get_body(&self, url: &Url) -> Result<Vec<u8>, TelemetryError> {
        debug!(%url, "sending request");
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        debug!(%url, bytes = body.len(), "response received");
        Ok(body.to_vec())
    }
}

#[async_trait]
impl TelemetryTransport for HttpTransport {
    async fn fetch_devices(&self) -> Result<DecodedDevices, TelemetryError> {
        let body = self.get(self.config.devices_url()).await?;
        decode_device_list(&body)
    }

    async fn fetch_activity(&self) -> Result<ActivitySample, TelemetryError> {
        let body = self.get(self.config.ping_url()).await?;
        decode_activity_sample(&body)
    }
}
