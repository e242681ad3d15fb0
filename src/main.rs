use anyhow::{Context, Result};
use eframe::egui;
use network_telemetry_client::ui::TelemetryApp;
use network_telemetry_client::{TelemetryClient, TelemetryConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = TelemetryConfig::from_env().context("Failed to load telemetry configuration")?;

    // Requests run here; the UI stays on the main thread
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let client = TelemetryClient::from_config(config, runtime.handle().clone())
        .context("Failed to build HTTP client")?;

    info!("Network Telemetry v{} starting", env!("CARGO_PKG_VERSION"));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([520.0, 900.0])
            .with_title("Network Telemetry"),
        ..Default::default()
    };

    eframe::run_native(
        "Network Telemetry",
        options,
        Box::new(|cc| {
            // Force light mode
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            Box::new(TelemetryApp::new(cc, client))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run application: {}", e))
}
