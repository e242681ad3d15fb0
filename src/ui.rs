use crate::activity::ActivityState;
use crate::models::{ActivitySample, Device, DeviceStatus};
use crate::network::TelemetryClient;
use crate::scanner::ScanState;
use eframe::egui;
use std::time::Duration;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(30, 144, 255);

pub const NO_DEVICES_TEXT: &str = "No devices found yet. Tap \"Scan Network\" to start.";

// What the device section shows for a given scan state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceListView {
    pub busy: bool,
    pub empty_notice: bool,
}

impl DeviceListView {
    pub fn from_state(state: &ScanState) -> Self {
        Self {
            busy: state.scanning,
            empty_notice: !state.scanning && state.devices.is_empty(),
        }
    }
}

/// Sample cards are hidden while a poll is in flight.
pub fn visible_sample(state: &ActivityState) -> Option<&ActivitySample> {
    if state.polling {
        None
    } else {
        state.last_sample.as_ref()
    }
}

pub fn format_average(mbps: f64) -> String {
    format!("{:.2} Mbps", mbps)
}

fn format_optional(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{} {}", v, unit),
        None => format!("n/a {}", unit),
    }
}

pub struct TelemetryApp {
    client: TelemetryClient,
}

impl TelemetryApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, client: TelemetryClient) -> Self {
        Self { client }
    }

    fn render_header(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add_space(10.0);
            ui.heading("🖧 Devices on the Network");
        });

        ui.add_space(5.0);
        ui.separator();
    }

    fn render_scan_controls(&self, ui: &mut egui::Ui, scanning: bool) {
        ui.horizontal(|ui| {
            ui.add_space(5.0);

            let label = if scanning {
                "⏳ Scanning..."
            } else {
                "🔍 Scan Network"
            };
            let button = egui::Button::new(egui::RichText::new(label).color(egui::Color32::WHITE))
                .fill(ACCENT);

            if ui.add_sized([160.0, 35.0], button).clicked() {
                self.client.scan_network();
            }
        });
    }

    fn render_device_list(&self, ui: &mut egui::Ui, state: &ScanState) {
        let view = DeviceListView::from_state(state);

        if view.busy {
            ui.add_space(20.0);
            ui.vertical_centered(|ui| ui.spinner());
            ui.add_space(20.0);
        }

        if view.empty_notice {
            ui.add_space(20.0);
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new(NO_DEVICES_TEXT)
                        .size(16.0)
                        .color(egui::Color32::from_rgb(102, 102, 102)),
                );
            });
        }

        ui.add_space(10.0);
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new(format!("Device List ({})", state.devices.len()))
                    .size(20.0)
                    .strong(),
            );
        });
        ui.add_space(5.0);

        egui::ScrollArea::vertical()
            .max_height(320.0)
            .show(ui, |ui| {
                for (idx, device) in state.devices.iter().enumerate() {
                    ui.push_id((idx, device.key().to_string()), |ui| {
                        Self::render_device_row(ui, device);
                    });
                    ui.add_space(2.0);
                }
            });
    }

    fn render_device_row(ui: &mut egui::Ui, device: &Device) {
        egui::Frame::none()
            .fill(egui::Color32::WHITE)
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(238, 238, 238)))
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let status_color = match device.status() {
                        DeviceStatus::Connected => egui::Color32::from_rgb(76, 175, 80),
                        DeviceStatus::Disconnected => egui::Color32::from_rgb(244, 67, 54),
                    };
                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                    ui.painter().circle_filled(rect.center(), 7.0, status_color);

                    ui.add_space(15.0);

                    ui.vertical(|ui| {
                        ui.horizontal(|ui| {
                            ui.label(
                                egui::RichText::new(&device.ip).size(16.0).strong().color(ACCENT),
                            );
                            ui.label(
                                egui::RichText::new(device.status().as_str())
                                    .size(12.0)
                                    .color(status_color),
                            );
                        });
                        ui.label(
                            egui::RichText::new(format!("MAC: {}", device.mac_label()))
                                .size(14.0)
                                .color(egui::Color32::from_rgb(68, 68, 68)),
                        );
                        ui.label(
                            egui::RichText::new(format!("Vendor: {}", device.vendor_label()))
                                .size(14.0)
                                .italics()
                                .color(egui::Color32::from_rgb(136, 136, 136)),
                        );
                    });
                });
            });
    }

    fn render_activity(&self, ui: &mut egui::Ui, state: &ActivityState) {
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new("Activity").size(20.0).strong());
        });
        ui.add_space(10.0);

        ui.horizontal(|ui| {
            ui.add_space(5.0);
            let button = egui::Button::new(
                egui::RichText::new("📶 Check Network Activity").color(egui::Color32::WHITE),
            )
            .fill(ACCENT);
            if ui.add_sized([220.0, 35.0], button).clicked() {
                self.client.check_activity();
            }
        });

        if state.polling {
            ui.add_space(20.0);
            ui.vertical_centered(|ui| ui.spinner());
            ui.add_space(20.0);
        }

        if let Some(sample) = visible_sample(state) {
            ui.add_space(15.0);
            egui::Grid::new("activity_cards")
                .num_columns(2)
                .spacing([15.0, 15.0])
                .show(ui, |ui| {
                    Self::render_card(ui, "Latency", format!("{} ms", sample.latency));
                    Self::render_card(ui, "Packet Loss", format!("{} %", sample.packet_loss));
                    ui.end_row();
                    Self::render_card(
                        ui,
                        "Download Speed",
                        format_optional(sample.download_speed, "Mbps"),
                    );
                    Self::render_card(ui, "Upload Speed", format!("{} Mbps", sample.upload_speed));
                    ui.end_row();
                });
        }
    }

    fn render_card(ui: &mut egui::Ui, title: &str, value: String) {
        egui::Frame::none()
            .fill(egui::Color32::from_rgb(241, 245, 249))
            .rounding(10.0)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(200.0);
                ui.vertical(|ui| {
                    ui.label(
                        egui::RichText::new(title)
                            .size(14.0)
                            .color(egui::Color32::from_rgb(85, 85, 85)),
                    );
                    ui.label(egui::RichText::new(value).size(18.0).strong().color(ACCENT));
                });
            });
    }

    fn render_average(&self, ui: &mut egui::Ui, state: &ActivityState) {
        egui::Frame::none()
            .fill(egui::Color32::from_rgb(204, 239, 255))
            .rounding(16.0)
            .inner_margin(25.0)
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new("Average Download Speed")
                            .size(15.0)
                            .strong()
                            .color(egui::Color32::from_rgb(0, 90, 141)),
                    );
                    ui.add_space(10.0);
                    ui.label(
                        egui::RichText::new(format_average(state.average_download_speed()))
                            .size(25.0)
                            .strong()
                            .color(egui::Color32::from_rgb(0, 122, 204)),
                    );
                    ui.label(
                        egui::RichText::new(format!("{} samples", state.history.len()))
                            .size(12.0)
                            .color(egui::Color32::from_rgb(0, 90, 141)),
                    );
                });
            });
    }
}

impl eframe::App for TelemetryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let scan = self.client.scan_state();
        let activity = self.client.activity_state();

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);

                self.render_header(ui);
                ui.add_space(15.0);

                self.render_scan_controls(ui, scan.scanning);
                self.render_device_list(ui, &scan);
                ui.add_space(15.0);

                ui.separator();
                ui.add_space(10.0);

                self.render_activity(ui, &activity);
                ui.add_space(25.0);

                self.render_average(ui, &activity);
            });
        });

        // Results arrive from the runtime, not from input events
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
