use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;

use ev_dashboard::config::DashboardConfig;
use ev_dashboard::export;
use ev_dashboard::state::{AppState, NoticeLevel};

use crate::ui::panels::{self, UiAction};
use crate::ui::plot;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
    config: DashboardConfig,
    /// Screen rect of the chart drawn last frame, in points.
    chart_rect: Option<egui::Rect>,
    /// PNG export waiting for the screenshot to arrive.
    pending_png: Option<PathBuf>,
}

impl DashboardApp {
    pub fn new(state: AppState, config: DashboardConfig) -> Self {
        Self {
            state,
            config,
            chart_rect: None,
            pending_png: None,
        }
    }

    fn handle_action(&mut self, ctx: &egui::Context, action: UiAction) {
        match action {
            UiAction::OpenFile => panels::open_file_dialog(&mut self.state),
            UiAction::ExportCsv => {
                let target = rfd::FileDialog::new()
                    .set_title("Export filtered data")
                    .set_file_name(&self.config.export.csv_file_name)
                    .add_filter("CSV", &["csv"])
                    .save_file();
                if let Some(path) = target {
                    // The outcome is reported through a notice.
                    let _ = self.state.export_csv(&path);
                }
            }
            UiAction::ExportPng => {
                if !self.state.request_png_export() || self.chart_rect.is_none() {
                    return;
                }
                let target = rfd::FileDialog::new()
                    .set_title("Export chart image")
                    .set_file_name(&self.config.export.png_file_name)
                    .add_filter("PNG", &["png"])
                    .save_file();
                if let Some(path) = target {
                    self.pending_png = Some(path);
                    ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(
                        egui::UserData::default(),
                    ));
                }
            }
        }
    }

    /// Crop the chart out of a finished screenshot and write it.
    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        let image = ctx.input(|i| {
            i.raw.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });
        let Some(image) = image else {
            return;
        };
        let (Some(path), Some(rect)) = (self.pending_png.take(), self.chart_rect) else {
            return;
        };

        let region = image.region(&rect, Some(ctx.pixels_per_point()));
        let [width, height] = region.size;
        let rgba: Vec<u8> = region.pixels.iter().flat_map(|c| c.to_array()).collect();

        match export::export_png(
            &path,
            rgba,
            width as u32,
            height as u32,
            self.config.export.image_size,
        ) {
            Ok(()) => self
                .state
                .push_notice(NoticeLevel::Info, "Chart exported as PNG".to_string()),
            Err(e) => {
                log::error!("PNG export failed: {e}");
                self.state
                    .push_notice(NoticeLevel::Error, format!("PNG export failed: {e}"));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.prune_notices(Instant::now());
        self.handle_screenshot(ctx);

        // ---- Top panel: menu bar and headline figures ----
        let mut action = None;
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            action = panels::top_bar(ui, &self.state);
        });

        // ---- Left side panel: filters and insights ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tabs and the selected chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::chart_tabs(ui, &mut self.state);
            ui.separator();
            let spec = self.state.chart_spec(self.state.current_tab());
            self.chart_rect = plot::chart_view(ui, &spec);
        });

        panels::notices(ctx, &self.state);

        if let Some(action) = action {
            self.handle_action(ctx, action);
        }

        if !self.state.notices().is_empty() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}
