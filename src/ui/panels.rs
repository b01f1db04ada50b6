use eframe::egui::{self, Align2, Color32, RichText, ScrollArea, Ui};

use ev_dashboard::chart::Panel;
use ev_dashboard::data::filter::FilterField;
use ev_dashboard::data::loader;
use ev_dashboard::insights::format_thousands;
use ev_dashboard::state::{AppState, NoticeLevel};

/// Requests from the top bar that need more than `&mut AppState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    OpenFile,
    ExportCsv,
    ExportPng,
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets and insights
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let options = state.dataset().filter_options().clone();
    let years: Vec<String> = options.years.iter().map(|y| y.to_string()).collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            filter_combo(ui, state, FilterField::Year, &years);
            filter_combo(ui, state, FilterField::Region, &options.regions);
            filter_combo(ui, state, FilterField::Mode, &options.modes);

            ui.add_space(6.0);
            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }

            ui.add_space(8.0);
            ui.separator();
            ui.strong("Key insights");
            for line in state.snapshot().insights.lines() {
                ui.label(format!("• {line}"));
            }
        });
}

/// One selector with an "All" entry that clears it.
fn filter_combo(ui: &mut Ui, state: &mut AppState, field: FilterField, values: &[String]) {
    let current = state.filters().get(field).map(str::to_string);
    let mut choice: Option<Option<String>> = None;

    ui.strong(field.label());
    egui::ComboBox::from_id_salt(("filter", field))
        .selected_text(current.as_deref().unwrap_or("All"))
        .width(ui.available_width() - 8.0)
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_none(), "All").clicked() {
                choice = Some(None);
            }
            for value in values {
                if ui
                    .selectable_label(current.as_deref() == Some(value.as_str()), value)
                    .clicked()
                {
                    choice = Some(Some(value.clone()));
                }
            }
        });

    if let Some(value) = choice {
        if value != current {
            state.on_filter_changed(field, value);
        }
    }
    ui.add_space(4.0);
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &AppState) -> Option<UiAction> {
    let mut action = None;
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                action = Some(UiAction::OpenFile);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Export CSV…").clicked() {
                action = Some(UiAction::ExportCsv);
                ui.close_menu();
            }
            if ui.button("Export chart as PNG…").clicked() {
                action = Some(UiAction::ExportPng);
                ui.close_menu();
            }
        });

        ui.separator();

        let header = &state.snapshot().header;
        ui.label(format!(
            "{} vehicles · {} regions · {} years",
            format_thousands(header.total_vehicles, 0),
            header.regions,
            header.years
        ));

        ui.separator();
        ui.label(
            RichText::new(format!(
                "{} of {} records · {}",
                state.view().len(),
                state.dataset().len(),
                state.dataset().source()
            ))
            .weak(),
        );
    });
    action
}

// ---------------------------------------------------------------------------
// Chart tabs and render-mode toggles
// ---------------------------------------------------------------------------

pub fn chart_tabs(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        for panel in Panel::ALL {
            if ui
                .selectable_label(state.current_tab() == panel, panel.title())
                .clicked()
            {
                state.select_tab(panel);
            }
        }
    });

    let panel = state.current_tab();
    let selected = state.chart_kind(panel);
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Chart type:");
        for kind in panel.kinds() {
            if ui.selectable_label(selected == kind, kind.label()).clicked() {
                if let Err(e) = state.set_chart_kind(panel, kind) {
                    log::warn!("{e}");
                }
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// Errors stack in the top-right corner, feedback in the bottom-right.
pub fn notices(ctx: &egui::Context, state: &AppState) {
    for (level, anchor, offset, fill) in [
        (
            NoticeLevel::Error,
            Align2::RIGHT_TOP,
            egui::vec2(-20.0, 40.0),
            Color32::from_rgb(0xF4, 0x43, 0x36),
        ),
        (
            NoticeLevel::Info,
            Align2::RIGHT_BOTTOM,
            egui::vec2(-20.0, -20.0),
            Color32::from_rgb(0x4C, 0xAF, 0x50),
        ),
    ] {
        let mut matching = state.notices().iter().filter(|n| n.level == level).peekable();
        if matching.peek().is_none() {
            continue;
        }
        egui::Area::new(egui::Id::new(("notices", format!("{level:?}"))))
            .anchor(anchor, offset)
            .order(egui::Order::Foreground)
            .show(ctx, |ui: &mut Ui| {
                ui.set_max_width(320.0);
                for notice in matching {
                    egui::Frame::popup(ui.style())
                        .fill(fill)
                        .show(ui, |ui: &mut Ui| {
                            ui.label(RichText::new(&notice.message).color(Color32::WHITE));
                        });
                }
            });
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open EV market data")
        .add_filter("Supported files", &["csv", "tsv", "json", "parquet", "pq"])
        .add_filter("CSV / TSV", &["csv", "tsv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match loader::load_dataset(&path) {
            Ok(dataset) => state.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e}");
                state.push_notice(NoticeLevel::Error, format!("Could not load {}: {e}", path.display()));
            }
        }
    }
}
