use std::path::Path;

use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use rusty_waterfall::config::ChartConfig;
use rusty_waterfall::data::loader::load_file;

use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Left side panel – dropdown and comparison controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Slices");
    ui.separator();

    if state.table.is_none() {
        ui.label("No table loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            dropdown_selector(ui, state);
            ui.separator();
            comparison_controls(ui, state);
        });
}

/// The dropdown that switches the waterfall between slices.
fn dropdown_selector(ui: &mut Ui, state: &mut AppState) {
    let Some(chart) = &state.chart else {
        ui.label("No waterfall for the current settings.");
        return;
    };

    ui.strong(format!("Slice by '{}'", chart.dropdown_tag));
    let labels: Vec<String> = chart.selections.iter().map(|s| s.label.clone()).collect();
    let selected_text = state
        .active_selection
        .and_then(|i| labels.get(i).cloned())
        .unwrap_or_else(|| "Initial row".to_string());

    let mut picked = None;
    egui::ComboBox::from_id_salt("dropdown")
        .selected_text(selected_text)
        .show_ui(ui, |ui: &mut Ui| {
            for (i, label) in labels.iter().enumerate() {
                if ui
                    .selectable_label(state.active_selection == Some(i), label)
                    .clicked()
                {
                    picked = Some(i);
                }
            }
        });
    if let Some(i) = picked {
        state.select(i);
    }
}

/// Field, anchors, offset, threshold and bin size of the comparison.
fn comparison_controls(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Timeframe comparison");

    let fields = state
        .table
        .as_ref()
        .map(|t| t.numeric_columns())
        .unwrap_or_default();
    let Some(controls) = state.controls.as_mut() else {
        return;
    };
    let mut changed = false;

    egui::ComboBox::from_id_salt("compare_field")
        .selected_text(controls.field.clone().unwrap_or_default())
        .show_ui(ui, |ui: &mut Ui| {
            for field in &fields {
                let is_current = controls.field.as_deref() == Some(field.as_str());
                if ui.selectable_label(is_current, field).clicked() {
                    controls.field = Some(field.clone());
                    changed = true;
                }
            }
        });

    let mut dates_changed = false;
    for (i, anchor) in controls.anchors.iter_mut().enumerate() {
        ui.horizontal(|ui: &mut Ui| {
            ui.label(format!("Anchor {}", i + 1));
            dates_changed |= ui
                .add(DatePickerButton::new(anchor).id_salt(&format!("anchor_{i}")))
                .changed();
        });
    }
    if dates_changed {
        controls.relabel();
        changed = true;
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Offset");
        changed |= ui
            .add(
                DragValue::new(&mut controls.offset_days)
                    .range(1..=3650)
                    .suffix(" days"),
            )
            .changed();
    });

    ui.horizontal(|ui: &mut Ui| {
        let mut use_threshold = controls.threshold.is_some();
        if ui.checkbox(&mut use_threshold, "Threshold").changed() {
            controls.threshold = use_threshold.then_some(0.0);
            changed = true;
        }
        if let Some(threshold) = controls.threshold.as_mut() {
            changed |= ui.add(DragValue::new(threshold).speed(0.1)).changed();
        }
    });

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Bin size");
        changed |= ui
            .add(
                DragValue::new(&mut controls.bin_size)
                    .range(0.001..=f64::MAX)
                    .speed(0.1),
            )
            .changed();
    });

    for (i, label) in controls.labels.iter_mut().enumerate() {
        ui.horizontal(|ui: &mut Ui| {
            ui.label(format!("Label {}", i + 1));
            changed |= ui.text_edit_singleline(label).changed();
        });
    }

    if changed || ui.button("Compare").clicked() {
        state.rebuild_comparison();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data…").clicked() {
                open_data_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open chart config…").clicked() {
                open_config_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} rows, {} columns",
                table.len(),
                table.columns().len()
            ));
        }

        ui.separator();

        if ui
            .selectable_label(state.view == View::Waterfall, "Waterfall")
            .clicked()
        {
            state.view = View::Waterfall;
        }
        if ui
            .selectable_label(state.view == View::Comparison, "Comparison")
            .clicked()
        {
            state.view = View::Comparison;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_data_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open table")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        open_data(state, &path);
    }
}

/// Load a table from `path` into the state, reporting failures in the status line.
pub fn open_data(state: &mut AppState, path: &Path) {
    state.loading = true;
    match load_file(path, &state.config.index_column) {
        Ok(table) => {
            log::info!(
                "Loaded {} rows with columns {:?}",
                table.len(),
                table.columns()
            );
            state.set_table(table);
        }
        Err(e) => {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
            state.loading = false;
        }
    }
}

pub fn open_config_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open chart config")
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match ChartConfig::load(&path) {
            Ok(config) => {
                log::info!("Loaded chart config from {}", path.display());
                state.set_config(config);
            }
            Err(e) => {
                log::error!("Failed to load config: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
