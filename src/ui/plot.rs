use eframe::egui::{Align2, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Text};

use crate::state::AppState;

const BAR_WIDTH: f64 = 0.6;

// ---------------------------------------------------------------------------
// Waterfall plot (central panel)
// ---------------------------------------------------------------------------

/// Render the waterfall for the displayed record.
pub fn waterfall_plot(ui: &mut Ui, state: &AppState) {
    let (Some(chart), Some(record)) = (&state.chart, &state.displayed) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to build a waterfall  (File → Open data…)");
        });
        return;
    };

    if let Some(title) = &chart.title {
        ui.heading(title);
    }

    let palette = &state.palette;
    let labels = record.x_labels.clone();

    Plot::new("waterfall_plot")
        .y_axis_label("Value")
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() > f64::EPSILON || i < 0.0 {
                return String::new();
            }
            labels.get(i as usize).cloned().unwrap_or_default()
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let bars: Vec<Bar> = state
                .bars
                .iter()
                .enumerate()
                .map(|(i, bar)| {
                    Bar::new(i as f64, bar.height())
                        .base_offset(bar.base)
                        .width(BAR_WIDTH)
                        .fill(palette.bar_color(bar.direction))
                        .name(&bar.label)
                })
                .collect();
            plot_ui.bar_chart(BarChart::new(bars));

            // Connectors from each bar's end to the next bar.
            for (i, pair) in state.bars.windows(2).enumerate() {
                let x = i as f64;
                let y = pair[0].end;
                let points: PlotPoints =
                    vec![[x + BAR_WIDTH / 2.0, y], [x + 1.0 - BAR_WIDTH / 2.0, y]].into();
                plot_ui.line(Line::new(points).color(palette.connector).width(1.0));
            }

            // Display values above each bar.
            for (i, (bar, text)) in state.bars.iter().zip(&record.disp_values).enumerate() {
                let top = bar.base.max(bar.end);
                plot_ui.text(
                    Text::new(PlotPoint::new(i as f64, top), RichText::new(text.to_string()))
                        .anchor(Align2::CENTER_BOTTOM),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Distribution comparison plot
// ---------------------------------------------------------------------------

/// Render the two after-window histograms on shared axes.
pub fn comparison_plot(ui: &mut Ui, state: &AppState) {
    let Some(distribution) = &state.distribution else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Pick a field and two anchor dates, then press Compare");
        });
        return;
    };

    Plot::new("comparison_plot")
        .legend(Legend::default())
        .x_axis_label(distribution.field.as_str())
        .y_axis_label("Count")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (i, series) in distribution.series.iter().enumerate() {
                let color = state.palette.series_color(i);
                let bars: Vec<Bar> = series
                    .histogram
                    .bins()
                    .map(|(centre, count)| {
                        Bar::new(centre, count as f64)
                            .width(distribution.bin_size)
                            .fill(color)
                    })
                    .collect();
                let name = format!("{} (n={})", series.label, series.values.len());
                plot_ui.bar_chart(BarChart::new(bars).color(color).name(name));
            }
        });
}
