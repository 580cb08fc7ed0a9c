use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

use crate::color::{ColorMap, generate_palette};
use crate::data::aggregate::Pivot;
use crate::data::model::Value;

const CHART_HEIGHT: f32 = 240.0;
const BAR_COLOR: Color32 = Color32::from_rgb(0x8d, 0x5b, 0x3a);

// ---------------------------------------------------------------------------
// Single-series charts
// ---------------------------------------------------------------------------

/// One bar per entry, in the given order. Hovering a bar shows its key.
pub fn bar_chart(ui: &mut Ui, id: &str, entries: &[(Value, f64)], horizontal: bool) {
    let bars: Vec<Bar> = entries
        .iter()
        .enumerate()
        .map(|(i, (key, value))| {
            // Horizontal charts list the first entry at the top.
            let pos = if horizontal {
                (entries.len() - 1 - i) as f64
            } else {
                i as f64
            };
            Bar::new(pos, *value).name(key.to_string()).width(0.7)
        })
        .collect();

    let mut chart = BarChart::new(bars).color(BAR_COLOR);
    if horizontal {
        chart = chart.horizontal();
    }
    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

/// Points joined in entry order, e.g. months in calendar order.
pub fn line_chart(ui: &mut Ui, id: &str, name: &str, entries: &[(Value, f64)]) {
    let points: PlotPoints = entries
        .iter()
        .enumerate()
        .map(|(i, (_, value))| [i as f64, *value])
        .collect();
    let line = Line::new(points).name(name).color(BAR_COLOR).width(2.0);

    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .legend(Legend::default())
        .show(ui, |plot_ui| plot_ui.line(line));
}

// ---------------------------------------------------------------------------
// Pivot chart
// ---------------------------------------------------------------------------

/// Grouped bars: one group per pivot row, one coloured bar per pivot column.
pub fn pivot_chart(ui: &mut Ui, id: &str, pivot: &Pivot, colors: Option<&ColorMap>) {
    let n_cols = pivot.column_keys.len();
    if n_cols == 0 {
        return;
    }
    let fallback = generate_palette(n_cols);
    let width = 0.8 / n_cols as f64;

    let charts: Vec<BarChart> = pivot
        .column_keys
        .iter()
        .enumerate()
        .map(|(j, col_key)| {
            let color = colors
                .filter(|cm| cm.column == pivot.columns)
                .map(|cm| cm.color_for(col_key))
                .unwrap_or(fallback[j]);
            let offset = (j as f64 - (n_cols as f64 - 1.0) / 2.0) * width;
            let bars = pivot
                .row_keys
                .iter()
                .enumerate()
                .map(|(i, row_key)| {
                    Bar::new(i as f64 + offset, pivot.cell(row_key, col_key))
                        .name(format!("{row_key} / {col_key}"))
                        .width(width * 0.9)
                })
                .collect();
            BarChart::new(bars).name(col_key.to_string()).color(color)
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}
