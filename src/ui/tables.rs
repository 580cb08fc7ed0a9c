use eframe::egui::{self, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::aggregate::{MARGIN_LABEL, Pivot};
use crate::data::model::{Column, Table, Transaction, Value};

// ---------------------------------------------------------------------------
// Key → value tables
// ---------------------------------------------------------------------------

/// Two-column grid of a ranked or ordered summary.
pub fn summary_table<F>(
    ui: &mut Ui,
    id: &str,
    headers: (&str, &str),
    entries: &[(Value, f64)],
    format: F,
) where
    F: Fn(f64) -> String,
{
    egui::Grid::new(id)
        .striped(true)
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            ui.strong(headers.0);
            ui.strong(headers.1);
            ui.end_row();
            for (key, value) in entries {
                ui.label(key.to_string());
                ui.label(format(*value));
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Pivot grid
// ---------------------------------------------------------------------------

/// Pivot as a grid, with an "All" row and column when margins are present.
pub fn pivot_table<F>(ui: &mut Ui, id: &str, pivot: &Pivot, format: F)
where
    F: Fn(f64) -> String,
{
    let margins = pivot.margins.is_some();
    egui::Grid::new(id)
        .striped(true)
        .num_columns(pivot.column_keys.len() + 1 + usize::from(margins))
        .show(ui, |ui: &mut Ui| {
            ui.strong(format!("{} \\ {}", pivot.rows.label(), pivot.columns.label()));
            for col in &pivot.column_keys {
                ui.strong(col.to_string());
            }
            if margins {
                ui.strong(MARGIN_LABEL);
            }
            ui.end_row();

            for row in &pivot.row_keys {
                ui.label(row.to_string());
                for col in &pivot.column_keys {
                    ui.label(format(pivot.cell(row, col)));
                }
                if let Some(total) = pivot.row_total(row) {
                    ui.strong(format(total));
                }
                ui.end_row();
            }

            if margins {
                ui.strong(MARGIN_LABEL);
                for col in &pivot.column_keys {
                    ui.strong(format(pivot.column_total(col).unwrap_or_default()));
                }
                ui.strong(format(pivot.grand_total().unwrap_or_default()));
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

/// Every row of the current view; only visible rows are laid out.
pub fn raw_rows(ui: &mut Ui, view: &Table) {
    let rows: Vec<&Transaction> = view.rows().collect();
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(360.0)
        .columns(TableColumn::auto().at_least(70.0), Column::ALL.len())
        .header(20.0, |mut header| {
            for col in Column::ALL {
                header.col(|ui: &mut Ui| {
                    ui.strong(col.label());
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let t = rows[row.index()];
                for col in Column::ALL {
                    row.col(|ui: &mut Ui| {
                        ui.label(t.get(col).to_string());
                    });
                }
            });
        });
}
