use eframe::egui::{self, Color32, RichText, Ui};

use crate::config::DashboardConfig;
use crate::data::aggregate::Kpis;
use crate::data::filter::Choice;
use crate::data::model::{Column, Value};
use crate::state::AppState;
use crate::ui::{plot, tables};

const NO_DRILL_DOWN: &str = "None";

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// A select box over `options`; returns the newly picked choice, if any.
fn choice_select(ui: &mut Ui, id: &str, title: &str, current: &Choice, options: &[Choice]) -> Option<Choice> {
    let mut picked = None;
    ui.strong(title);
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.label())
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for option in options {
                if ui.selectable_label(option == current, option.label()).clicked() {
                    picked = Some(option.clone());
                }
            }
        });
    ui.add_space(6.0);
    picked
}

fn column_select(ui: &mut Ui, id: &str, title: &str, current: Column) -> Option<Column> {
    let mut picked = None;
    ui.label(title);
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.label())
        .show_ui(ui, |ui: &mut Ui| {
            for col in Column::CATEGORICAL {
                if ui.selectable_label(col == current, col.label()).clicked() {
                    picked = Some(col);
                }
            }
        });
    picked
}

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🔎 Filter Data");
    ui.separator();

    if state.report.is_none() && state.view.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    let options = state.select_options.clone();
    let selection = state.selection.clone();

    if let Some(c) = choice_select(ui, "location", "Store Location", &selection.location, &options.locations) {
        state.set_filter(Column::StoreLocation, c);
    }
    if let Some(c) = choice_select(ui, "category", "Product Category", &selection.category, &options.categories) {
        state.set_filter(Column::ProductCategory, c);
    }
    if let Some(c) = choice_select(ui, "month", "Month", &selection.month, &options.months) {
        state.set_filter(Column::Month, c);
    }
    if ui.button("Reset filters").clicked() {
        state.reset_filters();
    }

    ui.separator();
    ui.strong("Pivot view");
    let rows = state.report_options.pivot_rows;
    let cols = state.report_options.pivot_columns;
    if let Some(r) = column_select(ui, "pivot_rows", "Rows", rows) {
        state.set_pivot_axes(r, cols);
    }
    if let Some(c) = column_select(ui, "pivot_cols", "Columns", cols) {
        state.set_pivot_axes(rows, c);
    }

    ui.separator();
    ui.strong("Product drill-down");
    let current = state.report_options.drill_down.clone();
    egui::ComboBox::from_id_salt("drill_down")
        .selected_text(current.as_deref().unwrap_or(NO_DRILL_DOWN))
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_none(), NO_DRILL_DOWN).clicked() {
                state.set_drill_down(None);
            }
            for product_type in &options.product_types {
                let selected = current.as_deref() == Some(product_type.as_str());
                if ui.selectable_label(selected, product_type).clicked() {
                    state.set_drill_down(Some(product_type.clone()));
                }
            }
        });

    if let Some(cm) = &state.color_map {
        ui.separator();
        ui.strong("Store colours");
        for (label, color) in cm.legend_entries() {
            ui.label(RichText::new(format!("■ {label}")).color(color));
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

pub fn top_bar(ui: &mut Ui, state: &AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.strong("☕ Coffee Shop Sales Dashboard");
        ui.separator();

        if let (Some(view), Some(total)) = (&state.view, state.total_rows()) {
            ui.label(format!("{total} transactions loaded, {} selected", view.len()));
            ui.separator();
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel – the dashboard
// ---------------------------------------------------------------------------

fn metric(ui: &mut Ui, title: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(title).small());
        ui.label(RichText::new(value).heading().strong());
    });
}

fn kpi_row(ui: &mut Ui, kpis: &Kpis, config: &DashboardConfig) {
    ui.columns(4, |cols| {
        metric(&mut cols[0], "💰 Total Revenue", config.money(kpis.total_revenue));
        metric(&mut cols[1], "🧾 Total Transactions", kpis.transactions.to_string());
        metric(&mut cols[2], "📦 Quantity Sold", kpis.quantity.to_string());
        let avg = kpis
            .avg_bill
            .map(|v| config.money(v))
            .unwrap_or_else(|| "–".to_string());
        metric(&mut cols[3], "🛒 Avg Bill Value", avg);
    });
}

pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(report) = &state.report else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No data available.");
        });
        return;
    };
    let config = &state.config;
    let money = |v: f64| config.money(v);

    ui.heading("📌 Key Performance Indicators");
    kpi_row(ui, &report.kpis, config);
    ui.separator();

    if report.notice.is_some() {
        ui.colored_label(Color32::YELLOW, "No transactions match the current filters.");
        return;
    }

    ui.heading("📈 Monthly Sales Summary");
    ui.columns(2, |cols| {
        tables::summary_table(&mut cols[0], "monthly_sales", ("Month", "Revenue"), &report.monthly_sales, money);
        plot::line_chart(&mut cols[1], "monthly_trend", "Revenue", &report.monthly_trend);
    });
    ui.separator();

    ui.heading("📦 Product Performance (Revenue)");
    ui.columns(2, |cols| {
        tables::summary_table(&mut cols[0], "product_sales", ("Product Type", "Revenue"), &report.product_sales, money);
        plot::bar_chart(&mut cols[1], "product_sales_chart", &report.product_sales, true);
    });
    ui.separator();

    if let Some(weekday) = &report.weekday {
        ui.heading("📅 Weekday Insights");
        ui.horizontal(|ui: &mut Ui| {
            ui.colored_label(Color32::LIGHT_GREEN, format!("🔥 Best Sales Day: {}", weekday.best_day));
            ui.separator();
            ui.colored_label(Color32::LIGHT_BLUE, format!("❄ Lowest Sales Day: {}", weekday.worst_day));
        });
        let ranked = weekday.averages.top_n(weekday.averages.len(), false);
        ui.columns(2, |cols| {
            tables::summary_table(&mut cols[0], "weekday_avg", ("Weekday", "Avg Revenue"), &ranked, |v| format!("{v:.2}"));
            plot::line_chart(&mut cols[1], "weekday_trend", "Avg Revenue", &weekday.averages.in_key_order());
        });
        ui.separator();
    }

    ui.heading(format!(
        "📊 {} vs {}",
        report.pivot.rows.label(),
        report.pivot.columns.label()
    ));
    tables::pivot_table(ui, "pivot", &report.pivot, money);
    plot::pivot_chart(ui, "pivot_chart", &report.pivot, state.color_map.as_ref());
    ui.separator();

    ui.heading("🧠 Smart Insights");
    let name = |v: &Option<Value>| v.as_ref().map(|v| v.to_string()).unwrap_or_default();
    ui.label(format!("🔹 Top Product: {}", name(&report.top_product)));
    ui.label(format!("🔹 Top Category: {}", name(&report.top_category)));
    if let Some(weekday) = &report.weekday {
        ui.label(format!("🔹 Peak Sales Day: {}", weekday.best_day));
    }
    ui.columns(2, |cols| {
        cols[0].strong(format!("Top {} products", report.best_sellers.len()));
        tables::summary_table(&mut cols[0], "best_sellers", ("Product", "Revenue"), &report.best_sellers, money);
        cols[1].strong(format!("Bottom {} products", report.worst_sellers.len()));
        tables::summary_table(&mut cols[1], "worst_sellers", ("Product", "Revenue"), &report.worst_sellers, money);
    });
    ui.separator();

    if let Some(drill) = &report.drill_down {
        ui.heading(format!("🔍 Drill-down: {}", drill.product_type));
        if drill.revenue_by_detail.is_empty() {
            ui.label("No sales of this product type in the current selection.");
        } else {
            let by_detail = drill.revenue_by_detail.top_n(drill.revenue_by_detail.len(), false);
            let by_day = drill.quantity_by_weekday.in_key_order();
            ui.columns(2, |cols| {
                tables::summary_table(&mut cols[0], "drill_detail", ("Product Detail", "Revenue"), &by_detail, money);
                tables::summary_table(&mut cols[1], "drill_weekday", ("Weekday", "Quantity"), &by_day, |v| format!("{v:.0}"));
            });
            plot::bar_chart(ui, "drill_chart", &by_detail, true);
        }
        ui.separator();
    }

    if let Some(view) = &state.view {
        egui::CollapsingHeader::new("📄 View Filtered Raw Data")
            .default_open(false)
            .show(ui, |ui: &mut Ui| tables::raw_rows(ui, view));
    }
}
