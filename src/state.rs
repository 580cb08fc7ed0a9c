use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::error::{LoadError, LoadResult};
use crate::data::filter::{Choice, FilterSelection, filter};
use crate::data::loader::load_file;
use crate::data::model::{Column, Table, Value, calendar_rank};
use crate::data::report::{Report, ReportOptions};

// ---------------------------------------------------------------------------
// Table cache
// ---------------------------------------------------------------------------

/// The transaction table, read from `path` on first access and kept for the
/// rest of the process. Every query borrows it from here.
///
/// The outcome of that first read is kept either way: a failed load is not
/// retried.
#[derive(Debug)]
pub struct TableCache {
    path: PathBuf,
    loaded: OnceLock<LoadResult<Table>>,
}

impl TableCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: OnceLock::new(),
        }
    }

    /// A cache that already holds `table`; `path` is only informational.
    pub fn preloaded(path: impl Into<PathBuf>, table: Table) -> Self {
        let cache = Self::new(path);
        let _ = cache.loaded.set(Ok(table));
        cache
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Result<&Table, &LoadError> {
        self.loaded.get_or_init(|| load_file(&self.path)).as_ref()
    }

    /// The table, if a load has already succeeded. Never touches the disk.
    pub fn loaded(&self) -> Option<&Table> {
        self.loaded.get().and_then(|r| r.as_ref().ok())
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Select-box contents, computed once from the full table.
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    pub locations: Vec<Choice>,
    pub categories: Vec<Choice>,
    pub months: Vec<Choice>,
    pub product_types: Vec<String>,
}

impl SelectOptions {
    fn from_table(table: &Table) -> Self {
        let mut months = table.distinct(Column::Month).into_iter().collect::<Vec<_>>();
        months.sort_by_key(|m| m.as_text().and_then(|s| calendar_rank(Column::Month, s)));

        SelectOptions {
            locations: Choice::options(&table.distinct(Column::StoreLocation)),
            categories: Choice::options(&table.distinct(Column::ProductCategory)),
            months: std::iter::once(Choice::All)
                .chain(months.iter().map(|m| Choice::Only(m.to_string())))
                .collect(),
            product_types: table
                .distinct(Column::ProductType)
                .iter()
                .map(Value::to_string)
                .collect(),
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    cache: TableCache,

    /// Sidebar filters.
    pub selection: FilterSelection,

    /// Pivot axes, drill-down choice and list sizes.
    pub report_options: ReportOptions,

    pub select_options: SelectOptions,

    /// Colour per store location, shared by every chart.
    pub color_map: Option<ColorMap>,

    /// Rows passing the current filters.
    pub view: Option<Table>,

    /// Summaries of `view`.
    pub report: Option<Report>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let cache = TableCache::new(config.data_path.clone());
        Self::with_cache(config, cache)
    }

    pub fn with_cache(config: DashboardConfig, cache: TableCache) -> Self {
        let report_options = ReportOptions {
            top_n: config.top_n,
            ..ReportOptions::default()
        };
        Self {
            config,
            cache,
            selection: FilterSelection::default(),
            report_options,
            select_options: SelectOptions::default(),
            color_map: None,
            view: None,
            report: None,
            status_message: None,
        }
    }

    /// Read the table (first call only), fill the select boxes and compute
    /// the unfiltered report.
    pub fn load(&mut self) {
        let table = match self.cache.get() {
            Ok(table) => table,
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", self.cache.path().display());
                self.status_message = Some(format!("Error: {e}"));
                return;
            }
        };
        self.select_options = SelectOptions::from_table(table);
        self.color_map = Some(ColorMap::new(
            Column::StoreLocation,
            &table.distinct(Column::StoreLocation),
        ));
        self.status_message = None;
        self.refresh();
    }

    /// Recompute the filtered view and every summary from the cached table.
    pub fn refresh(&mut self) {
        let Ok(table) = self.cache.get() else {
            return;
        };
        let view = filter(table, &self.selection);
        match Report::build(&view, &self.report_options) {
            Ok(report) => {
                log::info!("Selection matches {} of {} transactions", view.len(), table.len());
                self.report = Some(report);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to summarise selection: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.report = None;
            }
        }
        self.view = Some(view);
    }

    /// Change one of the sidebar filters.
    pub fn set_filter(&mut self, column: Column, choice: Choice) {
        let slot = match column {
            Column::StoreLocation => &mut self.selection.location,
            Column::ProductCategory => &mut self.selection.category,
            Column::Month => &mut self.selection.month,
            other => {
                log::warn!("No sidebar filter for column '{other}'");
                return;
            }
        };
        if *slot != choice {
            *slot = choice;
            self.refresh();
        }
    }

    pub fn set_pivot_axes(&mut self, rows: Column, columns: Column) {
        if rows == columns {
            return;
        }
        self.report_options.pivot_rows = rows;
        self.report_options.pivot_columns = columns;
        self.refresh();
    }

    pub fn set_drill_down(&mut self, product_type: Option<String>) {
        if self.report_options.drill_down != product_type {
            self.report_options.drill_down = product_type;
            self.refresh();
        }
    }

    pub fn reset_filters(&mut self) {
        self.selection = FilterSelection::default();
        self.refresh();
    }

    /// Size of the loaded table; `None` before a successful load.
    pub fn total_rows(&self) -> Option<usize> {
        self.cache.loaded().map(Table::len)
    }
}
