use std::io::Read;
use std::path::Path;

use arrow::array::Array;
use arrow::util::display::array_value_to_string;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::error::{LoadError, LoadResult};
use super::model::{Column, MONTH_NAMES, Table, Transaction, WEEKDAY_NAMES};

/// Columns every source must provide. `weekday` is optional and `month` is
/// always derived.
pub const REQUIRED_COLUMNS: [Column; 7] = [
    Column::TransactionDate,
    Column::TransactionQty,
    Column::StoreLocation,
    Column::ProductCategory,
    Column::ProductType,
    Column::ProductDetail,
    Column::TotalAmount,
];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y", "%Y/%m/%d", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the transaction table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one sale line per record (the usual export)
/// * `.json`    – `[{ "transaction_date": "2023-01-01", ... }, ...]`
/// * `.parquet` – flat columns named like the CSV headers
pub fn load_file(path: &Path) -> LoadResult<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => read_csv(std::fs::File::open(path)?)?,
        "json" => read_json(std::fs::File::open(path)?)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} transactions from {} ({} stores)",
        table.len(),
        path.display(),
        table.distinct(Column::StoreLocation).len()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Raw record: text fields before type coercion
// ---------------------------------------------------------------------------

/// One source row with every field still as text. All three readers funnel
/// through this so coercion rules live in one place.
#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    transaction_date: String,
    transaction_qty: String,
    store_location: String,
    product_category: String,
    product_type: String,
    product_detail: String,
    total_amount: String,
    #[serde(default)]
    weekday: Option<String>,
}

impl RawRecord {
    /// `row` is the 1-based data row used in error messages.
    fn into_transaction(self, row: usize) -> LoadResult<Transaction> {
        let date = parse_date(&self.transaction_date).ok_or_else(|| LoadError::BadDate {
            row,
            value: self.transaction_date.clone(),
        })?;
        let qty = parse_quantity(&self.transaction_qty).ok_or_else(|| LoadError::BadValue {
            row,
            column: Column::TransactionQty.name().to_string(),
            value: self.transaction_qty.clone(),
        })?;
        let total = self
            .total_amount
            .trim()
            .parse::<f64>()
            .map_err(|_| LoadError::BadValue {
                row,
                column: Column::TotalAmount.name().to_string(),
                value: self.total_amount.clone(),
            })?;

        let weekday = match self.weekday {
            Some(w) if !w.trim().is_empty() => w,
            _ => weekday_name(date.weekday()).to_string(),
        };

        Ok(Transaction {
            transaction_date: date,
            transaction_qty: qty,
            store_location: self.store_location,
            product_category: self.product_category,
            product_type: self.product_type,
            product_detail: self.product_detail,
            total_amount: total,
            weekday,
            month: MONTH_NAMES[date.month0() as usize].to_string(),
        })
    }

    fn set(&mut self, header: &str, value: String) {
        match header {
            "transaction_date" => self.transaction_date = value,
            "transaction_qty" => self.transaction_qty = value,
            "store_location" => self.store_location = value,
            "product_category" => self.product_category = value,
            "product_type" => self.product_type = value,
            "product_detail" => self.product_detail = value,
            "total_amount" => self.total_amount = value,
            "weekday" => self.weekday = Some(value),
            _ => {}
        }
    }
}

fn check_required(headers: &[&str]) -> LoadResult<()> {
    for col in REQUIRED_COLUMNS {
        if !headers.contains(&col.name()) {
            return Err(LoadError::MissingColumn(col.name().to_string()));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

/// Parse a date in any of the accepted layouts. A time part, with or without
/// fractional seconds, is dropped.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Quantities are integers, but some exports write them as `2.0`.
fn parse_quantity(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(i);
    }
    let f = text.parse::<f64>().ok()?;
    (f.fract() == 0.0 && f.is_finite()).then_some(f as i64)
}

pub fn weekday_name(day: Weekday) -> &'static str {
    WEEKDAY_NAMES[day.num_days_from_monday() as usize]
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read a CSV with a header row. Extra columns are ignored.
pub fn read_csv<R: Read>(source: R) -> LoadResult<Table> {
    let mut reader = csv::Reader::from_reader(source);
    let headers = reader.headers()?.clone();
    check_required(&headers.iter().collect::<Vec<_>>())?;

    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<RawRecord>().enumerate() {
        let raw = result?;
        rows.push(raw.into_transaction(i + 1)?);
    }
    Ok(Table::from_rows(rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "transaction_date": "2023-01-01",
///     "transaction_qty": 2,
///     "store_location": "Lower Manhattan",
///     "total_amount": 6.0,
///     ...
///   },
///   ...
/// ]
/// ```
pub fn read_json<R: Read>(source: R) -> LoadResult<Table> {
    let root: JsonValue = serde_json::from_reader(source)?;
    let records = root.as_array().ok_or(LoadError::NotRecords)?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or(LoadError::NotRecords)?;
        check_required(&obj.keys().map(String::as_str).collect::<Vec<_>>())?;

        let mut raw = RawRecord::default();
        for (key, val) in obj {
            let text = if key == Column::TransactionDate.name() {
                json_date_text(val)
            } else {
                json_to_text(val)
            };
            if let Some(text) = text {
                raw.set(key, text);
            }
        }
        rows.push(raw.into_transaction(i + 1)?);
    }
    Ok(Table::from_rows(rows))
}

/// pandas writes datetime columns as epoch milliseconds unless told
/// otherwise; integers are read that way, anything else as text.
fn json_date_text(val: &JsonValue) -> Option<String> {
    match val.as_i64().and_then(DateTime::from_timestamp_millis) {
        Some(dt) => Some(dt.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string()),
        None => json_to_text(val),
    }
}

fn json_to_text(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null => None,
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// Column types are not prescribed: every cell is rendered to text with
/// Arrow's display formatter and coerced like a CSV field, so `Date32`,
/// timestamps, integer or float quantities all work.
fn load_parquet(path: &Path) -> LoadResult<Table> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    // Checked on the file schema so a file without rows still fails.
    let names: Vec<&str> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect();
    check_required(&names)?;
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let mut raw = RawRecord::default();
            for (field, col) in schema.fields().iter().zip(batch.columns()) {
                if col.is_null(row) {
                    continue;
                }
                raw.set(field.name(), array_value_to_string(col.as_ref(), row)?);
            }
            let row_no = rows.len() + 1;
            rows.push(raw.into_transaction(row_no)?);
        }
    }
    Ok(Table::from_rows(rows))
}
