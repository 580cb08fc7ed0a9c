use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;

use super::error::{QueryError, QueryResult};

// ---------------------------------------------------------------------------
// Column – the fixed schema of a transaction table
// ---------------------------------------------------------------------------

/// Every column a loaded [`Table`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    TransactionDate,
    TransactionQty,
    StoreLocation,
    ProductCategory,
    ProductType,
    ProductDetail,
    TotalAmount,
    Weekday,
    Month,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::TransactionDate,
        Column::TransactionQty,
        Column::StoreLocation,
        Column::ProductCategory,
        Column::ProductType,
        Column::ProductDetail,
        Column::TotalAmount,
        Column::Weekday,
        Column::Month,
    ];

    /// Text columns usable as select-box dimensions and pivot axes.
    pub const CATEGORICAL: [Column; 6] = [
        Column::StoreLocation,
        Column::ProductCategory,
        Column::ProductType,
        Column::ProductDetail,
        Column::Weekday,
        Column::Month,
    ];

    /// Header name as it appears in the source file.
    pub fn name(self) -> &'static str {
        match self {
            Column::TransactionDate => "transaction_date",
            Column::TransactionQty => "transaction_qty",
            Column::StoreLocation => "store_location",
            Column::ProductCategory => "product_category",
            Column::ProductType => "product_type",
            Column::ProductDetail => "product_detail",
            Column::TotalAmount => "total_amount",
            Column::Weekday => "weekday",
            Column::Month => "month",
        }
    }

    /// Human-readable label for tables and axis titles.
    pub fn label(self) -> &'static str {
        match self {
            Column::TransactionDate => "Date",
            Column::TransactionQty => "Quantity",
            Column::StoreLocation => "Store Location",
            Column::ProductCategory => "Product Category",
            Column::ProductType => "Product Type",
            Column::ProductDetail => "Product Detail",
            Column::TotalAmount => "Revenue",
            Column::Weekday => "Weekday",
            Column::Month => "Month",
        }
    }

    /// Look a column up by its header name.
    pub fn parse(name: &str) -> QueryResult<Column> {
        Column::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| QueryError::InvalidColumn(name.to_string()))
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Column::TransactionQty | Column::TotalAmount)
    }
}

impl FromStr for Column {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::parse(s)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Value – a single typed cell
// ---------------------------------------------------------------------------

/// A typed cell value. Summaries key `BTreeMap`s by `Value`, so it must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn rank(v: &Value) -> u8 {
            match v {
                Integer(_) => 0,
                Decimal(_) => 1,
                Date(_) => 2,
                Text(_) => 3,
            }
        }
        match (self, other) {
            (Text(a), Text(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Decimal(a), Decimal(b)) => a.total_cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Decimal(f) => f.to_bits().hash(state),
            Value::Date(d) => d.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Decimal(v) => write!(f, "{v:.2}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Decimal(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Calendar names
// ---------------------------------------------------------------------------

pub const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August",
    "September", "October", "November", "December",
];

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

/// Calendar position of a month or weekday name, for chronological displays.
pub fn calendar_rank(column: Column, name: &str) -> Option<usize> {
    let names: &[&str] = match column {
        Column::Month => &MONTH_NAMES,
        Column::Weekday => &WEEKDAY_NAMES,
        _ => return None,
    };
    names.iter().position(|n| *n == name)
}

// ---------------------------------------------------------------------------
// Transaction – one sale line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub transaction_date: NaiveDate,
    pub transaction_qty: i64,
    pub store_location: String,
    pub product_category: String,
    pub product_type: String,
    pub product_detail: String,
    pub total_amount: f64,
    pub weekday: String,
    pub month: String,
}

impl Transaction {
    pub fn get(&self, column: Column) -> Value {
        match column {
            Column::TransactionDate => Value::Date(self.transaction_date),
            Column::TransactionQty => Value::Integer(self.transaction_qty),
            Column::StoreLocation => Value::Text(self.store_location.clone()),
            Column::ProductCategory => Value::Text(self.product_category.clone()),
            Column::ProductType => Value::Text(self.product_type.clone()),
            Column::ProductDetail => Value::Text(self.product_detail.clone()),
            Column::TotalAmount => Value::Decimal(self.total_amount),
            Column::Weekday => Value::Text(self.weekday.clone()),
            Column::Month => Value::Text(self.month.clone()),
        }
    }

    /// Borrow a text column without allocating. `None` for non-text columns.
    pub fn text(&self, column: Column) -> Option<&str> {
        match column {
            Column::StoreLocation => Some(&self.store_location),
            Column::ProductCategory => Some(&self.product_category),
            Column::ProductType => Some(&self.product_type),
            Column::ProductDetail => Some(&self.product_detail),
            Column::Weekday => Some(&self.weekday),
            Column::Month => Some(&self.month),
            _ => None,
        }
    }

    pub fn numeric(&self, column: Column) -> Option<f64> {
        match column {
            Column::TransactionQty => Some(self.transaction_qty as f64),
            Column::TotalAmount => Some(self.total_amount),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Table – an immutable view over the loaded transactions
// ---------------------------------------------------------------------------

/// Shared rows plus the ordered indices that make up this view.
///
/// Cloning is cheap; every filter returns a new `Table` over the same rows.
#[derive(Debug, Clone)]
pub struct Table {
    rows: Arc<Vec<Transaction>>,
    indices: Vec<usize>,
}

impl Table {
    pub fn from_rows(rows: Vec<Transaction>) -> Self {
        let indices = (0..rows.len()).collect();
        Table {
            rows: Arc::new(rows),
            indices,
        }
    }

    /// Number of rows in this view.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Rows of this view in source order.
    pub fn rows(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.indices.iter().map(|&i| &self.rows[i])
    }

    /// Positions of this view's rows in the originally loaded table.
    pub fn source_indices(&self) -> &[usize] {
        &self.indices
    }

    /// Keep the rows matching `predicate`, preserving order.
    pub fn retain<F>(&self, predicate: F) -> Table
    where
        F: Fn(&Transaction) -> bool,
    {
        let indices = self
            .indices
            .iter()
            .copied()
            .filter(|&i| predicate(&self.rows[i]))
            .collect();
        Table {
            rows: Arc::clone(&self.rows),
            indices,
        }
    }

    /// Sorted distinct values observed in `column`.
    pub fn distinct(&self, column: Column) -> BTreeSet<Value> {
        self.rows().map(|t| t.get(column)).collect()
    }

    pub fn sum(&self, column: Column) -> QueryResult<f64> {
        if !column.is_numeric() {
            return Err(QueryError::NotNumeric(column.name().to_string()));
        }
        Ok(self.rows().filter_map(|t| t.numeric(column)).sum())
    }

    /// Mean of a numeric column; `EmptyAggregation` when the view has no rows.
    pub fn mean(&self, column: Column) -> QueryResult<f64> {
        let total = self.sum(column)?;
        if self.is_empty() {
            return Err(QueryError::EmptyAggregation);
        }
        Ok(total / self.len() as f64)
    }
}

/// Two views are equal when they hold the same rows in the same order.
impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.rows().eq(other.rows())
    }
}
