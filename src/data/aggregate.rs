use std::collections::BTreeMap;
use std::fmt;

use super::error::{QueryError, QueryResult};
use super::model::{Column, Table, Transaction, Value, calendar_rank};

/// Label of pivot margin rows and columns.
pub const MARGIN_LABEL: &str = "All";

// ---------------------------------------------------------------------------
// Aggregation functions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggFn {
    Sum,
    Mean,
    /// Rows per partition; the value column is ignored.
    Count,
}

impl fmt::Display for AggFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AggFn::Sum => "sum",
            AggFn::Mean => "mean",
            AggFn::Count => "count",
        })
    }
}

/// Running sum and row count of one partition.
#[derive(Debug, Default, Clone, Copy)]
struct Acc {
    sum: f64,
    count: usize,
}

impl Acc {
    fn push(&mut self, t: &Transaction, value_column: Column) {
        self.sum += t.numeric(value_column).unwrap_or(0.0);
        self.count += 1;
    }

    /// Partitions are never empty, so `Mean` never divides by zero here.
    fn finish(self, agg: AggFn) -> f64 {
        match agg {
            AggFn::Sum => self.sum,
            AggFn::Mean => self.sum / self.count as f64,
            AggFn::Count => self.count as f64,
        }
    }
}

fn check_request(table: &Table, value_column: Column, agg: AggFn) -> QueryResult<()> {
    if agg != AggFn::Count && !value_column.is_numeric() {
        return Err(QueryError::NotNumeric(value_column.name().to_string()));
    }
    if agg == AggFn::Mean && table.is_empty() {
        return Err(QueryError::EmptyAggregation);
    }
    Ok(())
}

fn partition(table: &Table, key: Column, value_column: Column) -> BTreeMap<Value, Acc> {
    let mut parts: BTreeMap<Value, Acc> = BTreeMap::new();
    for t in table.rows() {
        parts.entry(t.get(key)).or_default().push(t, value_column);
    }
    parts
}

// ---------------------------------------------------------------------------
// Summary: one grouping key
// ---------------------------------------------------------------------------

/// Aggregated value per distinct key. Iterates in key order.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub group_by: Column,
    pub value_column: Column,
    pub agg: AggFn,
    entries: BTreeMap<Value, f64>,
}

impl Summary {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<f64> {
        self.entries.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, f64)> + '_ {
        self.entries.iter().map(|(k, v)| (k, *v))
    }

    /// Sum of all entries.
    pub fn total(&self) -> f64 {
        self.entries.values().sum()
    }

    /// The first `n` entries ranked by value. Ties go to the smaller key in
    /// both directions, so the ranking is deterministic.
    pub fn top_n(&self, n: usize, ascending: bool) -> Vec<(Value, f64)> {
        let mut ranked: Vec<(Value, f64)> =
            self.entries.iter().map(|(k, v)| (k.clone(), *v)).collect();
        ranked.sort_by(|a, b| {
            let by_value = if ascending {
                a.1.total_cmp(&b.1)
            } else {
                b.1.total_cmp(&a.1)
            };
            by_value.then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(n);
        ranked
    }

    /// Keys of the largest and smallest values, `(key_max, key_min)`.
    pub fn extrema(&self) -> QueryResult<(Value, Value)> {
        let max = self.top_n(1, false).into_iter().next();
        let min = self.top_n(1, true).into_iter().next();
        match (max, min) {
            (Some((k_max, _)), Some((k_min, _))) => Ok((k_max, k_min)),
            _ => Err(QueryError::EmptyAggregation),
        }
    }

    /// Entries in calendar order for month and weekday keys, key order
    /// otherwise. Names outside the calendar sort last.
    pub fn in_key_order(&self) -> Vec<(Value, f64)> {
        let mut entries: Vec<(Value, f64)> =
            self.entries.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let column = self.group_by;
        let rank = |v: &Value| {
            v.as_text()
                .and_then(|s| calendar_rank(column, s))
                .unwrap_or(usize::MAX)
        };
        entries.sort_by(|a, b| rank(&a.0).cmp(&rank(&b.0)).then_with(|| a.0.cmp(&b.0)));
        entries
    }
}

/// Group `table` by `group_by` and apply `agg` to `value_column` per group.
///
/// An empty table yields an empty summary for `Sum`/`Count` and
/// `EmptyAggregation` for `Mean`.
pub fn aggregate(
    table: &Table,
    group_by: Column,
    value_column: Column,
    agg: AggFn,
) -> QueryResult<Summary> {
    check_request(table, value_column, agg)?;
    let entries: BTreeMap<Value, f64> = partition(table, group_by, value_column)
        .into_iter()
        .map(|(k, acc)| (k, acc.finish(agg)))
        .collect();
    log::debug!(
        "{agg}({value_column}) by {group_by}: {} groups over {} rows",
        entries.len(),
        table.len()
    );
    Ok(Summary {
        group_by,
        value_column,
        agg,
        entries,
    })
}

// ---------------------------------------------------------------------------
// Pivot: two grouping keys
// ---------------------------------------------------------------------------

/// Grand totals of a pivot, each computed over the underlying rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Margins {
    /// Aggregate of each row key across every column.
    pub row_totals: BTreeMap<Value, f64>,
    /// Aggregate of each column key across every row.
    pub column_totals: BTreeMap<Value, f64>,
    pub grand_total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pivot {
    pub rows: Column,
    pub columns: Column,
    pub value_column: Column,
    pub agg: AggFn,
    pub row_keys: Vec<Value>,
    pub column_keys: Vec<Value>,
    cells: BTreeMap<Value, BTreeMap<Value, f64>>,
    pub margins: Option<Margins>,
}

impl Pivot {
    /// Cell value; combinations with no rows read as 0.
    pub fn cell(&self, row: &Value, column: &Value) -> f64 {
        self.cells
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn row_total(&self, row: &Value) -> Option<f64> {
        self.margins.as_ref()?.row_totals.get(row).copied()
    }

    pub fn column_total(&self, column: &Value) -> Option<f64> {
        self.margins.as_ref()?.column_totals.get(column).copied()
    }

    pub fn grand_total(&self) -> Option<f64> {
        self.margins.as_ref().map(|m| m.grand_total)
    }

    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty()
    }
}

/// Cross-tabulate `rows` × `columns`, applying `agg` to `value_column`.
///
/// With `margins`, row totals, column totals and the grand total are
/// aggregated from the rows themselves, so a `Mean` margin is the mean over
/// the collapsed rows and equals the one-key [`aggregate`] result.
pub fn pivot(
    table: &Table,
    rows: Column,
    columns: Column,
    value_column: Column,
    agg: AggFn,
    margins: bool,
) -> QueryResult<Pivot> {
    check_request(table, value_column, agg)?;

    let mut parts: BTreeMap<(Value, Value), Acc> = BTreeMap::new();
    for t in table.rows() {
        parts
            .entry((t.get(rows), t.get(columns)))
            .or_default()
            .push(t, value_column);
    }

    let row_keys = table.distinct(rows).into_iter().collect();
    let column_keys = table.distinct(columns).into_iter().collect();
    let mut cells: BTreeMap<Value, BTreeMap<Value, f64>> = BTreeMap::new();
    for ((r, c), acc) in parts {
        cells.entry(r).or_default().insert(c, acc.finish(agg));
    }

    let margins = margins.then(|| {
        let totals = |key: Column| -> BTreeMap<Value, f64> {
            partition(table, key, value_column)
                .into_iter()
                .map(|(k, acc)| (k, acc.finish(agg)))
                .collect()
        };
        let mut all = Acc::default();
        for t in table.rows() {
            all.push(t, value_column);
        }
        Margins {
            row_totals: totals(rows),
            column_totals: totals(columns),
            grand_total: if all.count == 0 { 0.0 } else { all.finish(agg) },
        }
    });

    Ok(Pivot {
        rows,
        columns,
        value_column,
        agg,
        row_keys,
        column_keys,
        cells,
        margins,
    })
}

// ---------------------------------------------------------------------------
// Name-based entry point
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    Summary(Summary),
    Pivot(Pivot),
}

/// Aggregate by one or two column names. Unknown names, or a key count other
/// than one or two, are `InvalidColumn`. `margins` only applies to pivots.
pub fn aggregate_by(
    table: &Table,
    group_by: &[&str],
    value_column: &str,
    agg: AggFn,
    margins: bool,
) -> QueryResult<Aggregate> {
    let value_column = Column::parse(value_column)?;
    match group_by {
        [key] => aggregate(table, Column::parse(key)?, value_column, agg).map(Aggregate::Summary),
        [rows, cols] => pivot(
            table,
            Column::parse(rows)?,
            Column::parse(cols)?,
            value_column,
            agg,
            margins,
        )
        .map(Aggregate::Pivot),
        other => Err(QueryError::InvalidColumn(other.join(", "))),
    }
}

// ---------------------------------------------------------------------------
// Headline metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kpis {
    pub total_revenue: f64,
    pub transactions: usize,
    pub quantity: i64,
    /// Mean `total_amount` per row; `None` when the view is empty.
    pub avg_bill: Option<f64>,
}

impl Kpis {
    pub fn compute(table: &Table) -> Self {
        let total_revenue: f64 = table.rows().map(|t| t.total_amount).sum();
        let quantity = table.rows().map(|t| t.transaction_qty).sum();
        let transactions = table.len();
        Kpis {
            total_revenue,
            transactions,
            quantity,
            avg_bill: (transactions > 0).then(|| total_revenue / transactions as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn sample() -> Table {
        let rows = [
            (2, 8.0, "A", "Coffee", "May", "Monday"),
            (1, 4.0, "B", "Tea", "May", "Tuesday"),
            (3, 12.0, "A", "Coffee", "June", "Monday"),
        ];
        Table::from_rows(
            rows.iter()
                .map(|&(qty, total, loc, cat, month, day)| Transaction {
                    transaction_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
                    transaction_qty: qty,
                    store_location: loc.to_string(),
                    product_category: cat.to_string(),
                    product_type: cat.to_string(),
                    product_detail: cat.to_string(),
                    total_amount: total,
                    weekday: day.to_string(),
                    month: month.to_string(),
                })
                .collect(),
        )
    }

    fn text(s: &str) -> Value {
        Value::from(s)
    }

    #[test]
    fn monthly_sum() {
        let s = aggregate(&sample(), Column::Month, Column::TotalAmount, AggFn::Sum).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(&text("May")), Some(12.0));
        assert_eq!(s.get(&text("June")), Some(12.0));
    }

    #[test]
    fn top_n_breaks_ties_by_ascending_key() {
        let s = aggregate(&sample(), Column::Month, Column::TotalAmount, AggFn::Sum).unwrap();
        assert_eq!(s.top_n(1, false), vec![(text("June"), 12.0)]);
        assert_eq!(s.top_n(1, true), vec![(text("June"), 12.0)]);
        assert_eq!(s.top_n(10, false).len(), 2);
    }

    #[test]
    fn mean_and_count() {
        let table = sample();
        let mean = aggregate(&table, Column::StoreLocation, Column::TotalAmount, AggFn::Mean).unwrap();
        assert_eq!(mean.get(&text("A")), Some(10.0));
        let count = aggregate(&table, Column::StoreLocation, Column::Weekday, AggFn::Count).unwrap();
        assert_eq!(count.get(&text("A")), Some(2.0));
        assert_eq!(count.total(), 3.0);
    }

    #[test]
    fn non_numeric_value_column_is_rejected() {
        let err = aggregate(&sample(), Column::Month, Column::StoreLocation, AggFn::Sum).unwrap_err();
        assert_eq!(err, QueryError::NotNumeric("store_location".to_string()));
    }

    #[test]
    fn empty_table_behaviour() {
        let empty = sample().retain(|_| false);
        let sum = aggregate(&empty, Column::Month, Column::TotalAmount, AggFn::Sum).unwrap();
        assert!(sum.is_empty());
        assert_eq!(sum.extrema(), Err(QueryError::EmptyAggregation));
        assert_eq!(
            aggregate(&empty, Column::Month, Column::TotalAmount, AggFn::Mean),
            Err(QueryError::EmptyAggregation)
        );
        let p = pivot(&empty, Column::ProductCategory, Column::StoreLocation, Column::TotalAmount, AggFn::Sum, true).unwrap();
        assert!(p.is_empty());
        assert_eq!(p.grand_total(), Some(0.0));
    }

    #[test]
    fn extrema_picks_max_and_min_keys() {
        let s = aggregate(&sample(), Column::Weekday, Column::TotalAmount, AggFn::Mean).unwrap();
        assert_eq!(s.extrema(), Ok((text("Monday"), text("Tuesday"))));
    }

    #[test]
    fn pivot_fills_missing_cells_with_zero() {
        let p = pivot(&sample(), Column::ProductCategory, Column::StoreLocation, Column::TotalAmount, AggFn::Sum, false).unwrap();
        assert_eq!(p.row_keys, vec![text("Coffee"), text("Tea")]);
        assert_eq!(p.column_keys, vec![text("A"), text("B")]);
        assert_eq!(p.cell(&text("Coffee"), &text("A")), 20.0);
        assert_eq!(p.cell(&text("Coffee"), &text("B")), 0.0);
        assert_eq!(p.grand_total(), None);
    }

    #[test]
    fn mean_margins_are_not_means_of_means() {
        let table = sample();
        let p = pivot(&table, Column::StoreLocation, Column::Month, Column::TotalAmount, AggFn::Mean, true).unwrap();
        let by_month = aggregate(&table, Column::Month, Column::TotalAmount, AggFn::Mean).unwrap();
        assert_eq!(p.column_total(&text("May")), by_month.get(&text("May")));
        assert_eq!(p.column_total(&text("May")), Some(6.0));
        assert_eq!(p.grand_total(), Some(8.0));
    }

    #[test]
    fn calendar_order_for_months() {
        let s = aggregate(&sample(), Column::Month, Column::TotalAmount, AggFn::Sum).unwrap();
        let keys: Vec<Value> = s.in_key_order().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![text("May"), text("June")]);
        let alphabetical: Vec<&Value> = s.iter().map(|(k, _)| k).collect();
        assert_eq!(alphabetical, vec![&text("June"), &text("May")]);
    }

    #[test]
    fn aggregate_by_names() {
        let table = sample();
        assert!(matches!(
            aggregate_by(&table, &["month"], "total_amount", AggFn::Sum, false),
            Ok(Aggregate::Summary(_))
        ));
        assert!(matches!(
            aggregate_by(&table, &["product_category", "store_location"], "total_amount", AggFn::Sum, true),
            Ok(Aggregate::Pivot(_))
        ));
        assert_eq!(
            aggregate_by(&table, &["city"], "total_amount", AggFn::Sum, false),
            Err(QueryError::InvalidColumn("city".to_string()))
        );
        assert_eq!(
            aggregate_by(&table, &["month"], "price", AggFn::Sum, false),
            Err(QueryError::InvalidColumn("price".to_string()))
        );
        assert!(aggregate_by(&table, &[], "total_amount", AggFn::Sum, false).is_err());
    }

    #[test]
    fn kpis() {
        let k = Kpis::compute(&sample());
        assert_eq!(k.total_revenue, 24.0);
        assert_eq!(k.transactions, 3);
        assert_eq!(k.quantity, 6);
        assert_eq!(k.avg_bill, Some(8.0));
        assert_eq!(Kpis::compute(&sample().retain(|_| false)).avg_bill, None);
    }
}
