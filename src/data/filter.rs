use std::collections::BTreeSet;
use std::fmt;

use super::model::{Column, Table, Value};

/// Label of the "no constraint" entry in every select box.
pub const ALL: &str = "All";

// ---------------------------------------------------------------------------
// Choice: one select box
// ---------------------------------------------------------------------------

/// A single equality constraint, or none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Choice {
    #[default]
    All,
    Only(String),
}

impl Choice {
    /// Map a select-box label to a choice; `"All"` means unconstrained.
    pub fn from_label(label: &str) -> Self {
        if label == ALL {
            Choice::All
        } else {
            Choice::Only(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Choice::All => ALL,
            Choice::Only(v) => v,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }

    /// Select-box contents: `"All"` followed by the sorted distinct values.
    pub fn options(values: &BTreeSet<Value>) -> Vec<Choice> {
        std::iter::once(Choice::All)
            .chain(values.iter().map(|v| Choice::Only(v.to_string())))
            .collect()
    }

    fn admits(&self, cell: Option<&str>) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(wanted) => cell == Some(wanted.as_str()),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// FilterSelection: the three sidebar selects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub location: Choice,
    pub category: Choice,
    pub month: Choice,
}

impl FilterSelection {
    pub fn new(location: &str, category: &str, month: &str) -> Self {
        FilterSelection {
            location: Choice::from_label(location),
            category: Choice::from_label(category),
            month: Choice::from_label(month),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.location.is_all() && self.category.is_all() && self.month.is_all()
    }

    fn constraints(&self) -> [(Column, &Choice); 3] {
        [
            (Column::StoreLocation, &self.location),
            (Column::ProductCategory, &self.category),
            (Column::Month, &self.month),
        ]
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Rows passing every non-`All` constraint (case-sensitive equality, AND).
///
/// Returns a new view in source order; `table` is untouched.
pub fn filter(table: &Table, selection: &FilterSelection) -> Table {
    if selection.is_unconstrained() {
        return table.clone();
    }
    let constraints = selection.constraints();
    let view = table.retain(|t| {
        constraints
            .iter()
            .all(|(col, choice)| choice.admits(t.text(*col)))
    });
    log::debug!(
        "filter {}/{}/{}: {} of {} rows",
        selection.location,
        selection.category,
        selection.month,
        view.len(),
        table.len()
    );
    view
}

/// Label-based form of [`filter`]: each argument is `"All"` or a value.
pub fn filter_by(table: &Table, location: &str, category: &str, month: &str) -> Table {
    filter(table, &FilterSelection::new(location, category, month))
}

/// Drill-down: rows whose `column` equals `value` exactly.
pub fn filter_eq(table: &Table, column: Column, value: &Value) -> Table {
    table.retain(|t| match (t.text(column), value) {
        (Some(cell), Value::Text(wanted)) => cell == wanted.as_str(),
        _ => t.get(column) == *value,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::Transaction;

    fn sample() -> Table {
        let rows = [
            (2, 8.0, "A", "Coffee", "May"),
            (1, 4.0, "B", "Tea", "May"),
            (3, 12.0, "A", "Coffee", "June"),
        ];
        Table::from_rows(
            rows.iter()
                .map(|&(qty, total, loc, cat, month)| Transaction {
                    transaction_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
                    transaction_qty: qty,
                    store_location: loc.to_string(),
                    product_category: cat.to_string(),
                    product_type: format!("{cat} type"),
                    product_detail: format!("{cat} detail"),
                    total_amount: total,
                    weekday: "Monday".to_string(),
                    month: month.to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn all_all_all_is_identity() {
        let table = sample();
        assert_eq!(filter_by(&table, ALL, ALL, ALL), table);
    }

    #[test]
    fn location_filter() {
        let table = sample();
        let view = filter_by(&table, "A", ALL, ALL);
        assert_eq!(view.len(), 2);
        assert_eq!(view.sum(Column::TotalAmount), Ok(20.0));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn constraints_are_conjunctive() {
        let table = sample();
        assert_eq!(filter_by(&table, "A", "Coffee", "June").source_indices(), &[2]);
        assert!(filter_by(&table, "B", "Coffee", ALL).is_empty());
    }

    #[test]
    fn equality_is_case_sensitive() {
        assert!(filter_by(&sample(), "a", ALL, ALL).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let table = sample();
        let selection = FilterSelection::new(ALL, "Coffee", "May");
        let once = filter(&table, &selection);
        assert_eq!(filter(&once, &selection), once);
    }

    #[test]
    fn drill_down_on_any_column() {
        let table = sample();
        let tea = filter_eq(&table, Column::ProductType, &Value::from("Tea type"));
        assert_eq!(tea.source_indices(), &[1]);
        let big = filter_eq(&table, Column::TransactionQty, &Value::Integer(3));
        assert_eq!(big.source_indices(), &[2]);
    }

    #[test]
    fn options_start_with_all() {
        let table = sample();
        let labels: Vec<String> = Choice::options(&table.distinct(Column::Month))
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(labels, vec!["All", "June", "May"]);
    }
}
