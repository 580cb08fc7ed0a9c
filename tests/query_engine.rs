//! End-to-end checks of the query engine against an in-memory sales export.

use coffee_dash::data::aggregate::{AggFn, Aggregate, aggregate, aggregate_by, pivot};
use coffee_dash::data::error::QueryError;
use coffee_dash::data::filter::{ALL, FilterSelection, filter, filter_by};
use coffee_dash::data::loader::read_csv;
use coffee_dash::data::model::{Column, Table, Value};

// ============================================================================
// FIXTURES
// ============================================================================

const SALES: &str = "\
transaction_id,transaction_date,transaction_time,transaction_qty,store_id,store_location,product_id,unit_price,product_category,product_type,product_detail,total_amount
1,2023-01-01,07:06:11,2,5,Lower Manhattan,32,3.0,Coffee,Gourmet brewed coffee,Ethiopia Rg,6.0
2,2023-01-01,07:08:56,1,5,Lower Manhattan,57,3.1,Tea,Brewed Chai tea,Spicy Eye Opener Chai Lg,3.1
3,2023-01-02,07:14:04,2,8,Hell's Kitchen,59,4.5,Drinking Chocolate,Hot chocolate,Dark chocolate Lg,9.0
4,2023-02-03,08:01:00,1,3,Astoria,22,2.0,Coffee,Drip coffee,Our Old Time Diner Blend Sm,2.0
5,2023-02-04,09:30:12,3,3,Astoria,77,3.0,Bakery,Scone,Oatmeal Scone,9.0
6,2023-03-05,10:45:00,1,8,Hell's Kitchen,32,3.0,Coffee,Gourmet brewed coffee,Ethiopia Rg,3.0
7,2023-03-06,11:15:30,2,5,Lower Manhattan,45,4.25,Coffee,Barista Espresso,Latte Rg,8.5
8,2023-03-07,12:00:00,1,3,Astoria,57,3.1,Tea,Brewed Chai tea,Spicy Eye Opener Chai Lg,3.1
";

fn sales() -> Table {
    read_csv(SALES.as_bytes()).expect("fixture parses")
}

fn selections() -> Vec<FilterSelection> {
    vec![
        FilterSelection::default(),
        FilterSelection::new("Astoria", ALL, ALL),
        FilterSelection::new(ALL, "Coffee", ALL),
        FilterSelection::new(ALL, ALL, "March"),
        FilterSelection::new("Lower Manhattan", "Coffee", "January"),
        FilterSelection::new("Astoria", "Drinking Chocolate", ALL),
    ]
}

fn text(s: &str) -> Value {
    Value::from(s)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ============================================================================
// FILTER PROPERTIES
// ============================================================================

#[test]
fn test_filter_is_a_subset_and_idempotent() {
    let table = sales();
    for selection in selections() {
        let view = filter(&table, &selection);
        let source: Vec<_> = table.rows().collect();
        for (row, &idx) in view.rows().zip(view.source_indices()) {
            assert_eq!(row, source[idx]);
        }
        assert!(view.source_indices().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(filter(&view, &selection), view, "{selection:?}");
    }
}

#[test]
fn test_unconstrained_filter_returns_every_row() {
    let table = sales();
    assert_eq!(filter_by(&table, ALL, ALL, ALL), table);
    assert_eq!(table.len(), 8);
}

#[test]
fn test_derived_month_drives_month_filter() {
    let table = sales();
    let march = filter_by(&table, ALL, ALL, "March");
    assert_eq!(march.len(), 3);
    assert!(march.rows().all(|t| t.month == "March"));
}

// ============================================================================
// AGGREGATION PROPERTIES
// ============================================================================

#[test]
fn test_partition_sums_conserve_revenue() {
    let table = sales();
    let whole = table.sum(Column::TotalAmount).unwrap();
    for column in Column::CATEGORICAL {
        let summary = aggregate(&table, column, Column::TotalAmount, AggFn::Sum).unwrap();
        assert!(close(summary.total(), whole), "{column}");
    }
}

#[test]
fn test_counts_sum_to_row_count() {
    let table = sales();
    for selection in selections() {
        let view = filter(&table, &selection);
        for column in Column::CATEGORICAL {
            let counts = aggregate(&view, column, Column::TotalAmount, AggFn::Count).unwrap();
            assert_eq!(counts.total() as usize, view.len());
        }
    }
}

#[test]
fn test_top_n_full_length_is_sorted_descending() {
    let table = sales();
    let summary = aggregate(&table, Column::ProductType, Column::TotalAmount, AggFn::Sum).unwrap();
    let ranked = summary.top_n(summary.len(), false);
    assert_eq!(ranked.len(), summary.len());
    for pair in ranked.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.1 > b.1 || (a.1 == b.1 && a.0 < b.0), "{a:?} before {b:?}");
    }
    // Gourmet brewed coffee, Hot chocolate and Scone all total 9.0
    assert_eq!(ranked[0], (text("Gourmet brewed coffee"), 9.0));
    assert_eq!(ranked[1], (text("Hot chocolate"), 9.0));
    assert_eq!(summary.top_n(100, false).len(), summary.len());
}

#[test]
fn test_pivot_margins_match_single_key_aggregates() {
    let table = sales();
    for agg in [AggFn::Sum, AggFn::Mean, AggFn::Count] {
        let p = pivot(&table, Column::ProductCategory, Column::StoreLocation, Column::TotalAmount, agg, true).unwrap();
        let by_category = aggregate(&table, Column::ProductCategory, Column::TotalAmount, agg).unwrap();
        let by_location = aggregate(&table, Column::StoreLocation, Column::TotalAmount, agg).unwrap();
        for (key, value) in by_category.iter() {
            assert_eq!(p.row_total(key), Some(value));
        }
        for (key, value) in by_location.iter() {
            assert_eq!(p.column_total(key), Some(value));
        }
    }
}

#[test]
fn test_pivot_cells_sum_to_grand_total() {
    let table = sales();
    let p = pivot(&table, Column::Month, Column::StoreLocation, Column::TotalAmount, AggFn::Sum, true).unwrap();
    let cells: f64 = p
        .row_keys
        .iter()
        .flat_map(|r| p.column_keys.iter().map(move |c| (r, c)))
        .map(|(r, c)| p.cell(r, c))
        .sum();
    assert!(close(cells, p.grand_total().unwrap()));
    assert_eq!(p.cell(&text("January"), &text("Astoria")), 0.0);
}

// ============================================================================
// EMPTY VIEWS AND BAD REQUESTS
// ============================================================================

#[test]
fn test_empty_view_aggregates() {
    let empty = filter_by(&sales(), "Astoria", "Drinking Chocolate", ALL);
    assert!(empty.is_empty());

    let sum = aggregate(&empty, Column::Month, Column::TotalAmount, AggFn::Sum).unwrap();
    assert!(sum.is_empty());
    let count = aggregate(&empty, Column::Month, Column::TotalAmount, AggFn::Count).unwrap();
    assert!(count.is_empty());
    assert_eq!(
        aggregate(&empty, Column::Weekday, Column::TotalAmount, AggFn::Mean),
        Err(QueryError::EmptyAggregation)
    );
    assert_eq!(sum.extrema(), Err(QueryError::EmptyAggregation));
}

#[test]
fn test_unknown_columns_are_rejected() {
    let table = sales();
    assert_eq!(
        aggregate_by(&table, &["store"], "total_amount", AggFn::Sum, false),
        Err(QueryError::InvalidColumn("store".to_string()))
    );
    assert_eq!(
        aggregate_by(&table, &["month"], "unit_price", AggFn::Sum, false),
        Err(QueryError::InvalidColumn("unit_price".to_string()))
    );
    assert!(matches!(
        aggregate_by(&table, &["month", "weekday", "store_location"], "total_amount", AggFn::Sum, false),
        Err(QueryError::InvalidColumn(_))
    ));
}

// ============================================================================
// WORKED SCENARIO
// ============================================================================

#[test]
fn test_three_row_scenario() {
    let csv = "\
transaction_date,transaction_qty,store_location,product_category,product_type,product_detail,total_amount
2023-05-01,2,A,Coffee,Latte,Latte Rg,8.0
2023-05-02,1,B,Tea,Chai,Chai Rg,4.0
2023-06-01,3,A,Coffee,Latte,Latte Rg,12.0
";
    let table = read_csv(csv.as_bytes()).unwrap();

    let only_a = filter_by(&table, "A", ALL, ALL);
    assert_eq!(only_a.len(), 2);
    assert_eq!(only_a.sum(Column::TotalAmount), Ok(20.0));

    let Ok(Aggregate::Summary(monthly)) =
        aggregate_by(&table, &["month"], "total_amount", AggFn::Sum, false)
    else {
        panic!("expected a one-key summary");
    };
    assert_eq!(monthly.get(&text("May")), Some(12.0));
    assert_eq!(monthly.get(&text("June")), Some(12.0));
    assert_eq!(monthly.top_n(1, false), vec![(text("June"), 12.0)]);
}
