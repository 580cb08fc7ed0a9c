use super::aggregate::{AggFn, Kpis, Pivot, Summary, aggregate, pivot};
use super::error::{QueryError, QueryResult};
use super::filter::filter_eq;
use super::model::{Column, Table, Value};

/// What one dashboard recomputation should include.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    /// Length of the best/worst seller lists.
    pub top_n: usize,
    pub pivot_rows: Column,
    pub pivot_columns: Column,
    /// Product type to drill into, if any.
    pub drill_down: Option<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: 5,
            pivot_rows: Column::ProductCategory,
            pivot_columns: Column::StoreLocation,
            drill_down: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayInsight {
    /// Mean revenue per sale line, by weekday.
    pub averages: Summary,
    pub best_day: Value,
    pub worst_day: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrillDown {
    pub product_type: String,
    pub revenue_by_detail: Summary,
    pub quantity_by_weekday: Summary,
}

/// Everything the dashboard shows for one filtered view.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub kpis: Kpis,
    /// Revenue per month, largest first.
    pub monthly_sales: Vec<(Value, f64)>,
    /// Revenue per month in calendar order, for the trend chart.
    pub monthly_trend: Vec<(Value, f64)>,
    /// Revenue per product type, largest first.
    pub product_sales: Vec<(Value, f64)>,
    pub weekday: Option<WeekdayInsight>,
    pub pivot: Pivot,
    pub top_product: Option<Value>,
    pub top_category: Option<Value>,
    pub best_sellers: Vec<(Value, f64)>,
    pub worst_sellers: Vec<(Value, f64)>,
    pub drill_down: Option<DrillDown>,
    /// Set when the view is empty and sections were left blank.
    pub notice: Option<QueryError>,
}

/// Turn an empty-view failure into `None`; anything else still propagates.
fn non_empty<T>(result: QueryResult<T>) -> QueryResult<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(QueryError::EmptyAggregation) => Ok(None),
        Err(e) => Err(e),
    }
}

fn revenue_by(table: &Table, column: Column) -> QueryResult<Summary> {
    aggregate(table, column, Column::TotalAmount, AggFn::Sum)
}

impl Report {
    pub fn build(table: &Table, options: &ReportOptions) -> QueryResult<Report> {
        let monthly = revenue_by(table, Column::Month)?;
        let products = revenue_by(table, Column::ProductType)?;
        let categories = revenue_by(table, Column::ProductCategory)?;
        let details = revenue_by(table, Column::ProductDetail)?;

        let weekday = non_empty(aggregate(
            table,
            Column::Weekday,
            Column::TotalAmount,
            AggFn::Mean,
        ))?
        .map(|averages| -> QueryResult<WeekdayInsight> {
            let (best_day, worst_day) = averages.extrema()?;
            Ok(WeekdayInsight {
                averages,
                best_day,
                worst_day,
            })
        })
        .transpose()?;

        let pivot = pivot(
            table,
            options.pivot_rows,
            options.pivot_columns,
            Column::TotalAmount,
            AggFn::Sum,
            true,
        )?;

        let drill_down = match &options.drill_down {
            Some(product_type) => {
                let view = filter_eq(table, Column::ProductType, &Value::from(product_type.as_str()));
                Some(DrillDown {
                    product_type: product_type.clone(),
                    revenue_by_detail: revenue_by(&view, Column::ProductDetail)?,
                    quantity_by_weekday: aggregate(
                        &view,
                        Column::Weekday,
                        Column::TransactionQty,
                        AggFn::Sum,
                    )?,
                })
            }
            None => None,
        };

        let notice = table.is_empty().then_some(QueryError::EmptyAggregation);
        if notice.is_some() {
            log::warn!("Current selection matches no transactions");
        }

        let report = Report {
            kpis: Kpis::compute(table),
            monthly_sales: monthly.top_n(monthly.len(), false),
            monthly_trend: monthly.in_key_order(),
            product_sales: products.top_n(products.len(), false),
            weekday,
            pivot,
            top_product: non_empty(products.extrema())?.map(|(max, _)| max),
            top_category: non_empty(categories.extrema())?.map(|(max, _)| max),
            best_sellers: details.top_n(options.top_n, false),
            worst_sellers: details.top_n(options.top_n, true),
            drill_down,
            notice,
        };
        log::debug!(
            "report: {} rows, {} months, {} product types",
            report.kpis.transactions,
            report.monthly_sales.len(),
            report.product_sales.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::filter_by;
    use crate::data::loader::read_csv;

    const CSV: &str = "\
transaction_date,transaction_qty,store_location,product_category,product_type,product_detail,total_amount
2023-01-02,2,Astoria,Coffee,Barista Espresso,Latte Rg,6.0
2023-01-03,1,Astoria,Tea,Brewed Chai tea,Morning Sunrise Chai Rg,2.5
2023-02-06,1,Lower Manhattan,Coffee,Barista Espresso,Cappuccino Lg,4.25
2023-02-07,3,Lower Manhattan,Bakery,Scone,Oatmeal Scone,9.0
";

    fn table() -> Table {
        read_csv(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn full_view_report() {
        let report = Report::build(&table(), &ReportOptions::default()).unwrap();
        assert_eq!(report.kpis.transactions, 4);
        assert_eq!(report.kpis.total_revenue, 21.75);
        assert_eq!(report.monthly_sales[0], (Value::from("February"), 13.25));
        assert_eq!(
            report.monthly_trend.iter().map(|(k, _)| k.to_string()).collect::<Vec<_>>(),
            vec!["January", "February"]
        );
        assert_eq!(report.top_product, Some(Value::from("Barista Espresso")));
        assert_eq!(report.top_category, Some(Value::from("Coffee")));

        let weekday = report.weekday.unwrap();
        assert_eq!(weekday.best_day, Value::from("Tuesday"));
        assert_eq!(weekday.worst_day, Value::from("Monday"));

        assert_eq!(report.pivot.grand_total(), Some(21.75));
        assert_eq!(report.best_sellers[0], (Value::from("Oatmeal Scone"), 9.0));
        assert_eq!(report.worst_sellers[0], (Value::from("Morning Sunrise Chai Rg"), 2.5));
        assert!(report.notice.is_none());
    }

    #[test]
    fn empty_view_degrades_to_no_data() {
        let view = filter_by(&table(), "Astoria", "Bakery", "All");
        let report = Report::build(&view, &ReportOptions::default()).unwrap();
        assert_eq!(report.kpis.transactions, 0);
        assert_eq!(report.kpis.avg_bill, None);
        assert!(report.weekday.is_none());
        assert!(report.top_product.is_none());
        assert!(report.monthly_sales.is_empty());
        assert_eq!(report.notice, Some(QueryError::EmptyAggregation));
    }

    #[test]
    fn drill_down_into_product_type() {
        let options = ReportOptions {
            drill_down: Some("Barista Espresso".to_string()),
            ..ReportOptions::default()
        };
        let report = Report::build(&table(), &options).unwrap();
        let drill = report.drill_down.unwrap();
        assert_eq!(drill.revenue_by_detail.len(), 2);
        assert_eq!(drill.revenue_by_detail.get(&Value::from("Latte Rg")), Some(6.0));
        assert_eq!(drill.quantity_by_weekday.get(&Value::from("Monday")), Some(3.0));
    }
}
