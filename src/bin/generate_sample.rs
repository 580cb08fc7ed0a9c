use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Duration, NaiveDate};
use coffee_dash::data::loader::weekday_name;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const STORES: [(i64, &str); 3] = [(3, "Astoria"), (5, "Lower Manhattan"), (8, "Hell's Kitchen")];

/// (category, type, detail, unit price)
const PRODUCTS: [(&str, &str, &str, f64); 12] = [
    ("Coffee", "Gourmet brewed coffee", "Ethiopia Rg", 3.0),
    ("Coffee", "Gourmet brewed coffee", "Columbian Medium Roast Lg", 3.0),
    ("Coffee", "Barista Espresso", "Latte Rg", 4.25),
    ("Coffee", "Barista Espresso", "Cappuccino Lg", 4.25),
    ("Coffee", "Drip coffee", "Our Old Time Diner Blend Sm", 2.0),
    ("Tea", "Brewed Chai tea", "Spicy Eye Opener Chai Lg", 3.5),
    ("Tea", "Brewed Chai tea", "Morning Sunrise Chai Rg", 2.5),
    ("Tea", "Brewed Black tea", "Earl Grey Rg", 2.5),
    ("Bakery", "Scone", "Oatmeal Scone", 3.0),
    ("Bakery", "Scone", "Jumbo Savory Scone", 3.75),
    ("Bakery", "Pastry", "Chocolate Croissant", 3.75),
    ("Drinking Chocolate", "Hot chocolate", "Dark chocolate Lg", 4.5),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform integer in `0..n`.
    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

/// One sale line in the layout of the cleaned point-of-sale export.
#[derive(Debug, Serialize)]
struct SaleRow {
    transaction_id: i64,
    transaction_date: NaiveDate,
    transaction_time: String,
    transaction_qty: i64,
    store_id: i64,
    store_location: &'static str,
    unit_price: f64,
    product_category: &'static str,
    product_type: &'static str,
    product_detail: &'static str,
    total_amount: f64,
    weekday: &'static str,
}

fn generate(rng: &mut SimpleRng) -> Result<Vec<SaleRow>> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).context("invalid start date")?;
    let end = NaiveDate::from_ymd_opt(2023, 6, 30).context("invalid end date")?;

    let mut rows = Vec::new();
    let mut date = start;
    while date <= end {
        let weekend = date.weekday().number_from_monday() >= 6;
        // Sales grow month over month, weekends are busier.
        let base = 12 + date.month0() as u64 * 2 + if weekend { 6 } else { 0 };

        for &(store_id, store) in &STORES {
            for _ in 0..base + rng.below(10) {
                let (category, kind, detail, price) = PRODUCTS[rng.below(PRODUCTS.len() as u64) as usize];
                let qty = 1 + rng.below(3) as i64;
                let minute = rng.below(14 * 60);
                rows.push(SaleRow {
                    transaction_id: rows.len() as i64 + 1,
                    transaction_date: date,
                    transaction_time: format!("{:02}:{:02}:00", 7 + minute / 60, minute % 60),
                    transaction_qty: qty,
                    store_id,
                    store_location: store,
                    unit_price: price,
                    product_category: category,
                    product_type: kind,
                    product_detail: detail,
                    total_amount: price * qty as f64,
                    weekday: weekday_name(date.weekday()),
                });
            }
        }
        date += Duration::days(1);
    }
    Ok(rows)
}

fn write_csv(path: &Path, rows: &[SaleRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[SaleRow]) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("invalid epoch")?;
    let text = |f: fn(&SaleRow) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("transaction_id", DataType::Int64, false),
        Field::new("transaction_date", DataType::Date32, false),
        Field::new("transaction_qty", DataType::Int64, false),
        Field::new("store_location", DataType::Utf8, false),
        Field::new("product_category", DataType::Utf8, false),
        Field::new("product_type", DataType::Utf8, false),
        Field::new("product_detail", DataType::Utf8, false),
        Field::new("unit_price", DataType::Float64, false),
        Field::new("total_amount", DataType::Float64, false),
        Field::new("weekday", DataType::Utf8, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.transaction_id))),
        Arc::new(Date32Array::from_iter_values(
            rows.iter()
                .map(|r| (r.transaction_date - epoch).num_days() as i32),
        )),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.transaction_qty))),
        text(|r| r.store_location),
        text(|r| r.product_category),
        text(|r| r.product_type),
        text(|r| r.product_detail),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.unit_price))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.total_amount))),
        text(|r| r.weekday),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating Parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| coffee_dash::config::DEFAULT_DATA_PATH.to_string());
    let path = Path::new(&output);

    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng)?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => write_csv(path, &rows)?,
        Some("parquet") | Some("pq") => write_parquet(path, &rows)?,
        _ => bail!("output must end in .csv or .parquet: {output}"),
    }

    log::info!("Wrote {} transactions to {}", rows.len(), path.display());
    println!("Wrote {} transactions to {output}", rows.len());
    Ok(())
}
