use std::path::PathBuf;

use anyhow::{Context, Result, ensure};

/// Sales export read at start-up, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "CoffeeShopSales-cleaned.csv";

pub const DATA_PATH_ENV: &str = "COFFEE_DASH_DATA";
pub const TOP_N_ENV: &str = "COFFEE_DASH_TOP_N";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    /// Length of the best/worst seller lists.
    pub top_n: usize,
    pub currency_symbol: String,
    pub window_size: [f32; 2],
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            top_n: 5,
            currency_symbol: "₹".to_string(),
            window_size: [1280.0, 860.0],
        }
    }
}

impl DashboardConfig {
    /// Defaults, overridden by `COFFEE_DASH_DATA` and `COFFEE_DASH_TOP_N`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup(DATA_PATH_ENV) {
            config.data_path = PathBuf::from(path);
        }
        if let Some(n) = lookup(TOP_N_ENV) {
            let top_n: usize = n
                .trim()
                .parse()
                .with_context(|| format!("{TOP_N_ENV}='{n}' is not a positive integer"))?;
            ensure!(top_n > 0, "{TOP_N_ENV}='{n}' is not a positive integer");
            config.top_n = top_n;
        }
        Ok(config)
    }

    /// Format an amount for display, e.g. `₹ 1,234`.
    pub fn money(&self, amount: f64) -> String {
        format!("{} {}", self.currency_symbol, group_thousands(amount.round() as i64))
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}
