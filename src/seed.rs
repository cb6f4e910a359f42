use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{Dataset, Status, Transaction, PRODUCTS, REGIONS};

pub const SEED_ROWS: usize = 100;

fn seed_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("2024-01-01 is a valid date")
}

/// Build the synthetic session dataset: one row per day for `SEED_ROWS`
/// consecutive days, everything else drawn uniformly from `rng`.
pub fn generate_dataset<R: Rng + ?Sized>(rng: &mut R) -> Dataset {
    let start = seed_start();
    let rows = (0..SEED_ROWS)
        .map(|i| Transaction {
            date: start + chrono::Duration::days(i as i64),
            product: pick(rng, PRODUCTS),
            region: pick(rng, REGIONS),
            units_sold: rng.gen_range(1..50),
            unit_price: (rng.gen_range(20.0..1500.0_f64) * 100.0).round() / 100.0,
            status: *Status::ALL.choose(rng).unwrap_or(&Status::Pending),
            rating: rng.gen_range(1..6),
        })
        .collect();
    Dataset::new(rows)
}

fn pick<R: Rng + ?Sized>(rng: &mut R, pool: &[&str]) -> String {
    pool.choose(rng).copied().unwrap_or_default().to_string()
}
