use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DashError;

pub const PRODUCTS: &[&str] = &["Laptop", "Mouse", "Monitor", "Headset", "Printer"];
pub const REGIONS: &[&str] = &["North", "South", "East", "West"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    Completed,
    Pending,
    Cancelled,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Completed, Status::Pending, Status::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Pending => "Pending",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                DashError::validation("Status", format!("'{s}' is not one of Completed, Pending, Cancelled"))
            })
    }
}

/// One sales record in the canonical dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub product: String,
    pub region: String,
    pub units_sold: u32,
    pub unit_price: f64,
    pub status: Status,
    pub rating: u8,
}

impl Transaction {
    pub fn revenue(&self) -> f64 {
        self.units_sold as f64 * self.unit_price
    }
}

/// Ordered table of transactions. Duplicates are allowed and order is
/// insertion order unless an edit moves rows around.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    rows: Vec<Transaction>,
}

impl Dataset {
    pub fn new(rows: Vec<Transaction>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Transaction> {
        self.rows.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Transaction> {
        self.rows.get_mut(idx)
    }

    /// Insert at `idx`, clamped to the end of the table.
    pub fn insert(&mut self, idx: usize, row: Transaction) {
        let at = idx.min(self.rows.len());
        self.rows.insert(at, row);
    }

    pub fn remove(&mut self, idx: usize) -> Option<Transaction> {
        if idx < self.rows.len() {
            Some(self.rows.remove(idx))
        } else {
            None
        }
    }

    /// Distinct regions in first-seen order.
    pub fn distinct_regions(&self) -> Vec<String> {
        distinct(self.rows.iter().map(|r| r.region.as_str()))
    }

    /// Distinct products in first-seen order.
    pub fn distinct_products(&self) -> Vec<String> {
        distinct(self.rows.iter().map(|r| r.product.as_str()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !out.iter().any(|seen| seen == v) {
            out.push(v.to_string());
        }
    }
    out
}
