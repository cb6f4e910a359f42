use std::fmt;
use std::str::FromStr;

use crate::error::DashError;
use crate::models::{Dataset, Status, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    /// Options offered by the sidebar radio.
    pub const CHOICES: [StatusFilter; 3] = [
        StatusFilter::All,
        StatusFilter::Only(Status::Completed),
        StatusFilter::Only(Status::Pending),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(s) => s.as_str(),
        }
    }

    pub fn matches(&self, status: Status) -> bool {
        match self {
            Self::All => true,
            Self::Only(s) => *s == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StatusFilter {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse::<Status>().map(Self::Only)
        }
    }
}

/// The active query over the canonical dataset.
///
/// `products` is `None` when the product filter does not apply (the
/// authenticated variant); `Some(vec![])` excludes every row.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    pub regions: Vec<String>,
    pub products: Option<Vec<String>>,
    pub status: StatusFilter,
}

impl FilterSelection {
    /// Everything selected: every distinct region (and product, if the
    /// product filter is enabled) with status `All`.
    pub fn select_all(dataset: &Dataset, with_products: bool) -> Self {
        Self {
            regions: dataset.distinct_regions(),
            products: with_products.then(|| dataset.distinct_products()),
            status: StatusFilter::All,
        }
    }

    pub fn region_selected(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }

    pub fn product_selected(&self, product: &str) -> bool {
        match &self.products {
            None => true,
            Some(products) => products.iter().any(|p| p == product),
        }
    }

    pub fn matches(&self, row: &Transaction) -> bool {
        self.region_selected(&row.region)
            && self.product_selected(&row.product)
            && self.status.matches(row.status)
    }
}

/// A canonical row that survived filtering, with its derived revenue.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub row: Transaction,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilteredView {
    rows: Vec<ViewRow>,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ViewRow> {
        self.rows.iter()
    }
}

/// Derive the filtered view. The canonical dataset is only read; the view
/// owns copies of the surviving rows.
pub fn apply(dataset: &Dataset, selection: &FilterSelection) -> FilteredView {
    let rows = dataset
        .rows()
        .iter()
        .filter(|r| selection.matches(r))
        .cloned()
        .map(|row| ViewRow {
            revenue: row.revenue(),
            row,
        })
        .collect();
    FilteredView { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn row(product: &str, region: &str, status: Status, units: u32, price: f64) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            product: product.to_string(),
            region: region.to_string(),
            units_sold: units,
            unit_price: price,
            status,
            rating: 4,
        }
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            row("Laptop", "North", Status::Completed, 2, 1000.0),
            row("Mouse", "South", Status::Pending, 10, 25.5),
            row("Monitor", "North", Status::Cancelled, 1, 300.0),
            row("Mouse", "East", Status::Completed, 4, 20.0),
        ])
    }

    #[test]
    fn test_select_all_keeps_every_row() {
        let ds = sample();
        let view = apply(&ds, &FilterSelection::select_all(&ds, true));
        assert_eq!(view.len(), ds.len());
    }

    #[test]
    fn test_region_and_status_predicates() {
        let ds = sample();
        let sel = FilterSelection {
            regions: vec!["North".to_string()],
            products: None,
            status: StatusFilter::Only(Status::Completed),
        };
        let view = apply(&ds, &sel);
        assert_eq!(view.len(), 1);
        let only = view.iter().next().unwrap();
        assert_eq!(only.row.product, "Laptop");
        assert_eq!(only.revenue, 2000.0);
    }

    #[test]
    fn test_product_filter_only_when_enabled() {
        let ds = sample();
        let mut sel = FilterSelection::select_all(&ds, false);
        assert_eq!(apply(&ds, &sel).len(), 4);
        sel.products = Some(vec!["Mouse".to_string()]);
        let view = apply(&ds, &sel);
        assert_eq!(view.len(), 2);
        assert!(view.iter().all(|v| v.row.product == "Mouse"));
    }

    #[test]
    fn test_empty_region_selection_excludes_everything() {
        let ds = sample();
        let mut sel = FilterSelection::select_all(&ds, false);
        sel.regions.clear();
        assert!(apply(&ds, &sel).is_empty());
    }

    #[test]
    fn test_empty_product_selection_excludes_everything() {
        let ds = sample();
        let mut sel = FilterSelection::select_all(&ds, true);
        sel.products = Some(Vec::new());
        assert!(apply(&ds, &sel).is_empty());
    }

    #[test]
    fn test_view_is_subset_and_satisfies_predicate() {
        let ds = crate::seed::generate_dataset(&mut StdRng::seed_from_u64(9));
        for status in StatusFilter::CHOICES {
            for regions in [vec!["North"], vec!["South", "West"], vec!["East", "North", "West"]] {
                let sel = FilterSelection {
                    regions: regions.iter().map(|r| r.to_string()).collect(),
                    products: Some(vec!["Laptop".to_string(), "Printer".to_string()]),
                    status,
                };
                let view = apply(&ds, &sel);
                for v in view.iter() {
                    assert!(ds.rows().contains(&v.row));
                    assert!(sel.matches(&v.row));
                    assert_eq!(v.revenue, v.row.units_sold as f64 * v.row.unit_price);
                }
                let expected = ds.rows().iter().filter(|r| sel.matches(r)).count();
                assert_eq!(view.len(), expected);
            }
        }
    }

    #[test]
    fn test_apply_is_idempotent_and_leaves_canonical_untouched() {
        let ds = sample();
        let before = ds.clone();
        let sel = FilterSelection::select_all(&ds, true);
        let a = apply(&ds, &sel);
        let b = apply(&ds, &sel);
        assert_eq!(a, b);
        assert_eq!(ds, before);
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!("All".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "completed".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(Status::Completed)
        );
        assert!("nope".parse::<StatusFilter>().is_err());
    }
}
