use chrono::NaiveDate;

use crate::filter::FilteredView;
use crate::models::Status;

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    pub total_revenue: f64,
    pub total_units: u64,
    /// `None` when the view is empty ("no data").
    pub avg_rating: Option<f64>,
    pub completion_rate_pct: f64,
}

pub fn kpis(view: &FilteredView) -> Kpis {
    let total_revenue: f64 = view.iter().map(|v| v.revenue).sum();
    let total_units: u64 = view.iter().map(|v| v.row.units_sold as u64).sum();

    let n = view.len();
    let avg_rating = if n > 0 {
        let sum: u64 = view.iter().map(|v| v.row.rating as u64).sum();
        Some(sum as f64 / n as f64)
    } else {
        None
    };

    let completed = view
        .iter()
        .filter(|v| v.row.status == Status::Completed)
        .count();
    let completion_rate_pct = if n > 0 {
        completed as f64 / n as f64 * 100.0
    } else {
        0.0
    };

    Kpis {
        total_revenue,
        total_units,
        avg_rating,
        completion_rate_pct,
    }
}

// ---------------------------------------------------------------------------
// Grouped summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRevenue {
    pub product: String,
    pub revenue: f64,
}

/// Revenue per product, highest first, at most `n` entries. Products with
/// equal revenue keep the order in which they first appear in the view.
pub fn top_products_by_revenue(view: &FilteredView, n: usize) -> Vec<ProductRevenue> {
    let mut totals: Vec<ProductRevenue> = Vec::new();
    for v in view.iter() {
        match totals.iter_mut().find(|p| p.product == v.row.product) {
            Some(p) => p.revenue += v.revenue,
            None => totals.push(ProductRevenue {
                product: v.row.product.clone(),
                revenue: v.revenue,
            }),
        }
    }
    // sort_by is stable, so ties stay in first-seen order
    totals.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    totals.truncate(n);
    totals
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCount {
    pub status: Status,
    pub count: usize,
}

/// Row count per status. Statuses that do not occur in the view are omitted.
pub fn status_distribution(view: &FilteredView) -> Vec<StatusCount> {
    Status::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: view.iter().filter(|v| v.row.status == status).count(),
        })
        .filter(|sc| sc.count > 0)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: f64,
}

/// Revenue summed per calendar date, ascending by date.
pub fn revenue_by_date(view: &FilteredView) -> Vec<DailyRevenue> {
    let mut days: Vec<DailyRevenue> = Vec::new();
    for v in view.iter() {
        match days.iter_mut().find(|d| d.date == v.row.date) {
            Some(d) => d.revenue += v.revenue,
            None => days.push(DailyRevenue {
                date: v.row.date,
                revenue: v.revenue,
            }),
        }
    }
    days.sort_by_key(|d| d.date);
    days
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionRevenue {
    pub region: String,
    pub total: f64,
    /// Per-product revenue within the region, first-seen order.
    pub products: Vec<ProductRevenue>,
}

/// Revenue per region broken down by product, regions in first-seen order.
pub fn revenue_by_region(view: &FilteredView) -> Vec<RegionRevenue> {
    let mut regions: Vec<RegionRevenue> = Vec::new();
    for v in view.iter() {
        let idx = match regions.iter().position(|r| r.region == v.row.region) {
            Some(i) => i,
            None => {
                regions.push(RegionRevenue {
                    region: v.row.region.clone(),
                    total: 0.0,
                    products: Vec::new(),
                });
                regions.len() - 1
            }
        };
        let region = &mut regions[idx];
        region.total += v.revenue;
        match region.products.iter_mut().find(|p| p.product == v.row.product) {
            Some(p) => p.revenue += v.revenue,
            None => region.products.push(ProductRevenue {
                product: v.row.product.clone(),
                revenue: v.revenue,
            }),
        }
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{apply, FilterSelection, StatusFilter};
    use crate::models::{Dataset, Transaction};

    fn row(product: &str, region: &str, status: Status, units: u32, price: f64, day: u32) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            product: product.to_string(),
            region: region.to_string(),
            units_sold: units,
            unit_price: price,
            status,
            rating: 3,
        }
    }

    fn view_of(ds: &Dataset, status: StatusFilter) -> FilteredView {
        let mut sel = FilterSelection::select_all(ds, false);
        sel.status = status;
        apply(ds, &sel)
    }

    fn three_statuses() -> Dataset {
        Dataset::new(vec![
            row("Laptop", "North", Status::Completed, 1, 100.0, 1),
            row("Mouse", "North", Status::Pending, 2, 25.0, 2),
            row("Headset", "South", Status::Cancelled, 1, 10.0, 3),
        ])
    }

    #[test]
    fn test_kpis_all_statuses() {
        let ds = three_statuses();
        let k = kpis(&view_of(&ds, StatusFilter::All));
        assert_eq!(k.total_revenue, 160.0);
        assert_eq!(k.total_units, 4);
        assert_eq!(k.avg_rating, Some(3.0));
        assert!((k.completion_rate_pct - 33.333).abs() < 0.01);
        assert_eq!(format!("{:.1}", k.completion_rate_pct), "33.3");
    }

    #[test]
    fn test_kpis_completed_only() {
        let ds = three_statuses();
        let view = view_of(&ds, StatusFilter::Only(Status::Completed));
        assert_eq!(view.len(), 1);
        let k = kpis(&view);
        assert_eq!(k.total_revenue, 100.0);
        assert_eq!(k.completion_rate_pct, 100.0);
    }

    #[test]
    fn test_kpis_empty_view_fallbacks() {
        let k = kpis(&FilteredView::default());
        assert_eq!(k.total_revenue, 0.0);
        assert_eq!(k.total_units, 0);
        assert_eq!(k.avg_rating, None);
        assert_eq!(k.completion_rate_pct, 0.0);
    }

    #[test]
    fn test_top_products_tie_break_first_seen() {
        let ds = Dataset::new(vec![
            row("A", "North", Status::Completed, 1, 200.0, 1),
            row("C", "North", Status::Completed, 1, 100.0, 2),
            row("B", "North", Status::Completed, 3, 100.0, 3),
            row("A", "North", Status::Completed, 1, 100.0, 4),
        ]);
        let top = top_products_by_revenue(&view_of(&ds, StatusFilter::All), 2);
        let names: Vec<&str> = top.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(top[0].revenue, 300.0);
        assert_eq!(top[1].revenue, 300.0);
    }

    #[test]
    fn test_top_products_shorter_than_n() {
        let ds = three_statuses();
        let top = top_products_by_revenue(&view_of(&ds, StatusFilter::All), 5);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].product, "Laptop");
        assert!(top_products_by_revenue(&FilteredView::default(), 5).is_empty());
    }

    #[test]
    fn test_status_distribution_omits_zero_counts() {
        let ds = Dataset::new(vec![
            row("A", "North", Status::Pending, 1, 1.0, 1),
            row("A", "North", Status::Completed, 1, 1.0, 2),
            row("A", "North", Status::Pending, 1, 1.0, 3),
        ]);
        let dist = status_distribution(&view_of(&ds, StatusFilter::All));
        assert_eq!(
            dist,
            vec![
                StatusCount { status: Status::Completed, count: 1 },
                StatusCount { status: Status::Pending, count: 2 },
            ]
        );
        assert!(status_distribution(&FilteredView::default()).is_empty());
    }

    #[test]
    fn test_revenue_by_date_sums_and_sorts() {
        let ds = Dataset::new(vec![
            row("A", "North", Status::Completed, 1, 10.0, 5),
            row("B", "South", Status::Completed, 2, 10.0, 2),
            row("C", "East", Status::Completed, 1, 5.0, 5),
        ]);
        let series = revenue_by_date(&view_of(&ds, StatusFilter::All));
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date.to_string(), "2024-01-02");
        assert_eq!(series[0].revenue, 20.0);
        assert_eq!(series[1].revenue, 15.0);
    }

    #[test]
    fn test_revenue_by_region_breaks_down_products() {
        let ds = Dataset::new(vec![
            row("Mouse", "West", Status::Completed, 1, 10.0, 1),
            row("Laptop", "North", Status::Pending, 1, 500.0, 2),
            row("Mouse", "West", Status::Completed, 2, 10.0, 3),
            row("Laptop", "West", Status::Completed, 1, 700.0, 4),
        ]);
        let regions = revenue_by_region(&view_of(&ds, StatusFilter::All));
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].region, "West");
        assert_eq!(regions[0].total, 730.0);
        assert_eq!(regions[0].products[0].product, "Mouse");
        assert_eq!(regions[0].products[0].revenue, 30.0);
        assert_eq!(regions[1].region, "North");
    }
}
