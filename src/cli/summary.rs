use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{cli_session, FilterArgs};
use crate::error::Result;
use crate::fmt::{money, number, percent, rating};
use crate::session::DashboardFrame;

pub fn run(no_auth: bool, credentials: Option<&str>, user: Option<&str>, filters: &FilterArgs) -> Result<()> {
    let mut session = cli_session(no_auth, credentials, user, filters.seed)?;
    for cmd in filters.commands()? {
        session.dispatch(cmd)?;
    }
    let frame = session.run_pass()?;
    print_frame(&frame);
    session.end();
    Ok(())
}

fn print_frame(frame: &DashboardFrame) {
    println!("{}", "Executive Sales Overview".bold());
    println!("{}\n", frame.caption());

    let k = &frame.kpis;
    let mut table = Table::new();
    table.set_header(vec!["Total Revenue", "Units Sold", "Avg Customer Rating", "Completion Rate"]);
    table.add_row(vec![
        Cell::new(money(k.total_revenue)),
        Cell::new(number(k.total_units)),
        Cell::new(rating(k.avg_rating)),
        Cell::new(percent(k.completion_rate_pct)),
    ]);
    println!("{table}");

    if !frame.top_products.is_empty() {
        let mut top = Table::new();
        top.set_header(vec!["Product", "Revenue"]);
        for p in &frame.top_products {
            top.add_row(vec![Cell::new(&p.product), Cell::new(money(p.revenue))]);
        }
        println!("\nTop {} Products by Revenue\n{top}", frame.top_products.len());
    }

    if !frame.status_counts.is_empty() {
        let total: usize = frame.status_counts.iter().map(|s| s.count).sum();
        let mut dist = Table::new();
        dist.set_header(vec!["Status", "Count", "%"]);
        for s in &frame.status_counts {
            dist.add_row(vec![
                Cell::new(s.status.as_str()),
                Cell::new(s.count),
                Cell::new(percent(s.count as f64 / total as f64 * 100.0)),
            ]);
        }
        println!("\nStatus Distribution\n{dist}");
    }
}
