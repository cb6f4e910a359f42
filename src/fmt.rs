/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    let with_commas = group_thousands(int_part);

    if negative {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Format a count with thousands separators: 12,345
pub fn number(val: u64) -> String {
    group_thousands(&val.to_string())
}

/// Average customer rating, or "no data" for an empty view.
pub fn rating(avg: Option<f64>) -> String {
    match avg {
        Some(r) => format!("{r:.1} \u{2605}"),
        None => "no data".to_string(),
    }
}

pub fn percent(val: f64) -> String {
    format!("{val:.1}%")
}

fn group_thousands(digits: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "$1,234.56");
        assert_eq!(money(-500.00), "-$500.00");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1000000.99), "$1,000,000.99");
        assert_eq!(money(42.10), "$42.10");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(number(0), "0");
        assert_eq!(number(999), "999");
        assert_eq!(number(1234567), "1,234,567");
    }

    #[test]
    fn test_rating_and_percent() {
        assert_eq!(rating(Some(3.26)), "3.3 \u{2605}");
        assert_eq!(rating(None), "no data");
        assert_eq!(percent(100.0 / 3.0), "33.3%");
        assert_eq!(percent(0.0), "0.0%");
    }
}
