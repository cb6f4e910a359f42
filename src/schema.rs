use chrono::NaiveDate;
use regex::Regex;

use crate::error::{DashError, Result};
use crate::fmt::money;
use crate::models::{Status, Transaction};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const PRODUCT_PATTERN: &str = "^[a-zA-Z0-9 ]+$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Product,
    Region,
    UnitsSold,
    UnitPrice,
    Status,
    Rating,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Date,
        Field::Product,
        Field::Region,
        Field::UnitsSold,
        Field::UnitPrice,
        Field::Status,
        Field::Rating,
    ];

    /// Column name as it appears in the dataset and in CSV headers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Product => "Product",
            Self::Region => "Region",
            Self::UnitsSold => "Units Sold",
            Self::UnitPrice => "Unit Price",
            Self::Status => "Status",
            Self::Rating => "Rating",
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Date => ColumnKind::Date,
            Self::Product | Self::Region => ColumnKind::Text,
            Self::UnitsSold | Self::Rating => ColumnKind::Integer,
            Self::UnitPrice => ColumnKind::Decimal,
            Self::Status => ColumnKind::Choice,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Text,
    Integer,
    Decimal,
    Choice,
}

#[derive(Debug, Clone)]
pub enum Constraint {
    Min(f64),
    Max(f64),
    /// Numeric values must sit on a multiple of the step.
    Step(f64),
    OneOf(Vec<String>),
    Pattern(Regex),
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayFormat {
    Raw,
    Money,
    Stars,
}

#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub field: Field,
    pub label: String,
    pub help: Option<String>,
    pub format: DisplayFormat,
    pub constraints: Vec<Constraint>,
}

impl ColumnSpec {
    fn plain(field: Field) -> Self {
        Self {
            field,
            label: field.name().to_string(),
            help: None,
            format: DisplayFormat::Raw,
            constraints: Vec::new(),
        }
    }

    fn labelled(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    fn help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    fn format(mut self, format: DisplayFormat) -> Self {
        self.format = format;
        self
    }

    fn constrain(mut self, c: Constraint) -> Self {
        self.constraints.push(c);
        self
    }

    /// Render a cell for the grid.
    pub fn display(&self, row: &Transaction) -> String {
        match (self.format, self.field) {
            (DisplayFormat::Money, Field::UnitPrice) => money(row.unit_price),
            (DisplayFormat::Stars, Field::Rating) => format!("{} \u{2605}", row.rating),
            _ => cell_text(row, self.field),
        }
    }

    /// Runs before type parsing so an empty cell reports as missing.
    fn check_present(&self, raw: &str) -> Result<()> {
        let required = self.constraints.iter().any(|c| matches!(c, Constraint::Required));
        if required && raw.trim().is_empty() {
            return Err(DashError::validation(self.label.clone(), "a value is required"));
        }
        Ok(())
    }

    fn check(&self, raw: &str, value: &CellValue) -> Result<()> {
        let fail = |msg: String| Err(DashError::validation(self.label.clone(), msg));
        for c in &self.constraints {
            match (c, value) {
                (Constraint::Min(min), v) => {
                    if let Some(n) = v.as_number() {
                        if n < *min {
                            return fail(format!("{n} is below the minimum of {min}"));
                        }
                    }
                }
                (Constraint::Max(max), v) => {
                    if let Some(n) = v.as_number() {
                        if n > *max {
                            return fail(format!("{n} is above the maximum of {max}"));
                        }
                    }
                }
                (Constraint::Step(step), v) => {
                    if let Some(n) = v.as_number() {
                        let ratio = n / step;
                        if (ratio - ratio.round()).abs() > 1e-6 {
                            return fail(format!("{n} is not a multiple of {step}"));
                        }
                    }
                }
                // Exact spelling; type parsing alone ignores case.
                (Constraint::OneOf(options), _) => {
                    if !options.iter().any(|o| o == raw.trim()) {
                        return fail(format!("must be one of {}", options.join(", ")));
                    }
                }
                (Constraint::Pattern(re), _) => {
                    if !re.is_match(raw) {
                        return fail(format!("'{raw}' does not match {}", re.as_str()));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Date(NaiveDate),
    Text(String),
    Integer(i64),
    Decimal(f64),
    Choice(Status),
}

impl CellValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

/// Ordered column configuration shared by edit validation and grid rendering.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    /// Type parsing only; used by the plain grid.
    pub fn plain() -> Self {
        Self {
            columns: Field::ALL.into_iter().map(ColumnSpec::plain).collect(),
        }
    }

    /// Column constraints of the master-data editor.
    pub fn validated() -> Result<Self> {
        let statuses: Vec<String> = Status::ALL.iter().map(|s| s.as_str().to_string()).collect();
        let columns = vec![
            ColumnSpec::plain(Field::Date).labelled("Transaction Date").help("YYYY-MM-DD"),
            ColumnSpec::plain(Field::Product)
                .labelled("Product Name")
                .constrain(Constraint::Pattern(Regex::new(PRODUCT_PATTERN)?)),
            ColumnSpec::plain(Field::Region),
            ColumnSpec::plain(Field::UnitsSold),
            ColumnSpec::plain(Field::UnitPrice)
                .labelled("Price ($)")
                .format(DisplayFormat::Money)
                .constrain(Constraint::Min(0.0))
                .constrain(Constraint::Step(0.01)),
            ColumnSpec::plain(Field::Status)
                .labelled("Order Status")
                .constrain(Constraint::Required)
                .constrain(Constraint::OneOf(statuses)),
            ColumnSpec::plain(Field::Rating)
                .help("Customer rating 1-5")
                .format(DisplayFormat::Stars)
                .constrain(Constraint::Min(1.0))
                .constrain(Constraint::Max(5.0))
                .constrain(Constraint::Step(1.0)),
        ];
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, field: Field) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Parse raw cell input for `field` and check the column's constraints.
    pub fn parse_cell(&self, field: Field, raw: &str) -> Result<CellValue> {
        let label = self
            .column(field)
            .map(|c| c.label.clone())
            .unwrap_or_else(|| field.name().to_string());
        let column = self.column(field);
        if let Some(col) = column {
            col.check_present(raw)?;
        }
        let value = parse_typed(field, raw, &label)?;
        if let Some(col) = column {
            col.check(raw, &value)?;
        }
        Ok(value)
    }

    /// Validate then write one cell. On error `row` is left untouched.
    pub fn set_cell(&self, row: &mut Transaction, field: Field, raw: &str) -> Result<()> {
        let value = self.parse_cell(field, raw)?;
        let label = field.name();
        match (field, value) {
            (Field::Date, CellValue::Date(d)) => row.date = d,
            (Field::Product, CellValue::Text(t)) => row.product = t,
            (Field::Region, CellValue::Text(t)) => row.region = t,
            (Field::UnitsSold, CellValue::Integer(n)) => {
                row.units_sold = u32::try_from(n)
                    .map_err(|_| DashError::validation(label, format!("{n} is out of range")))?;
            }
            (Field::UnitPrice, CellValue::Decimal(d)) => row.unit_price = d,
            (Field::Status, CellValue::Choice(s)) => row.status = s,
            (Field::Rating, CellValue::Integer(n)) => {
                row.rating = u8::try_from(n)
                    .map_err(|_| DashError::validation(label, format!("{n} is out of range")))?;
            }
            (f, v) => {
                return Err(DashError::Other(format!(
                    "{} cannot hold {v:?}",
                    f.name()
                )))
            }
        }
        Ok(())
    }

    /// Check every cell of a complete row, e.g. one inserted by the editor.
    pub fn validate_row(&self, row: &Transaction) -> Result<()> {
        for field in Field::ALL {
            self.parse_cell(field, &cell_text(row, field))?;
        }
        Ok(())
    }
}

/// Raw text of a cell, as used for edit buffers and CSV output.
pub fn cell_text(row: &Transaction, field: Field) -> String {
    match field {
        Field::Date => row.date.format(DATE_FORMAT).to_string(),
        Field::Product => row.product.clone(),
        Field::Region => row.region.clone(),
        Field::UnitsSold => row.units_sold.to_string(),
        Field::UnitPrice => format!("{:.2}", row.unit_price),
        Field::Status => row.status.as_str().to_string(),
        Field::Rating => row.rating.to_string(),
    }
}

fn parse_typed(field: Field, raw: &str, label: &str) -> Result<CellValue> {
    let trimmed = raw.trim();
    let bad = |what: &str| DashError::validation(label, format!("'{raw}' is not {what}"));
    match field.kind() {
        ColumnKind::Date => NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(CellValue::Date)
            .map_err(|_| bad("a YYYY-MM-DD date")),
        ColumnKind::Text => Ok(CellValue::Text(raw.to_string())),
        ColumnKind::Integer => trimmed
            .parse::<i64>()
            .map(CellValue::Integer)
            .map_err(|_| bad("a whole number")),
        ColumnKind::Decimal => trimmed
            .trim_start_matches('$')
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .map(CellValue::Decimal)
            .ok_or_else(|| bad("a number")),
        ColumnKind::Choice => trimmed.parse::<Status>().map(CellValue::Choice),
    }
}
