use chrono::NaiveDate;

use crate::error::{DashError, Result};
use crate::models::{Dataset, Status, Transaction, PRODUCTS, REGIONS};
use crate::schema::{Field, Schema};

/// The two grids that can edit the canonical dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditSurface {
    /// Master-data grid with column constraints.
    Validated,
    /// Plain grid: type parsing only.
    Plain,
}

impl EditSurface {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Validated => "Data Editor",
            Self::Plain => "New Table",
        }
    }

    pub fn schema(&self) -> Result<Schema> {
        match self {
            Self::Validated => Schema::validated(),
            Self::Plain => Ok(Schema::plain()),
        }
    }
}

/// Working copy of the canonical dataset owned by one editing surface.
///
/// Every mutation is checked against the surface's schema first; a rejected
/// edit leaves the snapshot exactly as it was.
pub struct EditSession {
    surface: EditSurface,
    schema: Schema,
    snapshot: Dataset,
}

impl EditSession {
    pub fn new(surface: EditSurface, canonical: &Dataset) -> Result<Self> {
        Ok(Self {
            surface,
            schema: surface.schema()?,
            snapshot: canonical.clone(),
        })
    }

    pub fn surface(&self) -> EditSurface {
        self.surface
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn snapshot(&self) -> &Dataset {
        &self.snapshot
    }

    /// Discard local edits and re-copy the canonical dataset.
    pub fn reset(&mut self, canonical: &Dataset) {
        self.snapshot = canonical.clone();
    }

    pub fn set_cell(&mut self, row: usize, field: Field, raw: &str) -> Result<()> {
        let target = self
            .snapshot
            .get_mut(row)
            .ok_or(DashError::RowOutOfRange(row))?;
        self.schema.set_cell(target, field, raw)
    }

    pub fn insert_row(&mut self, at: usize, row: Transaction) -> Result<()> {
        self.schema.validate_row(&row)?;
        self.snapshot.insert(at, row);
        Ok(())
    }

    pub fn delete_row(&mut self, row: usize) -> Result<Transaction> {
        self.snapshot
            .remove(row)
            .ok_or(DashError::RowOutOfRange(row))
    }

    /// Prefilled row for insertion: the day after the last row, first
    /// product and region, one unit.
    pub fn new_row_template(&self) -> Transaction {
        let date = self
            .snapshot
            .rows()
            .last()
            .and_then(|r| r.date.succ_opt())
            .or_else(|| NaiveDate::from_ymd_opt(2024, 1, 1))
            .unwrap_or_default();
        Transaction {
            date,
            product: PRODUCTS[0].to_string(),
            region: REGIONS[0].to_string(),
            units_sold: 1,
            unit_price: 0.0,
            status: Status::Pending,
            rating: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn canonical() -> Dataset {
        crate::seed::generate_dataset(&mut StdRng::seed_from_u64(11))
    }

    #[test]
    fn test_valid_edit_changes_snapshot_only() {
        let d = canonical();
        let mut session = EditSession::new(EditSurface::Validated, &d).unwrap();
        session.set_cell(0, Field::Rating, "1").unwrap();
        session.set_cell(0, Field::UnitPrice, "12.34").unwrap();
        assert_eq!(session.snapshot().rows()[0].rating, 1);
        assert_eq!(session.snapshot().rows()[0].unit_price, 12.34);
        assert_eq!(d, canonical());
    }

    #[test]
    fn test_rejected_edit_leaves_snapshot_untouched() {
        let d = canonical();
        let mut session = EditSession::new(EditSurface::Validated, &d).unwrap();
        assert!(session.set_cell(4, Field::Rating, "7").is_err());
        assert!(session.set_cell(4, Field::Product, "Bad*Name").is_err());
        assert_eq!(session.snapshot(), &d);
    }

    #[test]
    fn test_plain_surface_accepts_unconstrained_values() {
        let d = canonical();
        let mut session = EditSession::new(EditSurface::Plain, &d).unwrap();
        session.set_cell(4, Field::Product, "USB-C Hub").unwrap();
        assert_eq!(session.snapshot().rows()[4].product, "USB-C Hub");
    }

    #[test]
    fn test_out_of_range_row() {
        let d = canonical();
        let mut session = EditSession::new(EditSurface::Plain, &d).unwrap();
        assert!(matches!(
            session.set_cell(500, Field::Rating, "3"),
            Err(DashError::RowOutOfRange(500))
        ));
        assert!(session.delete_row(500).is_err());
    }

    #[test]
    fn test_insert_and_delete_rows() {
        let d = canonical();
        let mut session = EditSession::new(EditSurface::Validated, &d).unwrap();
        let template = session.new_row_template();
        assert_eq!(template.date.to_string(), "2024-04-10");
        session.insert_row(d.len(), template.clone()).unwrap();
        assert_eq!(session.snapshot().len(), d.len() + 1);
        assert_eq!(session.snapshot().rows()[d.len()], template);

        let removed = session.delete_row(0).unwrap();
        assert_eq!(removed, d.rows()[0]);
        assert_eq!(session.snapshot().len(), d.len());
    }

    #[test]
    fn test_insert_rejects_invalid_row() {
        let d = canonical();
        let mut session = EditSession::new(EditSurface::Validated, &d).unwrap();
        let mut row = session.new_row_template();
        row.rating = 0;
        assert!(session.insert_row(0, row).is_err());
        assert_eq!(session.snapshot().len(), d.len());
    }

    #[test]
    fn test_reset_discards_local_edits() {
        let d = canonical();
        let mut session = EditSession::new(EditSurface::Plain, &d).unwrap();
        session.delete_row(0).unwrap();
        session.reset(&d);
        assert_eq!(session.snapshot(), &d);
    }
}
