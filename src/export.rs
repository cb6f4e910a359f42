use std::path::{Path, PathBuf};

use crate::error::{DashError, Result};
use crate::filter::FilteredView;
use crate::schema::{cell_text, Field};

pub const REVENUE_HEADER: &str = "Revenue";

/// Serialize the filtered view, derived revenue included, as UTF-8 CSV with
/// a header row.
pub fn export_csv(view: &FilteredView) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = Field::ALL.iter().map(|f| f.name()).collect();
    header.push(REVENUE_HEADER);
    wtr.write_record(&header)?;

    for v in view.iter() {
        let mut record: Vec<String> = Field::ALL.iter().map(|f| cell_text(&v.row, *f)).collect();
        record.push(format!("{:.2}", v.revenue));
        wtr.write_record(&record)?;
    }

    let bytes = wtr.into_inner().map_err(|e| DashError::Io(e.into_error()))?;
    log::info!("exported {} rows ({} bytes)", view.len(), bytes.len());
    Ok(bytes)
}

/// Write export bytes to `path`, creating parent directories.
pub fn write_export(bytes: &[u8], path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{apply, FilterSelection, StatusFilter};
    use crate::models::Status;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn view() -> FilteredView {
        let ds = crate::seed::generate_dataset(&mut StdRng::seed_from_u64(5));
        let mut sel = FilterSelection::select_all(&ds, false);
        sel.status = StatusFilter::Only(Status::Completed);
        apply(&ds, &sel)
    }

    #[test]
    fn test_header_and_row_count() {
        let v = view();
        let bytes = export_csv(&v).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,Product,Region,Units Sold,Unit Price,Status,Rating,Revenue"
        );
        assert_eq!(text.lines().count(), v.len() + 1);
    }

    #[test]
    fn test_numeric_fields_round_trip() {
        let v = view();
        let bytes = export_csv(&v).unwrap();
        let mut rdr = csv::Reader::from_reader(bytes.as_slice());
        let mut n = 0;
        for (record, expected) in rdr.records().zip(v.iter()) {
            let record = record.unwrap();
            assert_eq!(&record[0], expected.row.date.format("%Y-%m-%d").to_string());
            let units: u32 = record[3].parse().unwrap();
            let price: f64 = record[4].parse().unwrap();
            let revenue: f64 = record[7].parse().unwrap();
            assert_eq!(units, expected.row.units_sold);
            assert!((price - expected.row.unit_price).abs() < 0.005);
            assert!((revenue - expected.revenue).abs() < 0.005);
            assert_eq!(&record[5], "Completed");
            n += 1;
        }
        assert_eq!(n, v.len());
    }

    #[test]
    fn test_empty_view_exports_header_only() {
        let bytes = export_csv(&FilteredView::default()).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_write_export_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join(crate::settings::EXPORT_FILE_NAME);
        let written = write_export(b"Date\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(written).unwrap(), "Date\n");
    }
}
