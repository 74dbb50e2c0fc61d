use std::path::Path;

use csv::ReaderBuilder;
use tracing::info;

use super::errors::SeriesError;
use super::normalize::{parse_date_cell, parse_numeric_cell};
use super::structs::RawPriceRow;

/// Locate a header column by case-insensitive name.
fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

/// Load a daily history CSV into raw rows.
///
/// Expects a header row with at least `date` and `close` columns; a
/// `turnover_ratio` column is optional (some providers do not carry it, and
/// normalization fills the gap). Ragged rows and unparseable cells degrade to
/// missing values rather than failing the whole file.
pub fn load_daily_history<P: AsRef<Path>>(path: P) -> Result<Vec<RawPriceRow>, SeriesError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let date_idx = find_column(&headers, "date")
        .ok_or_else(|| SeriesError::MissingColumn("date".to_string()))?;
    let close_idx = find_column(&headers, "close")
        .ok_or_else(|| SeriesError::MissingColumn("close".to_string()))?;
    let turnover_idx = find_column(&headers, "turnover_ratio");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(RawPriceRow {
            date: record.get(date_idx).and_then(parse_date_cell),
            close: record.get(close_idx).and_then(parse_numeric_cell),
            turnover_ratio: turnover_idx
                .and_then(|idx| record.get(idx))
                .and_then(parse_numeric_cell),
        });
    }

    info!("Loaded {} raw rows from {:?}", rows.len(), path);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_loads_rows_with_turnover_column() {
        let file = write_fixture(
            "date,open,high,low,close,volume,turnover_ratio\n\
             2024-03-01,9.8,10.2,9.7,10.0,120000,1.5\n\
             2024-03-04,10.0,10.6,9.9,10.5,150000,2.1\n",
        );

        let rows = load_daily_history(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].close, Some(10.0));
        assert_eq!(rows[0].turnover_ratio, Some(1.5));
        assert_eq!(rows[1].turnover_ratio, Some(2.1));
    }

    #[test]
    fn test_missing_turnover_column_yields_none_cells() {
        let file = write_fixture(
            "date,open,high,low,close,volume\n\
             2024-03-01,9.8,10.2,9.7,10.0,120000\n",
        );

        let rows = load_daily_history(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].turnover_ratio, None);
    }

    #[test]
    fn test_unparseable_cells_degrade_to_missing() {
        let file = write_fixture(
            "date,close,turnover_ratio\n\
             not-a-date,10.0,1.5\n\
             2024-03-04,n/a,2.0\n\
             2024-03-05,10.8,--\n",
        );

        let rows = load_daily_history(file.path()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, None);
        assert_eq!(rows[1].close, None);
        assert_eq!(rows[2].turnover_ratio, None);
        assert_eq!(rows[2].close, Some(10.8));
    }

    #[test]
    fn test_missing_required_column_is_an_error() {
        let file = write_fixture("date,open,volume\n2024-03-01,9.8,120000\n");

        let err = load_daily_history(file.path()).unwrap_err();
        assert!(matches!(err, SeriesError::MissingColumn(ref col) if col == "close"));
    }
}
