use chrono::NaiveDate;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use super::structs::{PriceBar, PriceSeries, RawPriceRow};

/// Neutral turnover (percent) substituted when the upstream feed carries no
/// turnover column, or when an individual cell is missing. Sits above the
/// 0.1% clamp floor so defaulted bars stay distinguishable from genuine
/// zero-turnover days in the output.
pub const DEFAULT_TURNOVER_RATIO: f64 = 1.0;

/// Coerce a loosely-typed numeric cell. Thousands separators and surrounding
/// whitespace are tolerated; anything unparseable becomes `None`.
pub fn parse_numeric_cell(cell: &str) -> Option<f64> {
    let cleaned = cell.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce a date cell in `YYYY-MM-DD` form. Unparseable cells become `None`.
pub fn parse_date_cell(cell: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(cell.trim(), "%Y-%m-%d").ok()
}

/// Normalize raw provider rows into the series the engine consumes.
///
/// Rows without a parseable date or a positive close are dropped. Survivors
/// are sorted ascending by date with duplicate dates collapsed to their first
/// occurrence. Missing turnover cells receive [`DEFAULT_TURNOVER_RATIO`],
/// applied uniformly whether the whole column was absent or single cells
/// failed to parse.
///
/// Zero input rows produce an empty series, never an error: callers treat an
/// empty series as "insufficient data".
pub fn normalize(rows: Vec<RawPriceRow>) -> PriceSeries {
    let total_rows = rows.len();
    let mut defaulted_turnover = 0usize;

    let mut bars: Vec<PriceBar> = rows
        .into_iter()
        .filter_map(|row| {
            let date = row.date?;
            let close = row.close.filter(|c| *c > 0.0)?;
            let turnover_ratio = match row.turnover_ratio {
                Some(ratio) => ratio,
                None => {
                    defaulted_turnover += 1;
                    DEFAULT_TURNOVER_RATIO
                }
            };
            Some(PriceBar {
                date,
                close,
                turnover_ratio,
            })
        })
        .collect();

    // Stable sort: equal dates keep input order, so the dedup pass below
    // retains the first occurrence seen upstream.
    bars.sort_by_key(|bar| bar.date);

    let mut seen_dates: FxHashSet<NaiveDate> = FxHashSet::default();
    bars.retain(|bar| seen_dates.insert(bar.date));

    let dropped = total_rows - bars.len();
    if dropped > 0 {
        warn!(
            "Normalization dropped {} of {} raw rows (unparseable or duplicate dates)",
            dropped, total_rows
        );
    }
    if defaulted_turnover > 0 {
        debug!(
            "Filled {} missing turnover cells with default {}%",
            defaulted_turnover, DEFAULT_TURNOVER_RATIO
        );
    }

    PriceSeries::from_sorted_bars(bars)
}
