use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One normalized trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading date (unique within a series, ascending after normalization)
    pub date: NaiveDate,
    /// Settlement price for the day (positive)
    pub close: f64,
    /// Percent of outstanding float traded this day (0-100 scale)
    pub turnover_ratio: f64,
}

/// Raw pre-normalization row as handed over by an upstream provider.
/// Cells that were absent or failed numeric/date coercion are `None`.
#[derive(Debug, Clone, Default)]
pub struct RawPriceRow {
    pub date: Option<NaiveDate>,
    pub close: Option<f64>,
    pub turnover_ratio: Option<f64>,
}

/// Daily price history, chronologically ascending with unique dates.
///
/// An empty series is valid and means "insufficient data" downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from bars already sorted ascending by unique date.
    ///
    /// `normalize` is the normal entry point; this constructor exists for
    /// callers that assemble bars programmatically. Ordering is a
    /// precondition of the simulation, so it is checked in debug builds.
    pub fn from_sorted_bars(bars: Vec<PriceBar>) -> Self {
        debug_assert!(
            bars.windows(2).all(|w| w[0].date < w[1].date),
            "price series bars must be strictly ascending by date"
        );
        Self { bars }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close of the most recent bar, the default "current price" reference.
    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|bar| bar.close)
    }

    /// Closing prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    /// Restrict the series to its most recent `lookback` bars.
    pub fn tail(&self, lookback: usize) -> Self {
        let skip = self.bars.len().saturating_sub(lookback);
        Self {
            bars: self.bars[skip..].to_vec(),
        }
    }
}
