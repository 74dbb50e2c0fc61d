/// Technical Analysis Module
///
/// Moving-average overlays computed alongside the chip distribution for the
/// report output (MA5/MA20/MA60/MA250 over daily closes).
pub mod structs;

pub use structs::{sma_series, IncrementalSMA, MovingAverageSeries, DEFAULT_MA_PERIODS};
