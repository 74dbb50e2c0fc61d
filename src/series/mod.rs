/// Price Series Preparation Module
///
/// Turns raw, possibly messy daily price history into the normalized,
/// chronologically ascending series the chip distribution engine requires.
/// Loading and normalization live here; the engine itself never does I/O.
pub mod errors;
pub mod loader;
pub mod normalize;
pub mod structs;

pub use errors::SeriesError;
pub use loader::load_daily_history;
pub use normalize::{normalize, DEFAULT_TURNOVER_RATIO};
pub use structs::{PriceBar, PriceSeries, RawPriceRow};
