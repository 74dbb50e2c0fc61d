/// Chip Distribution Module
///
/// Implements the cost-basis ("chip") distribution simulation over a daily
/// price series: each day's buyers are injected at that day's close in
/// proportion to turnover, while all previously-held positions decay by the
/// same turnover fraction. Summary statistics (profit ratio, average cost,
/// concentration bands) are derived from the resulting distribution.
pub mod calculator;
pub mod structs;

pub use calculator::{ChipDistributionCalculator, CONCENTRATION_BANDS};
pub use structs::{
    ChipDistribution, ChipLevelData, ChipLevelMap, ChipMetrics, ChipProfileConfig, PriceKey,
};
