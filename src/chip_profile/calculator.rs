use tracing::debug;

use super::structs::{ChipDistribution, ChipLevelMap, ChipMetrics, ChipProfileConfig};
use crate::series::PriceSeries;

/// Central-mass fractions of the two reported concentration bands
pub const CONCENTRATION_BANDS: [f64; 2] = [0.90, 0.70];

/// Chip distribution calculator.
///
/// Holds no state between calls: `simulate` is a pure function of its input
/// series, so re-running for a changed lookback window is fully reproducible
/// and independent invocations can run concurrently.
#[derive(Debug, Clone, Default)]
pub struct ChipDistributionCalculator {
    config: ChipProfileConfig,
}

impl ChipDistributionCalculator {
    pub fn new(config: ChipProfileConfig) -> Self {
        Self { config }
    }

    /// Turnover percent -> clamped per-bar fraction.
    ///
    /// Applied exactly once per bar, here at first use. The floor keeps a
    /// zero or negative reported turnover from preserving prior weight
    /// completely untouched; the cap bounds a reported turnover above 100%.
    fn clamped_turnover_fraction(&self, turnover_ratio: f64) -> f64 {
        (turnover_ratio / 100.0).clamp(
            self.config.min_turnover_fraction,
            self.config.max_turnover_fraction,
        )
    }

    /// Run the decay/accumulation simulation over the series.
    ///
    /// Bars are processed in ascending date order (the model is
    /// path-dependent): each bar decays every existing bin by its turnover
    /// fraction, then injects that fraction at the bar's rounded close. The
    /// accumulated map is normalized into an ascending price table with a
    /// running cumulative weight column.
    ///
    /// An empty series yields an empty distribution; so does a zero total
    /// mass (defensively checked, although clamping prevents it).
    pub fn simulate(&self, series: &PriceSeries) -> ChipDistribution {
        let mut levels = ChipLevelMap::new(self.config.price_decimals);

        for bar in series.bars() {
            let turnover = self.clamped_turnover_fraction(bar.turnover_ratio);
            levels.decay(turnover);
            levels.inject(bar.close, turnover);
        }

        debug!(
            "Chip simulation complete: {} bars -> {} price bins (mass {:.6})",
            series.len(),
            levels.len(),
            levels.total_mass()
        );

        levels.into_distribution()
    }

    /// Derive summary statistics from a distribution and a reference price.
    ///
    /// Profit ratio counts bins strictly below the current price (holders
    /// sitting exactly at the current price stay excluded). An empty
    /// distribution yields all-unavailable metrics; a percentile miss
    /// disables only the affected concentration band.
    pub fn metrics(&self, distribution: &ChipDistribution, current_price: f64) -> ChipMetrics {
        if distribution.is_empty() {
            return ChipMetrics::unavailable();
        }

        let profit_ratio = distribution.weight_below(current_price) * 100.0;
        let avg_cost = distribution
            .levels
            .iter()
            .map(|level| level.price * level.weight)
            .sum();

        ChipMetrics {
            profit_ratio: Some(profit_ratio),
            avg_cost: Some(avg_cost),
            concentration_90: Self::concentration(distribution, CONCENTRATION_BANDS[0]),
            concentration_70: Self::concentration(distribution, CONCENTRATION_BANDS[1]),
        }
    }

    /// Normalized spread of the central `central_fraction` of chip mass:
    /// `100 * (pHigh - pLow) / (pHigh + pLow)` where the bounds are the
    /// lowest prices reaching the lower/upper tail thresholds. Comparable
    /// across stocks of different absolute price levels.
    pub fn concentration(distribution: &ChipDistribution, central_fraction: f64) -> Option<f64> {
        let tail = (1.0 - central_fraction) / 2.0;
        let p_low = distribution.percentile_price(tail)?;
        let p_high = distribution.percentile_price(1.0 - tail)?;

        let denominator = p_high + p_low;
        if denominator <= 0.0 {
            return None;
        }
        Some(100.0 * (p_high - p_low) / denominator)
    }
}
