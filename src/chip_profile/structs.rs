use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_price_decimals() -> u32 {
    2
}

fn default_min_turnover_fraction() -> f64 {
    0.001
}

fn default_max_turnover_fraction() -> f64 {
    1.0
}

/// Chip distribution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChipProfileConfig {
    /// Decimal places used to discretize close prices into bins
    #[serde(default = "default_price_decimals")]
    pub price_decimals: u32,
    /// Floor for the per-bar turnover fraction (0.001 = 0.1%). Keeps a
    /// zero-turnover day from preserving prior weight completely untouched
    /// and avoids degenerate decay factors.
    #[serde(default = "default_min_turnover_fraction")]
    pub min_turnover_fraction: f64,
    /// Cap for the per-bar turnover fraction (1.0 = full float turnover)
    #[serde(default = "default_max_turnover_fraction")]
    pub max_turnover_fraction: f64,
}

impl Default for ChipProfileConfig {
    fn default() -> Self {
        Self {
            price_decimals: default_price_decimals(),
            min_turnover_fraction: default_min_turnover_fraction(),
            max_turnover_fraction: default_max_turnover_fraction(),
        }
    }
}

/// Price key for BTreeMap bin identity.
/// Fixed-point integer representation gives exact ordering and stable bin
/// keys for prices rounded to the configured decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriceKey(i64);

impl PriceKey {
    pub fn from_price(price: f64, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        Self((price * scale).round() as i64)
    }

    pub fn to_price(self, decimals: u32) -> f64 {
        let scale = 10f64.powi(decimals as i32);
        self.0 as f64 / scale
    }
}

/// Mutable accumulator for the simulation: rounded price -> unnormalized
/// chip weight. Bins are never removed once created; their weight may decay
/// toward zero.
#[derive(Debug, Clone)]
pub struct ChipLevelMap {
    levels: BTreeMap<PriceKey, f64>,
    decimals: u32,
}

impl ChipLevelMap {
    pub fn new(decimals: u32) -> Self {
        Self {
            levels: BTreeMap::new(),
            decimals,
        }
    }

    /// Decay every existing bin by `(1 - fraction)`: this fraction of all
    /// previously-held positions changed hands today.
    pub fn decay(&mut self, fraction: f64) {
        for weight in self.levels.values_mut() {
            *weight *= 1.0 - fraction;
        }
    }

    /// Add today's buyer cohort at the (rounded) close price.
    pub fn inject(&mut self, price: f64, fraction: f64) {
        let key = PriceKey::from_price(price, self.decimals);
        *self.levels.entry(key).or_insert(0.0) += fraction;
    }

    pub fn total_mass(&self) -> f64 {
        self.levels.values().sum()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Normalize into the output table, ascending by price with a running
    /// cumulative weight column. Zero total mass produces an empty
    /// distribution instead of a division by zero.
    pub fn into_distribution(self) -> ChipDistribution {
        let total_mass = self.total_mass();
        if self.levels.is_empty() || total_mass <= 0.0 {
            return ChipDistribution::empty(self.decimals);
        }

        let mut cumulative = 0.0;
        let levels = self
            .levels
            .iter()
            .map(|(key, &weight)| {
                let normalized = weight / total_mass;
                cumulative += normalized;
                ChipLevelData {
                    price: key.to_price(self.decimals),
                    weight: normalized,
                    cumulative_weight: cumulative,
                }
            })
            .collect();

        ChipDistribution {
            levels,
            total_mass,
            price_decimals: self.decimals,
        }
    }
}

/// One discretized price level in the normalized distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipLevelData {
    /// Price level (rounded to the configured precision)
    pub price: f64,
    /// Fraction of total chip mass whose cost basis sits at this price
    pub weight: f64,
    /// Running sum of weight in ascending price order
    pub cumulative_weight: f64,
}

/// Normalized chip distribution: price levels ascending, weights summing to
/// 1.0, cumulative weight non-decreasing from 0 to 1. Empty `levels` encodes
/// "insufficient data" (empty input series or zero accumulated mass).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChipDistribution {
    pub levels: Vec<ChipLevelData>,
    /// Pre-normalization turnover mass, kept for diagnostics
    pub total_mass: f64,
    /// Decimal precision the bins were rounded to
    pub price_decimals: u32,
}

impl ChipDistribution {
    pub fn empty(price_decimals: u32) -> Self {
        Self {
            levels: Vec::new(),
            total_mass: 0.0,
            price_decimals,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Total weight held strictly below `price`.
    pub fn weight_below(&self, price: f64) -> f64 {
        self.levels
            .iter()
            .take_while(|level| level.price < price)
            .map(|level| level.weight)
            .sum()
    }

    /// Lowest price whose cumulative weight first reaches `threshold`.
    /// `None` when no level reaches it (near-empty or malformed
    /// distribution) - an explicit percentile miss, never a sentinel zero.
    pub fn percentile_price(&self, threshold: f64) -> Option<f64> {
        self.levels
            .iter()
            .find(|level| level.cumulative_weight >= threshold)
            .map(|level| level.price)
    }
}

/// Summary statistics derived from a chip distribution and a reference
/// current price. Each metric is either a finite number or `None` when the
/// underlying distribution cannot support it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChipMetrics {
    /// Percent of chip mass with cost basis strictly below the current price
    pub profit_ratio: Option<f64>,
    /// Weighted mean cost basis, in price units
    pub avg_cost: Option<f64>,
    /// Normalized spread of the central 90% of chip mass, percent
    pub concentration_90: Option<f64>,
    /// Normalized spread of the central 70% of chip mass, percent
    pub concentration_70: Option<f64>,
}

impl ChipMetrics {
    /// All-unavailable marker for empty distributions.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.profit_ratio.is_some() && self.avg_cost.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_key_roundtrip_at_two_decimals() {
        let key = PriceKey::from_price(42.675, 2);
        assert!((key.to_price(2) - 42.68).abs() < 1e-9);

        // Same rounded price maps to the same bin
        assert_eq!(
            PriceKey::from_price(10.004, 2),
            PriceKey::from_price(9.996, 2)
        );
    }

    #[test]
    fn test_level_map_decay_and_inject() {
        let mut map = ChipLevelMap::new(2);
        map.inject(10.0, 0.5);
        map.decay(0.5);
        map.inject(20.0, 0.5);

        assert_eq!(map.len(), 2);
        assert!((map.total_mass() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_bins_survive_decay_to_zero_weight() {
        let mut map = ChipLevelMap::new(2);
        map.inject(10.0, 1.0);
        map.decay(1.0);
        map.inject(20.0, 1.0);

        // The fully decayed bin keeps its key with zero weight
        assert_eq!(map.len(), 2);
        let dist = map.into_distribution();
        assert_eq!(dist.levels.len(), 2);
        assert_eq!(dist.levels[0].weight, 0.0);
        assert_eq!(dist.levels[1].weight, 1.0);
    }

    #[test]
    fn test_distribution_weights_normalize_to_one() {
        let mut map = ChipLevelMap::new(2);
        map.inject(10.0, 0.3);
        map.inject(12.5, 0.9);
        map.inject(11.0, 0.6);
        let dist = map.into_distribution();

        let sum: f64 = dist.levels.iter().map(|level| level.weight).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(dist.levels.iter().all(|level| level.weight >= 0.0));

        // Ascending prices, monotone cumulative weight ending at 1.0
        assert!(dist
            .levels
            .windows(2)
            .all(|w| w[0].price < w[1].price && w[0].cumulative_weight <= w[1].cumulative_weight));
        let last = dist.levels.last().unwrap();
        assert!((last.cumulative_weight - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_map_yields_empty_distribution() {
        let dist = ChipLevelMap::new(2).into_distribution();
        assert!(dist.is_empty());
        assert_eq!(dist.percentile_price(0.05), None);
    }

    #[test]
    fn test_weight_below_is_strict() {
        let mut map = ChipLevelMap::new(2);
        map.inject(10.0, 1.0);
        map.inject(20.0, 1.0);
        let dist = map.into_distribution();

        // The bin exactly at the reference price does not count
        assert!((dist.weight_below(20.0) - 0.5).abs() < 1e-9);
        assert!((dist.weight_below(10.0) - 0.0).abs() < 1e-9);
        assert!((dist.weight_below(25.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_price_lookup() {
        let mut map = ChipLevelMap::new(2);
        for price in [10.0, 20.0, 30.0, 40.0] {
            map.inject(price, 1.0);
        }
        let dist = map.into_distribution();

        assert_eq!(dist.percentile_price(0.05), Some(10.0));
        assert_eq!(dist.percentile_price(0.5), Some(20.0));
        assert_eq!(dist.percentile_price(0.95), Some(40.0));
        assert_eq!(dist.percentile_price(1.5), None);
    }
}
