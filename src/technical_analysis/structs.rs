use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Standard daily overlay periods (week, month, quarter, year of sessions)
pub const DEFAULT_MA_PERIODS: [u32; 4] = [5, 20, 60, 250];

/// Incremental simple moving average over a fixed window.
#[derive(Debug, Clone)]
pub struct IncrementalSMA {
    /// Window length in bars
    pub period: u32,
    window: VecDeque<f64>,
    sum: f64,
}

impl IncrementalSMA {
    pub fn new(period: u32) -> Self {
        let period = period.max(1);
        Self {
            period,
            window: VecDeque::with_capacity(period as usize),
            sum: 0.0,
        }
    }

    /// Push a new close and return the updated SMA, `None` until the window
    /// is full.
    pub fn update(&mut self, close: f64) -> Option<f64> {
        self.window.push_back(close);
        self.sum += close;

        if self.window.len() > self.period as usize {
            if let Some(evicted) = self.window.pop_front() {
                self.sum -= evicted;
            }
        }

        if self.window.len() == self.period as usize {
            Some(self.sum / self.period as f64)
        } else {
            None
        }
    }

    pub fn is_ready(&self) -> bool {
        self.window.len() == self.period as usize
    }
}

/// One overlay: period plus per-bar values (`None` during warmup),
/// index-aligned with the input series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovingAverageSeries {
    pub period: u32,
    pub values: Vec<Option<f64>>,
}

/// Full-series SMA overlay for one period.
pub fn sma_series(closes: &[f64], period: u32) -> MovingAverageSeries {
    let mut sma = IncrementalSMA::new(period);
    MovingAverageSeries {
        period,
        values: closes.iter().map(|&close| sma.update(close)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incremental_sma_warmup_and_rolling() {
        let mut sma = IncrementalSMA::new(3);

        assert_eq!(sma.update(1.0), None);
        assert_eq!(sma.update(2.0), None);
        assert!(!sma.is_ready());
        assert_eq!(sma.update(3.0), Some(2.0));
        assert!(sma.is_ready());
        // Window slides: (2 + 3 + 7) / 3
        assert_eq!(sma.update(7.0), Some(4.0));
    }

    #[test]
    fn test_sma_series_alignment() {
        let overlay = sma_series(&[1.0, 2.0, 3.0, 4.0], 2);

        assert_eq!(overlay.period, 2);
        assert_eq!(overlay.values, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }

    #[test]
    fn test_sma_longer_than_series_never_warms_up() {
        let overlay = sma_series(&[1.0, 2.0], 5);
        assert!(overlay.values.iter().all(|value| value.is_none()));
    }
}
