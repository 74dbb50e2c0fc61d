use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use chip_feeder::chip_profile::{
    ChipDistribution, ChipDistributionCalculator, ChipMetrics, ChipProfileConfig,
};
use chip_feeder::logging::{cleanup_old_logs, init_dual_logging, LogRotation, LoggingConfig};
use chip_feeder::series::{load_daily_history, normalize};
use chip_feeder::technical_analysis::{sma_series, MovingAverageSeries, DEFAULT_MA_PERIODS};

/// Application configuration from config.toml
#[derive(Debug, Clone, Deserialize)]
struct ApplicationConfig {
    /// Daily history CSV (date, close, optional turnover_ratio)
    pub history_path: String,
    /// Restrict the simulation to the most recent N bars
    pub lookback_days: Option<usize>,
    /// Reference price for the metrics; defaults to the last close
    pub current_price: Option<f64>,
    /// Report destination; stdout when unset
    pub output_path: Option<String>,
    /// Moving-average overlay periods
    pub ma_periods: Option<Vec<u32>>,
}

/// Logging configuration from config.toml
#[derive(Debug, Clone, Deserialize)]
struct LoggingTomlConfig {
    pub log_dir: Option<String>,
    pub level_filter: Option<String>,
    pub rotation: Option<String>, // "daily" or "hourly"
    pub console_timestamps: Option<bool>,
    pub file_json_format: Option<bool>,
    pub cleanup_days: Option<u32>,
}

/// Full TOML configuration structure
#[derive(Debug, Clone, Deserialize)]
struct TomlConfig {
    pub application: ApplicationConfig,
    pub chip: Option<ChipProfileConfig>,
    pub logging: Option<LoggingTomlConfig>,
}

/// Runtime configuration (converted from TOML)
#[derive(Debug, Clone)]
struct ChipFeederConfig {
    pub history_path: PathBuf,
    pub lookback_days: usize,
    pub current_price: Option<f64>,
    pub output_path: Option<PathBuf>,
    pub ma_periods: Vec<u32>,
    pub chip_config: ChipProfileConfig,
    pub logging_config: LoggingConfig,
    pub log_cleanup_days: u32,
}

impl Default for ChipFeederConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("data/history.csv"),
            lookback_days: 500,
            current_price: None,
            output_path: None,
            ma_periods: DEFAULT_MA_PERIODS.to_vec(),
            chip_config: ChipProfileConfig::default(),
            logging_config: LoggingConfig::default(),
            log_cleanup_days: 30,
        }
    }
}

impl ChipFeederConfig {
    /// Load configuration from a config.toml file
    pub fn from_toml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let config_content = std::fs::read_to_string(path)?;
        let toml_config: TomlConfig = toml::from_str(&config_content)?;

        Ok(Self::from_toml_config(toml_config))
    }

    /// Convert TOML configuration with per-section defaulting
    fn from_toml_config(toml_config: TomlConfig) -> Self {
        let defaults = Self::default();

        let (logging_config, log_cleanup_days) = if let Some(log_config) = toml_config.logging {
            let rotation = log_config
                .rotation
                .map(|r| match r.as_str() {
                    "hourly" => LogRotation::Hourly,
                    _ => LogRotation::Daily,
                })
                .unwrap_or(LogRotation::Daily);

            let config = LoggingConfig {
                log_dir: log_config.log_dir.unwrap_or_else(|| "logs".to_string()),
                level_filter: log_config
                    .level_filter
                    .unwrap_or_else(|| "info,chip_feeder=info".to_string()),
                rotation,
                console_timestamps: log_config.console_timestamps.unwrap_or(true),
                file_json_format: log_config.file_json_format.unwrap_or(true),
            };
            (config, log_config.cleanup_days.unwrap_or(30))
        } else {
            (LoggingConfig::default(), 30)
        };

        Self {
            history_path: PathBuf::from(toml_config.application.history_path),
            lookback_days: toml_config
                .application
                .lookback_days
                .unwrap_or(defaults.lookback_days),
            current_price: toml_config.application.current_price,
            output_path: toml_config.application.output_path.map(PathBuf::from),
            ma_periods: toml_config
                .application
                .ma_periods
                .unwrap_or_else(|| DEFAULT_MA_PERIODS.to_vec()),
            chip_config: toml_config.chip.unwrap_or_default(),
            logging_config,
            log_cleanup_days,
        }
    }
}

/// Report envelope for the presentation/export collaborators
#[derive(Debug, Serialize)]
struct ChipReport {
    generated_at: String,
    history_bars: usize,
    current_price: Option<f64>,
    metrics: ChipMetrics,
    distribution: ChipDistribution,
    moving_averages: Vec<MovingAverageSeries>,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let (config, config_fallback) = match ChipFeederConfig::from_toml(&config_path) {
        Ok(config) => (config, None),
        Err(err) => (ChipFeederConfig::default(), Some(err.to_string())),
    };

    let _log_guard = init_dual_logging(config.logging_config.clone())?;
    if let Some(reason) = config_fallback {
        warn!(
            "Could not load {}: {} - falling back to built-in defaults",
            config_path, reason
        );
    }
    if let Err(err) = cleanup_old_logs(&config.logging_config.log_dir, config.log_cleanup_days) {
        warn!("Log cleanup failed: {}", err);
    }

    info!(
        "🚀 Starting chip_feeder: history {:?}, lookback {} bars",
        config.history_path, config.lookback_days
    );

    let raw_rows = load_daily_history(&config.history_path)?;
    let series = normalize(raw_rows).tail(config.lookback_days);
    if series.is_empty() {
        warn!(
            "Insufficient data: no usable bars in {:?}",
            config.history_path
        );
    }

    let calculator = ChipDistributionCalculator::new(config.chip_config.clone());
    let distribution = calculator.simulate(&series);
    let current_price = config.current_price.or_else(|| series.last_close());
    let metrics = match current_price {
        Some(price) => calculator.metrics(&distribution, price),
        None => ChipMetrics::unavailable(),
    };

    match (metrics.profit_ratio, metrics.avg_cost) {
        (Some(profit_ratio), Some(avg_cost)) => info!(
            "Chip metrics: profit ratio {:.2}%, average cost {:.2}",
            profit_ratio, avg_cost
        ),
        _ => warn!("Chip metrics unavailable - rendering 'insufficient data' report"),
    }

    let closes = series.closes();
    let moving_averages = config
        .ma_periods
        .iter()
        .map(|&period| sma_series(&closes, period))
        .collect();

    let report = ChipReport {
        generated_at: Utc::now().to_rfc3339(),
        history_bars: series.len(),
        current_price,
        metrics,
        distribution,
        moving_averages,
    };

    let rendered = serde_json::to_string_pretty(&report)?;
    match &config.output_path {
        Some(path) => {
            std::fs::write(path, rendered)?;
            info!("Report written to {:?}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_config_parsing_with_all_sections() {
        let toml_str = r#"
            [application]
            history_path = "data/603909.csv"
            lookback_days = 250
            current_price = 12.34
            ma_periods = [5, 20]

            [chip]
            price_decimals = 1

            [logging]
            log_dir = "custom_logs"
            rotation = "hourly"
            cleanup_days = 7
        "#;

        let toml_config: TomlConfig = toml::from_str(toml_str).unwrap();
        let config = ChipFeederConfig::from_toml_config(toml_config);

        assert_eq!(config.history_path, PathBuf::from("data/603909.csv"));
        assert_eq!(config.lookback_days, 250);
        assert_eq!(config.current_price, Some(12.34));
        assert_eq!(config.ma_periods, vec![5, 20]);
        assert_eq!(config.chip_config.price_decimals, 1);
        assert_eq!(config.chip_config.min_turnover_fraction, 0.001);
        assert_eq!(config.logging_config.log_dir, "custom_logs");
        assert_eq!(config.log_cleanup_days, 7);
    }

    #[test]
    fn test_toml_config_minimal_sections_fall_back_to_defaults() {
        let toml_str = r#"
            [application]
            history_path = "history.csv"
        "#;

        let toml_config: TomlConfig = toml::from_str(toml_str).unwrap();
        let config = ChipFeederConfig::from_toml_config(toml_config);

        assert_eq!(config.lookback_days, 500);
        assert_eq!(config.current_price, None);
        assert_eq!(config.ma_periods, DEFAULT_MA_PERIODS.to_vec());
        assert_eq!(config.chip_config.price_decimals, 2);
        assert_eq!(config.log_cleanup_days, 30);
    }
}
