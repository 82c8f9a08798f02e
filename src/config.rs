use crate::error::{AppError, Result};

pub const API_URL: &str = "https://api.coingecko.com/api/v3";

/// Fixed timeout on the market-chart request. Abort on expiry, no retry.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Trailing window for the short moving average and for volatility.
pub const SHORT_WINDOW: usize = 7;

/// Trailing window for the long moving average.
pub const LONG_WINDOW: usize = 21;

/// How long a cached market-chart response stays fresh (seconds).
/// Matches the 30-minute refresh cap the dashboard applies on its side.
pub const FETCH_TTL_SECS: u64 = 1800;

/// Where the published table is written. Overwritten wholesale each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// In-memory table per run, published straight to CSV. No history
    /// survives across runs beyond the overwritten output file.
    Csv,
    /// Raw samples are upserted into SQLite keyed by timestamp, so
    /// repeated runs accumulate history past the API's lookback window.
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    /// CoinGecko coin id, e.g. "bitcoin" (COIN_ID)
    pub coin_id: String,
    /// Quote currency for prices (VS_CURRENCY)
    pub vs_currency: String,
    /// Lookback window in days passed to the API (LOOKBACK_DAYS)
    pub lookback_days: u32,
    pub sink_mode: SinkMode,
    pub csv_path: String,
    pub db_path: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let sink_mode = match std::env::var("SINK_MODE")
            .unwrap_or_else(|_| "csv".to_string())
            .to_lowercase()
            .as_str()
        {
            "csv" => SinkMode::Csv,
            "sqlite" => SinkMode::Sqlite,
            other => {
                return Err(AppError::Config(format!(
                    "SINK_MODE must be 'csv' or 'sqlite', got '{other}'"
                )))
            }
        };

        Ok(Self {
            api_url: std::env::var("API_URL").unwrap_or_else(|_| API_URL.to_string()),
            coin_id: std::env::var("COIN_ID").unwrap_or_else(|_| "bitcoin".to_string()),
            vs_currency: std::env::var("VS_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
            lookback_days: std::env::var("LOOKBACK_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u32>()
                .map_err(|_| {
                    AppError::Config("LOOKBACK_DAYS must be a positive integer".to_string())
                })?,
            sink_mode,
            csv_path: std::env::var("CSV_PATH")
                .unwrap_or_else(|_| "data/bitcoin_market_data.csv".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "tracker.db".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Full market-chart request URL for this configuration.
    pub fn market_chart_url(&self) -> String {
        format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            self.api_url, self.coin_id, self.vs_currency, self.lookback_days
        )
    }
}
