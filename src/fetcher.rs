use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::debug;

use crate::cache::TtlCache;
use crate::config::{Config, FETCH_TTL_SECS, REQUEST_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::types::MarketSample;

/// Wire shape of the market-chart endpoint: three parallel arrays of
/// `[timestamp_ms, value]` pairs sharing one timestamp axis.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketChart {
    pub prices: Vec<(i64, f64)>,
    pub market_caps: Vec<(i64, f64)>,
    pub total_volumes: Vec<(i64, f64)>,
}

/// Market-chart source with a TTL cache in front of the network call,
/// keyed by request URL. A one-shot batch run always starts cold; the
/// cache earns its keep when the source is embedded in a longer-lived
/// host that polls more often than the upstream refreshes.
pub struct ChartSource {
    cache: TtlCache<MarketChart>,
}

impl ChartSource {
    pub fn new() -> Self {
        Self {
            cache: TtlCache::new(Duration::from_secs(FETCH_TTL_SECS)),
        }
    }

    /// The latest market chart for this configuration, from cache when
    /// still fresh, otherwise via a fresh fetch.
    pub async fn latest(&mut self, cfg: &Config) -> Result<MarketChart> {
        let url = cfg.market_chart_url();
        let now = Instant::now();
        if let Some(chart) = self.cache.get_fresh(&url, now) {
            debug!("market chart for {url} still fresh, skipping fetch");
            return Ok(chart.clone());
        }
        let chart = fetch_market_chart(cfg).await?;
        self.cache.put(&url, chart.clone(), now);
        Ok(chart)
    }
}

impl Default for ChartSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Perform the single market-chart request for this run. Any non-2xx
/// status or transport failure aborts the run — no retry, no backoff.
pub async fn fetch_market_chart(cfg: &Config) -> Result<MarketChart> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?;

    let url = cfg.market_chart_url();
    debug!("GET {url}");

    let resp = client.get(&url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(AppError::Fetch {
            status: status.as_u16(),
            url,
        });
    }

    let body = resp.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Zip the three series into one row per timestamp.
///
/// The source API documents a shared timestamp axis but the original
/// consumer zipped positionally without checking; here misalignment is a
/// hard error instead of silently producing crossed rows. Output is
/// sorted ascending with duplicate timestamps collapsed (last wins).
pub fn normalize(chart: &MarketChart) -> Result<Vec<MarketSample>> {
    let n = chart.prices.len();
    if chart.market_caps.len() != n || chart.total_volumes.len() != n {
        return Err(AppError::DataShape(format!(
            "series length mismatch: prices={} market_caps={} total_volumes={}",
            n,
            chart.market_caps.len(),
            chart.total_volumes.len(),
        )));
    }

    let mut samples = Vec::with_capacity(n);
    for (i, &(ts, price)) in chart.prices.iter().enumerate() {
        let (cap_ts, market_cap) = chart.market_caps[i];
        let (vol_ts, total_volume) = chart.total_volumes[i];
        if cap_ts != ts || vol_ts != ts {
            return Err(AppError::DataShape(format!(
                "timestamp axis mismatch at index {i}: prices={ts} market_caps={cap_ts} total_volumes={vol_ts}"
            )));
        }
        samples.push(MarketSample {
            timestamp: ts,
            price,
            market_cap,
            total_volume,
        });
    }

    samples.sort_by_key(|s| s.timestamp);
    // Stable sort keeps arrival order within a timestamp; keep the last.
    samples.dedup_by(|next, prev| {
        if next.timestamp == prev.timestamp {
            *prev = *next;
            true
        } else {
            false
        }
    });

    Ok(samples)
}
