use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw samples
// ---------------------------------------------------------------------------

/// One observed data point: price, market cap and trailing volume at a
/// single timestamp. `timestamp` is milliseconds since epoch and is the
/// unique key — re-ingesting a known timestamp replaces the prior row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSample {
    pub timestamp: i64,
    pub price: f64,
    pub market_cap: f64,
    pub total_volume: f64,
}

// ---------------------------------------------------------------------------
// Derived rows
// ---------------------------------------------------------------------------

/// A sample extended with its rolling statistics. Only materialized once
/// every derived value is defined, so there are no sentinel/NaN fields —
/// rows without enough trailing history are simply never produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub timestamp: i64,
    pub price: f64,
    pub market_cap: f64,
    pub total_volume: f64,
    /// Percentage change in price vs the previous sample.
    pub returns: f64,
    /// Sample standard deviation of `returns` over the trailing 7 samples.
    pub volatility: f64,
    pub ma_7: f64,
    pub ma_21: f64,
}
