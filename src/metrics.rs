use tracing::debug;

use crate::config::{LONG_WINDOW, SHORT_WINDOW};
use crate::types::{MarketSample, MetricRow};

/// Derive rolling statistics over the full sample history.
///
/// Pure function of the whole sample set, recomputed from scratch on every
/// run. Ordering is re-established here (sort ascending, duplicates
/// collapsed) because relational-mode callers give no arrival-order
/// guarantee. Rows without enough trailing history for every statistic are
/// dropped, so with the 21-sample long window the first 20 rows never
/// appear in the output; fewer than 21 samples yields an empty table.
pub fn derive(samples: &[MarketSample]) -> Vec<MetricRow> {
    let mut ordered: Vec<MarketSample> = samples.to_vec();
    ordered.sort_by_key(|s| s.timestamp);
    ordered.dedup_by(|next, prev| {
        if next.timestamp == prev.timestamp {
            *prev = *next;
            true
        } else {
            false
        }
    });

    let n = ordered.len();
    let prices: Vec<f64> = ordered.iter().map(|s| s.price).collect();
    let returns = pct_returns(&prices);

    // returns starts at index 1, so a volatility window of SHORT_WINDOW
    // returns values is first complete at index SHORT_WINDOW; the long
    // moving average is the binding constraint for the default windows.
    let first_valid = (LONG_WINDOW - 1).max(SHORT_WINDOW);

    let mut rows = Vec::with_capacity(n.saturating_sub(first_valid));
    for i in first_valid..n {
        let s = ordered[i];
        rows.push(MetricRow {
            timestamp: s.timestamp,
            price: s.price,
            market_cap: s.market_cap,
            total_volume: s.total_volume,
            returns: returns[i - 1],
            volatility: sample_std(&returns[i - SHORT_WINDOW..i]),
            ma_7: mean(&prices[i + 1 - SHORT_WINDOW..=i]),
            ma_21: mean(&prices[i + 1 - LONG_WINDOW..=i]),
        });
    }

    debug!(
        "derived {} metric rows from {} samples ({} trimmed for missing history)",
        rows.len(),
        n,
        n - rows.len(),
    );
    rows
}

/// Percentage change between consecutive prices. `out[i]` is the return of
/// `prices[i + 1]` vs `prices[i]`, so the result is one shorter than the
/// input (the first sample has no return).
fn pct_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0] * 100.0)
        .collect()
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (N-1 denominator), matching the convention
/// of the original pipeline's statistics library.
fn sample_std(xs: &[f64]) -> f64 {
    let m = mean(xs);
    let variance = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn samples_from_prices(prices: &[f64]) -> Vec<MarketSample> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| MarketSample {
                timestamp: 1_700_000_000_000 + i as i64 * 3_600_000,
                price,
                market_cap: price * 1e7,
                total_volume: price * 1e5,
            })
            .collect()
    }

    #[test]
    fn returns_formula() {
        let r = pct_returns(&[100.0, 110.0, 121.0]);
        assert!((r[0] - 10.0).abs() < EPS);
        assert!((r[1] - 10.0).abs() < EPS);
    }

    #[test]
    fn sample_std_uses_n_minus_1() {
        // Variance of [1, 2, 3, 4] around mean 2.5 is 5.0 / 3 with the
        // sample convention.
        let s = sample_std(&[1.0, 2.0, 3.0, 4.0]);
        assert!((s - (5.0_f64 / 3.0).sqrt()).abs() < EPS);
    }

    #[test]
    fn too_little_history_yields_empty_output() {
        let samples = samples_from_prices(&[100.0, 101.0, 102.0]);
        assert!(derive(&samples).is_empty());

        // 20 samples is still one short of the long window.
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert!(derive(&samples_from_prices(&prices)).is_empty());
    }

    #[test]
    fn first_row_appears_at_the_long_window() {
        let prices: Vec<f64> = (1..=25).map(|i| i as f64).collect();
        let samples = samples_from_prices(&prices);
        let rows = derive(&samples);
        assert_eq!(rows.len(), 25 - 20);

        // First retained row is the 21st sample (price 21.0).
        let first = rows[0];
        assert_eq!(first.price, 21.0);
        assert!((first.returns - (21.0 - 20.0) / 20.0 * 100.0).abs() < EPS);
        assert!((first.ma_7 - 18.0).abs() < EPS); // mean of 15..=21
        assert!((first.ma_21 - 11.0).abs() < EPS); // mean of 1..=21
        assert!(first.volatility > 0.0);
    }

    #[test]
    fn constant_price_has_zero_returns_and_volatility() {
        let samples = samples_from_prices(&[50_000.0; 30]);
        let rows = derive(&samples);
        assert_eq!(rows.len(), 10);
        for row in &rows {
            assert!(row.returns.abs() < EPS);
            assert!(row.volatility.abs() < EPS);
            assert!((row.ma_7 - 50_000.0).abs() < EPS);
            assert!((row.ma_21 - 50_000.0).abs() < EPS);
        }
    }

    #[test]
    fn output_is_sorted_with_unique_timestamps_regardless_of_input_order() {
        let prices: Vec<f64> = (1..=30).map(|i| 100.0 + i as f64).collect();
        let mut samples = samples_from_prices(&prices);
        samples.reverse();
        // Duplicate of a timestamp late enough to survive the history
        // trim; the later entry must win.
        let mut dup = samples[3];
        dup.price += 5.0;
        samples.push(dup);

        let rows = derive(&samples);
        assert!(!rows.is_empty());
        for pair in rows.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
        let replaced = rows
            .iter()
            .find(|r| r.timestamp == dup.timestamp)
            .expect("duplicated timestamp should survive once");
        assert_eq!(replaced.price, dup.price);
    }

    #[test]
    fn rolling_means_match_trailing_windows_everywhere() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64).sin() * 10.0).collect();
        let samples = samples_from_prices(&prices);
        let rows = derive(&samples);
        assert_eq!(rows.len(), 40 - 20);

        for (k, row) in rows.iter().enumerate() {
            let i = k + 20;
            let ma_7: f64 = prices[i + 1 - 7..=i].iter().sum::<f64>() / 7.0;
            let ma_21: f64 = prices[i + 1 - 21..=i].iter().sum::<f64>() / 21.0;
            assert!((row.ma_7 - ma_7).abs() < EPS);
            assert!((row.ma_21 - ma_21).abs() < EPS);
            let expected_ret = (prices[i] - prices[i - 1]) / prices[i - 1] * 100.0;
            assert!((row.returns - expected_ret).abs() < EPS);
        }
    }
}
