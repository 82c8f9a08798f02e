use std::path::Path;

use tracing::info;

use crate::config::{Config, SinkMode};
use crate::db::SampleStore;
use crate::error::Result;
use crate::fetcher::{normalize, ChartSource};
use crate::metrics::derive;
use crate::publish::write_csv;
use crate::schema::PUBLISHED_V1;

/// One full pipeline run, strictly sequential: fetch, normalize, (in
/// relational mode) accumulate, derive, publish. Each run recomputes
/// every derived column from the full ordered history.
pub async fn run(cfg: &Config) -> Result<()> {
    let mut source = ChartSource::new();
    let chart = source.latest(cfg).await?;
    let samples = normalize(&chart)?;
    info!(
        "Fetched {} samples for {}/{} over {} days",
        samples.len(),
        cfg.coin_id,
        cfg.vs_currency,
        cfg.lookback_days,
    );

    let history = match cfg.sink_mode {
        SinkMode::Csv => samples,
        SinkMode::Sqlite => {
            let store = SampleStore::connect(&cfg.db_path).await?;
            store.upsert_samples(&samples).await?;
            let history = store.load_all().await?;
            info!(
                "Upserted {} samples, {} accumulated in {}",
                samples.len(),
                history.len(),
                cfg.db_path,
            );
            history
        }
    };

    let rows = derive(&history);
    if rows.is_empty() {
        // Fewer samples than the longest window. Not an error — the
        // published table is simply empty until history accumulates.
        info!(
            "No rows with full rolling history yet ({} samples)",
            history.len()
        );
    }

    write_csv(Path::new(&cfg.csv_path), &rows, &PUBLISHED_V1)?;
    Ok(())
}
