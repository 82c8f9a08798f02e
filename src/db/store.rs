use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;
use crate::types::MarketSample;

/// Database row type for the raw-sample table. Used by sqlx for typed
/// queries; kept separate from the domain type so schema changes stay
/// local to this module.
#[derive(Debug, sqlx::FromRow)]
struct SampleRow {
    timestamp: i64,
    price: f64,
    market_cap: f64,
    total_volume: f64,
}

impl From<SampleRow> for MarketSample {
    fn from(row: SampleRow) -> Self {
        MarketSample {
            timestamp: row.timestamp,
            price: row.price,
            market_cap: row.market_cap,
            total_volume: row.total_volume,
        }
    }
}

/// Durable sample store for relational sink mode. Keyed by timestamp so
/// repeated runs with overlapping fetch windows accumulate one row per
/// observation instead of appending duplicates.
pub struct SampleStore {
    pool: SqlitePool,
}

impl SampleStore {
    /// Open (creating if missing) the database file and ensure the
    /// sample table exists.
    pub async fn connect(db_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS market_samples (
                timestamp    INTEGER PRIMARY KEY,
                price        REAL NOT NULL,
                market_cap   REAL NOT NULL,
                total_volume REAL NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        info!("Database ready at {db_path}");
        Ok(Self { pool })
    }

    /// Insert-or-replace each sample keyed by timestamp. Row-by-row with
    /// no spanning transaction: an interrupted run leaves the rows written
    /// so far, which the next run's upsert reconciles.
    pub async fn upsert_samples(&self, samples: &[MarketSample]) -> Result<()> {
        for s in samples {
            sqlx::query(
                r#"
                INSERT INTO market_samples (timestamp, price, market_cap, total_volume)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(timestamp) DO UPDATE SET
                    price = excluded.price,
                    market_cap = excluded.market_cap,
                    total_volume = excluded.total_volume
                "#,
            )
            .bind(s.timestamp)
            .bind(s.price)
            .bind(s.market_cap)
            .bind(s.total_volume)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Full accumulated history, ascending by timestamp.
    pub async fn load_all(&self) -> Result<Vec<MarketSample>> {
        let rows: Vec<SampleRow> = sqlx::query_as(
            "SELECT timestamp, price, market_cap, total_volume
             FROM market_samples ORDER BY timestamp ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MarketSample::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(ts: i64, price: f64) -> MarketSample {
        MarketSample {
            timestamp: ts,
            price,
            market_cap: price * 1e7,
            total_volume: price * 1e5,
        }
    }

    #[tokio::test]
    async fn overlapping_ingests_deduplicate_by_timestamp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.db");
        let store = SampleStore::connect(path.to_str().unwrap()).await.unwrap();

        store
            .upsert_samples(&[sample(1000, 100.0), sample(2000, 101.0), sample(3000, 102.0)])
            .await
            .unwrap();
        // Second run overlaps the first window and revises one price.
        store
            .upsert_samples(&[sample(2000, 150.0), sample(3000, 102.0), sample(4000, 103.0)])
            .await
            .unwrap();

        let all = store.load_all().await.unwrap();
        let timestamps: Vec<i64> = all.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![1000, 2000, 3000, 4000]);
        assert_eq!(all[1].price, 150.0);
    }

    #[tokio::test]
    async fn history_survives_reconnect() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.db");

        {
            let store = SampleStore::connect(path.to_str().unwrap()).await.unwrap();
            store.upsert_samples(&[sample(1000, 100.0)]).await.unwrap();
        }

        let store = SampleStore::connect(path.to_str().unwrap()).await.unwrap();
        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].price, 100.0);
    }

    #[tokio::test]
    async fn empty_store_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.db");
        let store = SampleStore::connect(path.to_str().unwrap()).await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }
}
