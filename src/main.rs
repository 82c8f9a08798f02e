mod cache;
mod config;
mod db;
mod error;
mod fetcher;
mod metrics;
mod pipeline;
mod publish;
mod schema;
mod types;

use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = pipeline::run(&cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
