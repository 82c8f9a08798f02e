use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetch failed with status {status} for {url}")]
    Fetch { status: u16, url: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed market chart: {0}")]
    DataShape(String),

    #[error("Schema contract violation: {0}")]
    Schema(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
