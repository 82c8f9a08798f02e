use crate::error::{AppError, Result};

/// Named, versioned column set shared by the producer and any consumer of
/// the published table. Both sides validate against the same contract at
/// the boundary, so a renamed or reordered column fails fast instead of
/// surfacing as a missing-column panic deep inside the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaContract {
    pub name: &'static str,
    pub version: u32,
    pub columns: &'static [&'static str],
}

/// Version 1 of the published market-metrics table. Column order is part
/// of the contract.
pub const PUBLISHED_V1: SchemaContract = SchemaContract {
    name: "market_metrics",
    version: 1,
    columns: &[
        "timestamp",
        "price",
        "market_cap",
        "total_volume",
        "returns",
        "volatility",
        "ma_7",
        "ma_21",
    ],
};

impl SchemaContract {
    /// Check a header row against the contract, reporting the first
    /// mismatch by position and name.
    pub fn validate_header<S: AsRef<str>>(&self, header: &[S]) -> Result<()> {
        if header.len() != self.columns.len() {
            return Err(AppError::Schema(format!(
                "{} v{}: expected {} columns, found {}",
                self.name,
                self.version,
                self.columns.len(),
                header.len(),
            )));
        }
        for (i, (found, expected)) in header.iter().zip(self.columns).enumerate() {
            if found.as_ref() != *expected {
                return Err(AppError::Schema(format!(
                    "{} v{}: column {i} is '{}', expected '{expected}'",
                    self.name,
                    self.version,
                    found.as_ref(),
                )));
            }
        }
        Ok(())
    }
}
