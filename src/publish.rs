use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::schema::SchemaContract;
use crate::types::MetricRow;

/// Write the published table: header row from the schema contract, one
/// data row per metric row, overwriting any previous table wholesale.
///
/// The table is staged to a sibling temp file and renamed into place, so
/// a run that dies mid-write never leaves a partial table for the
/// dashboard to pick up.
pub fn write_csv(path: &Path, rows: &[MetricRow], contract: &SchemaContract) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("csv.tmp");
    {
        let file = fs::File::create(&tmp_path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(contract.columns)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;

    info!(
        "published {} rows to {} ({} v{})",
        rows.len(),
        path.display(),
        contract.name,
        contract.version,
    );
    Ok(())
}

/// Load a published table, validating the header against the contract
/// before touching any row. This is the consumer-side boundary check: a
/// producer/consumer column drift fails here, by name, not on first
/// access of a missing column somewhere in the dashboard.
pub fn read_csv(path: &Path, contract: &SchemaContract) -> Result<Vec<MetricRow>> {
    let file = fs::File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let header: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
    contract.validate_header(&header)?;

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}
