//! CSV export of raw attack records

use super::OutputError;
use crate::models::record::bool_token;
use crate::models::AttackRecord;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One exported row; values are written unmasked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "IsBot")]
    pub is_bot: String,
}

impl From<&AttackRecord> for CsvRow {
    fn from(record: &AttackRecord) -> Self {
        CsvRow {
            timestamp: record.timestamp_text(),
            ip: record.source_ip.clone(),
            username: record.username.clone(),
            password: record.password.clone(),
            is_bot: bool_token(record.is_bot).to_string(),
        }
    }
}

/// Write `records` as CSV with a header row
pub fn write_csv<W: Write>(records: &[AttackRecord], writer: W) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_writer(writer);
    if records.is_empty() {
        writer.write_record(["Timestamp", "IP", "Username", "Password", "IsBot"])?;
    }
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Export `records` to a CSV file, replacing any existing file
pub fn export_csv(records: &[AttackRecord], path: &Path) -> Result<(), OutputError> {
    let file = File::create(path)?;
    write_csv(records, file)?;
    log::info!("Exported {} record(s) to {:?}", records.len(), path);
    Ok(())
}
