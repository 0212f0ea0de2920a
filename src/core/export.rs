//! CSV export of the canonical portfolio
//!
//! Output is spreadsheet-friendly for pt-BR locales: `;` delimiter, every
//! field quoted, dates as dd/mm/yyyy and a UTF-8 byte-order mark.

use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;

use crate::core::catalog::{business_model_label, CRITERIA};
use crate::entities::record::Record;

/// Download file name
pub const FILE_NAME: &str = "ideas_prioritized.csv";

const BOM: &str = "\u{feff}";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("There is no data to export")]
    Empty,

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Header row in column order
pub fn headers() -> Vec<String> {
    let mut headers: Vec<String> = [
        "ID",
        "Name",
        "Description",
        "Target Audience",
        "Cluster",
        "Business Model",
        "Status",
        "Creator",
        "Creation Date",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    headers.extend(CRITERIA.iter().map(|c| c.title.to_string()));
    headers.push("Revenue Estimate".to_string());
    headers.push("Total".to_string());
    headers
}

/// One data row in header order
pub fn row(record: &Record) -> Vec<String> {
    let mut row = vec![
        record.id.to_string(),
        record.name.clone(),
        record.description.clone(),
        record.target_audience.clone(),
        record.cluster.clone(),
        business_model_label(&record.business_model),
        record.status().label().to_string(),
        record.creator_name.clone(),
        record
            .creation_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default(),
    ];
    row.extend(record.scores.as_slice().iter().map(|s| s.to_string()));
    row.push(record.revenue_estimate.to_string());
    row.push(record.total().to_string());
    row
}

/// Serialize records, BOM included
pub fn to_csv(records: &[Record]) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(BOM.as_bytes().to_vec());

    writer.write_record(headers())?;
    for record in records {
        writer.write_record(row(record))?;
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Write the export to `path`; an empty portfolio is refused
pub fn write_file(records: &[Record], path: &Path) -> Result<usize, ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }
    let contents = to_csv(records)?;
    std::fs::write(path, contents)?;
    tracing::info!(path = %path.display(), rows = records.len(), "exported portfolio");
    Ok(records.len())
}
