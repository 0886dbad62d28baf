//! Read a written topic CSV back into a `WideTable`.
//!
//! The first header must be `GEOID`; `NAME` is kept as the label column and
//! the WKT `geometry` column is dropped. Every other column is a value column
//! with its cells left as text.

use std::path::Path;

use csv::StringRecord;

use crate::domain::{Column, GEOID, GEOMETRY, NAME, WideTable};
use crate::error::AppError;

pub fn read_topic_csv(path: &Path) -> Result<WideTable, AppError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AppError::input_read(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| AppError::input_read(format!("Failed to read CSV headers in '{}': {e}", path.display())))?
        .clone();
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();

    if names.first().map(String::as_str) != Some(GEOID) {
        return Err(AppError::input_read(format!(
            "CSV '{}' does not start with a {GEOID} column.",
            path.display()
        )));
    }

    let mut id = Column::new(GEOID, Vec::new());
    let mut label = names.iter().any(|n| n == NAME).then(|| Column::new(NAME, Vec::new()));
    let mut columns: Vec<(usize, Column)> = names
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, n)| n.as_str() != NAME && n.as_str() != GEOMETRY)
        .map(|(i, n)| (i, Column::new(n.clone(), Vec::new())))
        .collect();
    let name_idx = names.iter().position(|n| n == NAME);

    let mut record = StringRecord::new();
    loop {
        let more = reader.read_record(&mut record).map_err(|e| {
            AppError::input_read(format!("Failed to read CSV row in '{}': {e}", path.display()))
        })?;
        if !more {
            break;
        }
        id.values.push(cell(&record, 0));
        if let (Some(label), Some(i)) = (label.as_mut(), name_idx) {
            label.values.push(cell(&record, i));
        }
        for (i, column) in columns.iter_mut() {
            column.values.push(cell(&record, *i));
        }
    }

    Ok(WideTable {
        id,
        label,
        columns: columns.into_iter().map(|(_, c)| c).collect(),
        geometry: None,
    })
}

fn cell(record: &StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or("").to_string()
}

// Excel-saved files can carry a UTF-8 BOM on the first header.
fn normalize_header_name(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_string()
}
