//! Margin filtering and column renaming.
//!
//! Turns a provider table (`GEOID, NAME, B02001_001E, B02001_001M, ...`) into
//! a topic table (`GEOID, NAME, Total_race, White alone_race, ...`):
//!
//! 1. drop margin-of-error columns
//! 2. strip the estimate suffix to recover the variable code
//! 3. look the code up in the catalog
//! 4. name the column `<display name>_<topic>`
//!
//! Renaming depends only on column names, the topic and the catalog. The
//! identifier, display-name and geometry columns pass through untouched.

use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::domain::{ValueColumn, WideTable, is_margin_column};
use crate::error::AppError;

/// Output column name for a display name under a topic.
pub fn compose_column_name(display_name: &str, topic: &str) -> String {
    format!("{display_name}_{topic}")
}

/// Remove every margin-of-error column, keeping the rest in order.
pub fn drop_margins(table: WideTable) -> WideTable {
    let WideTable {
        id,
        label,
        columns,
        geometry,
    } = table;
    let columns = columns
        .into_iter()
        .filter(|c| !is_margin_column(&c.name))
        .collect();
    WideTable {
        id,
        label,
        columns,
        geometry,
    }
}

/// Translate a value column name to its topic column name.
pub fn rename_column(name: &str, topic: &str, catalog: &Catalog) -> Result<String, AppError> {
    let parsed = ValueColumn::parse(name).ok_or_else(|| {
        AppError::unknown_variable_code(format!(
            "Column `{name}` is not a `<code>E`/`<code>M` value column."
        ))
    })?;

    let entry = catalog.get(parsed.code).ok_or_else(|| {
        AppError::unknown_variable_code(format!(
            "Variable code {} (column `{name}`) is not in the {} {} catalog.",
            parsed.code,
            catalog.vintage(),
            catalog.survey()
        ))
    })?;

    let display = entry.display_name();
    if display.is_empty() {
        return Err(AppError::unknown_variable_code(format!(
            "Variable code {} has no display name (label `{}`).",
            parsed.code, entry.label
        )));
    }

    Ok(compose_column_name(display, topic))
}

/// Drop margins and rename every remaining value column for `topic`.
pub fn rename_and_filter(table: WideTable, topic: &str, catalog: &Catalog) -> Result<WideTable, AppError> {
    let mut table = drop_margins(table);

    let mut seen: HashSet<String> = HashSet::with_capacity(table.columns.len() + 2);
    seen.insert(table.id.name.clone());
    if let Some(label) = &table.label {
        seen.insert(label.name.clone());
    }

    for column in &mut table.columns {
        let renamed = rename_column(&column.name, topic, catalog)?;
        if !seen.insert(renamed.clone()) {
            return Err(AppError::duplicate_column_name(format!(
                "Column `{}` renames to `{renamed}`, which already exists in topic `{topic}`.",
                column.name
            )));
        }
        column.name = renamed;
    }

    Ok(table)
}
