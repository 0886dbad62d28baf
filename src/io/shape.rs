//! Write the boundary extract as an ESRI shapefile.
//!
//! Produces `<stem>.shp`, `<stem>.shx` and `<stem>.dbf` (attributes `GEOID`,
//! `NAME`), plus `<stem>.prj` when the source projection is known.

use std::fs;
use std::path::Path;

use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use tracing::warn;

use crate::boundary::BoundaryExtract;
use crate::domain::{GEOID, NAME};
use crate::error::AppError;

const GEOID_WIDTH: u8 = 12;
const NAME_WIDTH: u8 = 254;

/// Counts from one shapefile write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShapeWriteSummary {
    pub written: usize,
    pub skipped: usize,
}

pub fn write_boundary_shp(path: &Path, extract: &BoundaryExtract) -> Result<ShapeWriteSummary, AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::output_write(format!("Failed to create '{}': {e}", parent.display()))
        })?;
    }

    let table = TableWriterBuilder::new()
        .add_character_field(field_name(GEOID)?, GEOID_WIDTH)
        .add_character_field(field_name(NAME)?, NAME_WIDTH);
    let mut writer = shapefile::Writer::from_path(path, table).map_err(|e| {
        AppError::output_write(format!("Failed to create shapefile '{}': {e}", path.display()))
    })?;

    let mut summary = ShapeWriteSummary::default();
    for feature in &extract.features {
        let Some(shape) = &feature.shape else {
            warn!(geoid = %feature.geoid, "no polygon; row left out of shapefile");
            summary.skipped += 1;
            continue;
        };

        let mut record = Record::default();
        record.insert(GEOID.to_string(), FieldValue::Character(Some(feature.geoid.clone())));
        record.insert(NAME.to_string(), FieldValue::Character(Some(feature.name.clone())));

        writer.write_shape_and_record(shape, &record).map_err(|e| {
            AppError::output_write(format!("Failed to write shape for {}: {e}", feature.geoid))
        })?;
        summary.written += 1;
    }
    // Headers are finalised when the writer is dropped.
    drop(writer);

    if let Some(projection) = &extract.projection {
        let prj = path.with_extension("prj");
        fs::write(&prj, projection)
            .map_err(|e| AppError::output_write(format!("Failed to write '{}': {e}", prj.display())))?;
    }

    Ok(summary)
}

fn field_name(name: &str) -> Result<FieldName, AppError> {
    FieldName::try_from(name)
        .map_err(|e| AppError::output_write(format!("Invalid dBase field name `{name}`: {e:?}")))
}
