//! On-disk variable catalog cache.
//!
//! The cache stores the provider's raw `(code, label, concept)` rows as JSON;
//! display names are re-derived on load so a cache written by an older build
//! never carries stale names. An unreadable cache is treated as a miss.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{Catalog, RawVariable};
use crate::domain::Survey;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    vintage: u16,
    survey: Survey,
    fetched_at: DateTime<Utc>,
    variables: Vec<RawVariable>,
}

pub fn catalog_path(dir: &Path, vintage: u16, survey: Survey) -> PathBuf {
    dir.join(format!("variables_{vintage}_{survey}.json"))
}

/// Cached catalog for `vintage`/`survey`, if present and readable.
pub fn read_catalog(dir: &Path, vintage: u16, survey: Survey) -> Option<Catalog> {
    let path = catalog_path(dir, vintage, survey);
    let file = File::open(&path).ok()?;

    let cached: CatalogFile = match serde_json::from_reader(file) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable catalog cache");
            return None;
        }
    };
    if cached.vintage != vintage || cached.survey != survey || cached.variables.is_empty() {
        warn!(path = %path.display(), "ignoring mismatched catalog cache");
        return None;
    }

    Some(Catalog::from_raw(vintage, survey, cached.variables))
}

pub fn write_catalog(dir: &Path, catalog: &Catalog) -> Result<(), AppError> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::output_write(format!("Failed to create cache dir '{}': {e}", dir.display()))
    })?;

    let path = catalog_path(dir, catalog.vintage(), catalog.survey());
    let file = File::create(&path).map_err(|e| {
        AppError::output_write(format!("Failed to create catalog cache '{}': {e}", path.display()))
    })?;

    let cached = CatalogFile {
        vintage: catalog.vintage(),
        survey: catalog.survey(),
        fetched_at: Utc::now(),
        variables: catalog.to_raw(),
    };
    serde_json::to_writer(file, &cached)
        .map_err(|e| AppError::output_write(format!("Failed to write catalog cache: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::from_raw(
            2018,
            Survey::Acs5,
            vec![RawVariable {
                code: "B02001_002".into(),
                label: "Estimate!!Total!!White alone".into(),
                concept: Some("RACE".into()),
            }],
        )
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path(), &sample()).unwrap();

        let loaded = read_catalog(dir.path(), 2018, Survey::Acs5).unwrap();
        assert_eq!(loaded.entries(), sample().entries());
        assert_eq!(loaded.get("B02001_002").unwrap().short_name, "White alone");
    }

    #[test]
    fn miss_for_other_vintage() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path(), &sample()).unwrap();
        assert!(read_catalog(dir.path(), 2019, Survey::Acs5).is_none());
    }

    #[test]
    fn corrupt_cache_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(catalog_path(dir.path(), 2018, Survey::Acs5), "{not json").unwrap();
        assert!(read_catalog(dir.path(), 2018, Survey::Acs5).is_none());
    }
}
