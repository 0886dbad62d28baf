//! Block-group polygons from the Census cartographic boundary archives.
//!
//! The archive for a state (`cb_<vintage>_<state>_bg_500k.zip`) holds a
//! shapefile of every block group in the state; polygons are filtered to the
//! requested county and keyed by their `GEOID` attribute.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use shapefile::Polygon;
use shapefile::dbase::{FieldValue, Record};
use tracing::{debug, info, warn};

use crate::domain::Region;
use crate::error::AppError;

const BASE_URL: &str = "https://www2.census.gov/geo/tiger";

/// Polygons for every block group in one county.
#[derive(Debug, Clone)]
pub struct BlockGroups {
    pub vintage: u16,
    pub region: Region,
    pub shapes: HashMap<String, Polygon>,
    /// Contents of the archive's `.prj` file.
    pub projection: Option<String>,
}

pub fn archive_stem(vintage: u16, state: &str) -> String {
    format!("cb_{vintage}_{state}_bg_500k")
}

pub fn archive_url(vintage: u16, state: &str) -> String {
    format!("{BASE_URL}/GENZ{vintage}/shp/{}.zip", archive_stem(vintage, state))
}

/// Download (or reuse a cached copy of) the state archive and read the county's polygons.
pub fn load_block_groups(
    client: &Client,
    vintage: u16,
    region: Region,
    cache_dir: Option<&Path>,
) -> Result<BlockGroups, AppError> {
    let stem = archive_stem(vintage, region.state);
    let scratch = tempfile::tempdir()
        .map_err(|e| AppError::provider_fetch(format!("Failed to create scratch dir: {e}")))?;

    let url = archive_url(vintage, region.state);
    let extract_dir = scratch.path().join("extract");
    match cache_dir {
        Some(dir) => {
            let path = dir.join("tiger").join(format!("{stem}.zip"));
            if path.exists() {
                debug!(path = %path.display(), "using cached boundary archive");
                unpack_cached(&path, &extract_dir, |dest| download(client, &url, dest))?;
            } else {
                download(client, &url, &path)?;
                unpack(&path, &extract_dir)?;
            }
        }
        None => {
            let path = scratch.path().join(format!("{stem}.zip"));
            download(client, &url, &path)?;
            unpack(&path, &extract_dir)?;
        }
    }

    read_block_groups(&extract_dir.join(format!("{stem}.shp")), vintage, region)
}

fn download(client: &Client, url: &str, dest: &Path) -> Result<(), AppError> {
    info!(%url, "downloading boundary archive");
    let resp = client
        .get(url)
        .send()
        .map_err(|e| AppError::provider_fetch(format!("Boundary download failed: {e}")))?;
    if !resp.status().is_success() {
        return Err(AppError::provider_fetch(format!(
            "Boundary download from {url} failed with status {}.",
            resp.status()
        )));
    }
    let bytes = resp
        .bytes()
        .map_err(|e| AppError::provider_fetch(format!("Boundary download interrupted: {e}")))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::output_write(format!("Failed to create '{}': {e}", parent.display()))
        })?;
    }
    // Write then rename so an interrupted download never looks cached.
    let partial = dest.with_extension("zip.part");
    fs::write(&partial, &bytes)
        .map_err(|e| AppError::output_write(format!("Failed to write '{}': {e}", partial.display())))?;
    fs::rename(&partial, dest)
        .map_err(|e| AppError::output_write(format!("Failed to move '{}': {e}", dest.display())))?;
    Ok(())
}

fn unpack(archive: &Path, dir: &Path) -> Result<(), AppError> {
    let file = File::open(archive).map_err(|e| {
        AppError::provider_fetch(format!("Failed to open '{}': {e}", archive.display()))
    })?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| {
        AppError::provider_fetch(format!("'{}' is not a valid zip archive: {e}", archive.display()))
    })?;
    zip.extract(dir).map_err(|e| {
        AppError::provider_fetch(format!("Failed to extract '{}': {e}", archive.display()))
    })
}

/// Unpack a cached archive. An unreadable one is deleted, fetched again through
/// `refetch` and unpacked once more; a second failure is returned.
fn unpack_cached(
    archive: &Path,
    dir: &Path,
    refetch: impl FnOnce(&Path) -> Result<(), AppError>,
) -> Result<(), AppError> {
    let Err(err) = unpack(archive, dir) else {
        return Ok(());
    };
    warn!(path = %archive.display(), error = %err, "cached boundary archive unusable; downloading again");
    fs::remove_file(archive).map_err(|e| {
        AppError::output_write(format!("Failed to remove '{}': {e}", archive.display()))
    })?;
    refetch(archive)?;
    unpack(archive, dir)
}

/// Read polygons for `region` from an extracted block-group shapefile.
pub fn read_block_groups(shp: &Path, vintage: u16, region: Region) -> Result<BlockGroups, AppError> {
    let mut reader = shapefile::Reader::from_path(shp)
        .map_err(|e| AppError::provider_fetch(format!("Failed to open '{}': {e}", shp.display())))?;

    let prefix = region.geoid_prefix();
    let mut shapes = HashMap::new();
    for item in reader.iter_shapes_and_records_as::<Polygon, Record>() {
        let (polygon, record) = item.map_err(|e| {
            AppError::provider_fetch(format!("Failed to read '{}': {e}", shp.display()))
        })?;
        let Some(geoid) = geoid_of(&record) else {
            continue;
        };
        if geoid.starts_with(&prefix) {
            shapes.insert(geoid, polygon);
        }
    }

    if shapes.is_empty() {
        return Err(AppError::provider_fetch(format!(
            "No block groups for {prefix} in '{}'.",
            shp.display()
        )));
    }
    debug!(count = shapes.len(), "read block-group polygons");

    Ok(BlockGroups {
        vintage,
        region,
        shapes,
        projection: fs::read_to_string(prj_path(shp)).ok(),
    })
}

fn geoid_of(record: &Record) -> Option<String> {
    match record.get("GEOID") {
        Some(FieldValue::Character(Some(s))) => Some(s.trim().to_string()),
        _ => None,
    }
}

fn prj_path(shp: &Path) -> PathBuf {
    shp.with_extension("prj")
}
