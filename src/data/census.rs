//! Census Data API integration.
//!
//! Two endpoints are used:
//!
//! - `/data/<vintage>/acs/<survey>/variables.json` for the variable catalog
//! - `/data/<vintage>/acs/<survey>?get=NAME,group(<group>)&for=block group:*...`
//!   for wide block-group tables
//!
//! Block-group polygons come from the cartographic boundary archives (see
//! `data::tiger`) and are joined onto tables by GEOID.

use std::cell::OnceCell;
use std::path::PathBuf;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, VariablesDocument};
use crate::data::DataSource;
use crate::data::tiger::{self, BlockGroups};
use crate::domain::{Column, GEOID, GeometryColumn, NAME, Survey, TableQuery, WideTable, is_value_column};
use crate::error::AppError;
use crate::io::cache;

const BASE_URL: &str = "https://api.census.gov/data";

/// Geography columns appended by the API, concatenated (in this order) into GEOID.
const GEO_PARTS: [&str; 4] = ["state", "county", "tract", "block group"];

pub struct CensusClient {
    client: Client,
    api_key: Option<String>,
    cache_dir: Option<PathBuf>,
    /// Boundaries are downloaded once per client and reused by every fetch.
    boundaries: OnceCell<BlockGroups>,
}

impl CensusClient {
    /// Build a client; `CENSUS_API_KEY` is read from the environment (`.env`) when set.
    pub fn from_env(cache_dir: Option<PathBuf>) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("CENSUS_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if api_key.is_none() {
            debug!("CENSUS_API_KEY not set; using anonymous quota");
        }
        let client = Client::builder()
            .user_agent(concat!("acs-extract/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            cache_dir,
            boundaries: OnceCell::new(),
        })
    }

    fn dataset_url(vintage: u16, survey: Survey) -> String {
        format!("{BASE_URL}/{vintage}/acs/{survey}")
    }

    fn fetch_catalog(&self, vintage: u16, survey: Survey) -> Result<Catalog, AppError> {
        let url = format!("{}/variables.json", Self::dataset_url(vintage, survey));
        info!(%url, "fetching variable catalog");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| AppError::metadata_unavailable(format!("Catalog request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::metadata_unavailable(format!(
                "Catalog request for {vintage} {survey} failed with status {}.",
                resp.status()
            )));
        }

        let doc: VariablesDocument = resp.json().map_err(|e| {
            AppError::metadata_unavailable(format!("Failed to parse catalog response: {e}"))
        })?;

        let catalog = Catalog::from_raw(vintage, survey, doc.into_raw());
        if catalog.is_empty() {
            return Err(AppError::metadata_unavailable(format!(
                "Catalog for {vintage} {survey} has no estimate variables."
            )));
        }
        info!(entries = catalog.len(), "loaded variable catalog");
        Ok(catalog)
    }

    fn fetch_rows(&self, query: &TableQuery<'_>) -> Result<Vec<Vec<Value>>, AppError> {
        let url = Self::dataset_url(query.vintage, query.survey);
        let get = format!("{NAME},group({})", query.group);
        let state = format!("state:{}", query.region.state);
        let county = format!("county:{}", query.region.county);

        let mut params: Vec<(&str, &str)> = vec![
            ("get", get.as_str()),
            ("for", "block group:*"),
            ("in", state.as_str()),
            ("in", county.as_str()),
            ("in", "tract:*"),
        ];
        if let Some(key) = &self.api_key {
            params.push(("key", key.as_str()));
        }

        debug!(%url, group = query.group, "requesting table");
        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .map_err(|e| AppError::provider_fetch(format!("Census request for {} failed: {e}", query.group)))?;

        if !resp.status().is_success() {
            return Err(AppError::provider_fetch(format!(
                "Census request for {} failed with status {}.",
                query.group,
                resp.status()
            )));
        }

        resp.json().map_err(|e| {
            AppError::provider_fetch(format!("Failed to parse Census response for {}: {e}", query.group))
        })
    }

    fn block_groups(&self, query: &TableQuery<'_>) -> Result<&BlockGroups, AppError> {
        if self.boundaries.get().is_none() {
            let loaded = tiger::load_block_groups(
                &self.client,
                query.vintage,
                query.region,
                self.cache_dir.as_deref(),
            )?;
            let _ = self.boundaries.set(loaded);
        }
        let loaded = self
            .boundaries
            .get()
            .ok_or_else(|| AppError::provider_fetch("Block-group boundaries unavailable."))?;
        if loaded.vintage != query.vintage || loaded.region != query.region {
            return Err(AppError::provider_fetch(format!(
                "Boundaries already loaded for {} {}{}; cannot serve {} {}{}.",
                loaded.vintage,
                loaded.region.state,
                loaded.region.county,
                query.vintage,
                query.region.state,
                query.region.county
            )));
        }
        Ok(loaded)
    }

    fn attach_geometry(&self, table: &mut WideTable, query: &TableQuery<'_>) -> Result<(), AppError> {
        let boundaries = self.block_groups(query)?;
        table.geometry = Some(join_geometry(table, boundaries));

        let missing = table
            .geometry
            .as_ref()
            .map_or(0, |g| g.shapes.iter().filter(|s| s.is_none()).count());
        if missing > 0 {
            warn!(group = query.group, missing, "rows without a boundary polygon");
        }
        Ok(())
    }
}

/// Polygon per table row, matched on GEOID.
pub fn join_geometry(table: &WideTable, boundaries: &BlockGroups) -> GeometryColumn {
    GeometryColumn {
        shapes: table
            .id
            .values
            .iter()
            .map(|geoid| boundaries.shapes.get(geoid).cloned())
            .collect(),
        projection: boundaries.projection.clone(),
    }
}

impl DataSource for CensusClient {
    fn load_catalog(&self, vintage: u16, survey: Survey) -> Result<Catalog, AppError> {
        let Some(dir) = &self.cache_dir else {
            return self.fetch_catalog(vintage, survey);
        };

        if let Some(catalog) = cache::read_catalog(dir, vintage, survey) {
            info!(entries = catalog.len(), "using cached variable catalog");
            return Ok(catalog);
        }

        let catalog = self.fetch_catalog(vintage, survey)?;
        cache::write_catalog(dir, &catalog)?;
        Ok(catalog)
    }

    fn fetch_table(&self, query: &TableQuery<'_>) -> Result<WideTable, AppError> {
        let rows = self.fetch_rows(query)?;
        let mut table = parse_wide_rows(rows)?;
        if query.geometry {
            self.attach_geometry(&mut table, query)?;
        }
        Ok(table)
    }
}

/// Build a `WideTable` from the API's array-of-arrays body.
///
/// The first row is the header. GEOID is assembled from the geography
/// columns; `NAME` becomes the label column; only `<code>E`/`<code>M`
/// columns are kept as values (annotations and `GEO_ID` are dropped).
pub fn parse_wide_rows(rows: Vec<Vec<Value>>) -> Result<WideTable, AppError> {
    let mut rows = rows.into_iter();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| AppError::provider_fetch("Census response is empty."))?
        .into_iter()
        .map(cell_text)
        .collect();

    let position = |name: &str| header.iter().position(|h| h == name);

    let geo_idx = GEO_PARTS
        .iter()
        .map(|part| {
            position(part).ok_or_else(|| {
                AppError::provider_fetch(format!("Census response has no `{part}` column."))
            })
        })
        .collect::<Result<Vec<usize>, AppError>>()?;
    let name_idx = position(NAME);
    let value_idx: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| is_value_column(h))
        .map(|(i, _)| i)
        .collect();

    let mut ids = Vec::new();
    let mut names = Vec::new();
    let mut values: Vec<Vec<String>> = vec![Vec::new(); value_idx.len()];

    for (line, row) in rows.enumerate() {
        if row.len() != header.len() {
            return Err(AppError::provider_fetch(format!(
                "Census response row {} has {} cells, expected {}.",
                line + 1,
                row.len(),
                header.len()
            )));
        }
        let row: Vec<String> = row.into_iter().map(cell_text).collect();

        ids.push(geo_idx.iter().map(|&i| row[i].as_str()).collect::<String>());
        if let Some(i) = name_idx {
            names.push(row[i].clone());
        }
        for (slot, &i) in values.iter_mut().zip(&value_idx) {
            slot.push(row[i].clone());
        }
    }

    let columns = value_idx
        .iter()
        .zip(values)
        .map(|(&i, v)| Column::new(header[i].clone(), v))
        .collect();

    Ok(WideTable {
        id: Column::new(GEOID, ids),
        label: name_idx.map(|_| Column::new(NAME, names)),
        columns,
        geometry: None,
    })
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Vec<Value>> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn parses_group_response() {
        let body = rows(json!([
            ["NAME", "GEO_ID", "B02001_001E", "B02001_001EA", "B02001_001M", "B02001_001MA", "state", "county", "tract", "block group"],
            ["Block Group 1, Census Tract 101, Cook County, Illinois", "1500000US170310101001", "1020", null, "150", null, "17", "031", "010100", "1"],
            ["Block Group 2, Census Tract 101, Cook County, Illinois", "1500000US170310101002", "870", null, "99", null, "17", "031", "010100", "2"]
        ]));

        let table = parse_wide_rows(body).unwrap();
        assert_eq!(
            table.column_names(),
            vec![GEOID, NAME, "B02001_001E", "B02001_001M"]
        );
        assert_eq!(table.id.values, vec!["170310101001", "170310101002"]);
        assert_eq!(table.columns[0].values, vec!["1020", "870"]);
        assert!(table.geometry.is_none());
    }

    #[test]
    fn numbers_and_nulls_become_text() {
        let body = rows(json!([
            ["B01001_001E", "state", "county", "tract", "block group"],
            [42, "17", "031", "010100", "1"],
            [null, "17", "031", "010100", "2"]
        ]));
        let table = parse_wide_rows(body).unwrap();
        assert!(table.label.is_none());
        assert_eq!(table.columns[0].values, vec!["42", ""]);
    }

    #[test]
    fn missing_geography_column_is_a_fetch_error() {
        let body = rows(json!([["NAME", "B01001_001E"], ["x", "1"]]));
        let err = parse_wide_rows(body).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ProviderFetch);
    }

    #[test]
    fn ragged_row_is_a_fetch_error() {
        let body = rows(json!([
            ["B01001_001E", "state", "county", "tract", "block group"],
            ["1", "17", "031"]
        ]));
        assert!(parse_wide_rows(body).is_err());
    }

    #[test]
    fn empty_body_is_a_fetch_error() {
        assert!(parse_wide_rows(Vec::new()).is_err());
    }

    fn square(x: f64) -> shapefile::Polygon {
        use shapefile::{Point, Polygon, PolygonRing};
        Polygon::new(PolygonRing::Outer(vec![
            Point::new(x, 0.0),
            Point::new(x, 1.0),
            Point::new(x + 1.0, 1.0),
            Point::new(x + 1.0, 0.0),
            Point::new(x, 0.0),
        ]))
    }

    #[test]
    fn join_geometry_matches_by_geoid() {
        let boundaries = BlockGroups {
            vintage: 2018,
            region: crate::domain::REGION,
            shapes: [
                ("170310101002".to_string(), square(2.0)),
                ("170310101001".to_string(), square(0.0)),
            ]
            .into_iter()
            .collect(),
            projection: Some("GEOGCS[\"GCS_North_American_1983\"]".into()),
        };
        let table = WideTable {
            id: Column::new(
                GEOID,
                vec!["170310101001".into(), "170310101002".into(), "170310101003".into()],
            ),
            label: None,
            columns: Vec::new(),
            geometry: None,
        };

        let geometry = join_geometry(&table, &boundaries);
        assert_eq!(
            geometry.shapes,
            vec![Some(square(0.0)), Some(square(2.0)), None]
        );
        assert_eq!(geometry.projection, boundaries.projection);
    }
}
