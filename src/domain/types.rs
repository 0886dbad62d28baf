//! Shared domain types.
//!
//! This module defines:
//!
//! - the fixed extract definition (`TOPICS`, `REGION`, `VINTAGE`, `SURVEY`)
//! - wide-format tables as returned by the provider (`WideTable`, `Column`)
//! - the run configuration assembled from CLI arguments (`RunConfig`)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shapefile::Polygon;

/// Name of the block-group identifier column. Always the first column.
pub const GEOID: &str = "GEOID";

/// Name of the provider's display-name column.
pub const NAME: &str = "NAME";

/// Name given to the geometry column in CSV output.
pub const GEOMETRY: &str = "geometry";

/// ACS vintage (data year) for every fetch in the run.
pub const VINTAGE: u16 = 2018;

/// Survey product for every fetch in the run.
pub const SURVEY: Survey = Survey::Acs5;

/// Cook County, Illinois.
pub const REGION: Region = Region {
    state: "17",
    county: "031",
};

/// Topic name paired with the ACS table group renamed and written under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicSpec {
    pub name: &'static str,
    pub group: &'static str,
}

impl TopicSpec {
    pub const fn new(name: &'static str, group: &'static str) -> Self {
        Self { name, group }
    }
}

/// The nine topics written to `<data>/acs/<topic>.csv`.
pub const TOPICS: [TopicSpec; 9] = [
    TopicSpec::new("population", "B01001"),
    TopicSpec::new("race", "B02001"),
    TopicSpec::new("hispanic_origin", "B03003"),
    TopicSpec::new("commute_time", "B08134"),
    TopicSpec::new("education", "B15003"),
    TopicSpec::new("income", "B19001"),
    TopicSpec::new("employment", "B23025"),
    TopicSpec::new("tenure", "B25003"),
    TopicSpec::new("vehicles", "B25044"),
];

/// Group re-fetched with geometry to build the boundary extract.
pub const BOUNDARY_GROUP: &str = "B01001";

/// ACS survey product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Survey {
    Acs1,
    Acs5,
}

impl Survey {
    pub fn as_str(self) -> &'static str {
        match self {
            Survey::Acs1 => "acs1",
            Survey::Acs5 => "acs5",
        }
    }
}

impl std::fmt::Display for Survey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State + county FIPS scope of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub state: &'static str,
    pub county: &'static str,
}

impl Region {
    /// Leading GEOID digits shared by every block group in the region.
    pub fn geoid_prefix(&self) -> String {
        format!("{}{}", self.state, self.county)
    }
}

/// One table request against the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableQuery<'a> {
    pub group: &'a str,
    pub region: Region,
    pub vintage: u16,
    pub survey: Survey,
    pub geometry: bool,
}

impl<'a> TableQuery<'a> {
    /// Block-group query for `group` within the fixed extract scope.
    pub fn block_groups(group: &'a str, geometry: bool) -> Self {
        Self {
            group,
            region: REGION,
            vintage: VINTAGE,
            survey: SURVEY,
            geometry,
        }
    }
}

/// A named column of string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Per-row polygons attached to a table, plus the source projection (`.prj` WKT).
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryColumn {
    pub shapes: Vec<Option<Polygon>>,
    pub projection: Option<String>,
}

/// Wide-format provider table: one row per block group.
///
/// Column order is `GEOID`, `NAME` (if present), value columns, geometry (if
/// present). Every column holds exactly `n_rows()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub id: Column,
    pub label: Option<Column>,
    pub columns: Vec<Column>,
    pub geometry: Option<GeometryColumn>,
}

impl WideTable {
    pub fn n_rows(&self) -> usize {
        self.id.values.len()
    }

    /// Header names in output order.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names = Vec::with_capacity(self.columns.len() + 3);
        names.push(self.id.name.as_str());
        if let Some(label) = &self.label {
            names.push(label.name.as_str());
        }
        names.extend(self.columns.iter().map(|c| c.name.as_str()));
        if self.geometry.is_some() {
            names.push(GEOMETRY);
        }
        names
    }
}

/// Resolved settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root of the output tree (`acs/`, `shp_files/` and the indicators CSV live under it).
    pub data_dir: PathBuf,
    /// Download cache; `None` disables caching.
    pub cache_dir: Option<PathBuf>,
}

impl RunConfig {
    pub fn topic_csv_path(&self, topic: &str) -> PathBuf {
        self.data_dir.join("acs").join(format!("{topic}.csv"))
    }

    /// Linked block-group indicators derived from the topic CSVs.
    pub fn indicators_csv_path(&self) -> PathBuf {
        self.data_dir.join("acs_indicators.csv")
    }

    pub fn boundary_shp_path(&self) -> PathBuf {
        self.data_dir.join("shp_files").join("block_groups.shp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_are_unique() {
        for (i, a) in TOPICS.iter().enumerate() {
            for b in &TOPICS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
        assert!(TOPICS.iter().any(|t| t.group == BOUNDARY_GROUP));
    }

    #[test]
    fn output_paths_follow_layout() {
        let config = RunConfig {
            data_dir: PathBuf::from("data"),
            cache_dir: None,
        };
        assert_eq!(config.topic_csv_path("race"), PathBuf::from("data/acs/race.csv"));
        assert_eq!(
            config.boundary_shp_path(),
            PathBuf::from("data/shp_files/block_groups.shp")
        );
        assert_eq!(config.indicators_csv_path(), PathBuf::from("data/acs_indicators.csv"));
    }

    #[test]
    fn column_names_put_id_first_and_geometry_last() {
        let table = WideTable {
            id: Column::new(GEOID, vec!["170310101001".into()]),
            label: Some(Column::new(NAME, vec!["Block Group 1".into()])),
            columns: vec![Column::new("B02001_001E", vec!["10".into()])],
            geometry: Some(GeometryColumn {
                shapes: vec![None],
                projection: None,
            }),
        };
        assert_eq!(
            table.column_names(),
            vec![GEOID, NAME, "B02001_001E", GEOMETRY]
        );
        assert_eq!(table.n_rows(), 1);
    }
}
