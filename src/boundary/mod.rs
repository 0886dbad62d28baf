//! Block-group boundary extract.
//!
//! The boundary file is built from a geometry-bearing provider table reduced
//! to `GEOID`, `NAME` and polygon, with a fixed row position and a fixed set of
//! block groups removed.
//!
//! The exclusions are not the only reduction: a feature with no polygon
//! survives `without_excluded` but is skipped by the shapefile writer, so the
//! persisted feature count is `N - k - skipped` (see `ShapeWriteSummary`).

use shapefile::Polygon;

use crate::domain::WideTable;
use crate::error::AppError;

/// Zero-based position (in provider order) of the row dropped from the extract.
pub const EXCLUDED_ROW: usize = 3992;

/// Block groups dropped from the extract.
///
/// Rows left after this list and `EXCLUDED_ROW` that have no polygon are also
/// absent from the written shapefile; they are counted as skipped, not excluded.
pub const EXCLUDED_GEOIDS: [&str; 9] = [
    "170319900000",
    "170318103001",
    "170317706021",
    "170319800001",
    "170318104001",
    "170310814031",
    "170318439001",
    "170319801001",
    "170318306001",
];

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub geoid: String,
    pub name: String,
    pub shape: Option<Polygon>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryExtract {
    pub features: Vec<BoundaryFeature>,
    pub projection: Option<String>,
}

impl BoundaryExtract {
    /// Keep `GEOID`, `NAME` and geometry from a provider table.
    pub fn from_table(table: WideTable) -> Result<Self, AppError> {
        let geometry = table.geometry.ok_or_else(|| {
            AppError::provider_fetch("Boundary table was fetched without geometry.")
        })?;
        let names = match table.label {
            Some(label) => label.values,
            None => vec![String::new(); table.id.values.len()],
        };

        if geometry.shapes.len() != table.id.values.len() || names.len() != table.id.values.len() {
            return Err(AppError::provider_fetch(format!(
                "Boundary table is ragged: {} ids, {} names, {} shapes.",
                table.id.values.len(),
                names.len(),
                geometry.shapes.len()
            )));
        }

        let features = table
            .id
            .values
            .into_iter()
            .zip(names)
            .zip(geometry.shapes)
            .map(|((geoid, name), shape)| BoundaryFeature { geoid, name, shape })
            .collect();

        Ok(Self {
            features,
            projection: geometry.projection,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Drop the row at `position` (if in range) and every row whose GEOID is listed.
    pub fn without(self, position: usize, geoids: &[&str]) -> Self {
        let features = self
            .features
            .into_iter()
            .enumerate()
            .filter(|(i, f)| *i != position && !geoids.contains(&f.geoid.as_str()))
            .map(|(_, f)| f)
            .collect();
        Self {
            features,
            projection: self.projection,
        }
    }

    /// Apply the fixed exclusions.
    pub fn without_excluded(self) -> Self {
        self.without(EXCLUDED_ROW, &EXCLUDED_GEOIDS)
    }
}
