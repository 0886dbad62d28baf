//! Export topic tables to CSV.
//!
//! Header is the table's column names in order; no row index. The geometry
//! column (if any) is written as WKT, empty where a row has no polygon.

use std::fs;
use std::path::Path;

use shapefile::Polygon;
use wkt::ToWkt;

use crate::domain::WideTable;
use crate::error::AppError;

/// Write a table to `path`, creating parent directories. Returns the row count.
pub fn write_table_csv(path: &Path, table: &WideTable) -> Result<usize, AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::output_write(format!("Failed to create '{}': {e}", parent.display()))
        })?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::output_write(format!("Failed to create CSV '{}': {e}", path.display()))
    })?;

    writer
        .write_record(table.column_names())
        .map_err(|e| AppError::output_write(format!("Failed to write CSV header: {e}")))?;

    let mut record: Vec<String> = Vec::with_capacity(table.column_names().len());
    for row in 0..table.n_rows() {
        record.clear();
        record.push(table.id.values[row].clone());
        if let Some(label) = &table.label {
            record.push(cell(&label.values, row));
        }
        for column in &table.columns {
            record.push(cell(&column.values, row));
        }
        if let Some(geometry) = &table.geometry {
            record.push(
                geometry
                    .shapes
                    .get(row)
                    .and_then(Option::as_ref)
                    .map(polygon_wkt)
                    .unwrap_or_default(),
            );
        }
        writer
            .write_record(&record)
            .map_err(|e| AppError::output_write(format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::output_write(format!("Failed to flush CSV '{}': {e}", path.display())))?;

    Ok(table.n_rows())
}

fn cell(values: &[String], row: usize) -> String {
    values.get(row).cloned().unwrap_or_default()
}

/// WKT `MULTIPOLYGON` for a shapefile polygon.
pub fn polygon_wkt(polygon: &Polygon) -> String {
    let multi: geo_types::MultiPolygon<f64> = polygon.clone().into();
    multi.wkt_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Column, GEOID, GeometryColumn, NAME};
    use shapefile::{Point, PolygonRing};

    fn square() -> Polygon {
        Polygon::new(PolygonRing::Outer(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 0.0),
        ]))
    }

    #[test]
    fn writes_header_and_quotes_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acs").join("commute_time.csv");
        let table = WideTable {
            id: Column::new(GEOID, vec!["170310101001".into(), "170310101002".into()]),
            label: None,
            columns: vec![
                Column::new("Total_commute_time", vec!["10".into(), "20".into()]),
                Column::new("Car, truck, or van_commute_time", vec!["7".into(), "15".into()]),
            ],
            geometry: None,
        };

        let rows = write_table_csv(&path, &table).unwrap();
        assert_eq!(rows, 2);

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "GEOID,Total_commute_time,\"Car, truck, or van_commute_time\""
        );
        assert_eq!(lines[1], "170310101001,10,7");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn geometry_column_is_wkt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("race.csv");
        let table = WideTable {
            id: Column::new(GEOID, vec!["1".into(), "2".into()]),
            label: Some(Column::new(NAME, vec!["one".into(), "two".into()])),
            columns: vec![Column::new("Total_race", vec!["3".into(), "4".into()])],
            geometry: Some(GeometryColumn {
                shapes: vec![Some(square()), None],
                projection: None,
            }),
        };
        write_table_csv(&path, &table).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec![GEOID, NAME, "Total_race", "geometry"]);

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert!(records[0][3].starts_with("MULTIPOLYGON"));
        assert_eq!(&records[1][3], "");
    }

    #[test]
    fn missing_parent_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("t.csv");
        let table = WideTable {
            id: Column::new(GEOID, vec![]),
            label: None,
            columns: vec![],
            geometry: None,
        };
        assert_eq!(write_table_csv(&path, &table).unwrap(), 0);
        assert!(path.exists());
    }
}
