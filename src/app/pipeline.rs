//! The extract workflow.
//!
//! catalog -> (fetch -> rename -> write CSV) per topic -> indicators ->
//! boundary fetch -> exclusions -> write shapefile
//!
//! Strictly sequential; the first failure ends the run and files already
//! written stay on disk.

use std::path::PathBuf;

use tracing::{info, info_span, warn};

use crate::boundary::BoundaryExtract;
use crate::catalog::Catalog;
use crate::data::DataSource;
use crate::domain::{BOUNDARY_GROUP, RunConfig, SURVEY, TOPICS, TableQuery, TopicSpec, VINTAGE};
use crate::error::AppError;
use crate::indicators::write_indicators;
use crate::io::{ShapeWriteSummary, write_boundary_shp, write_table_csv};
use crate::rename::rename_and_filter;

/// One written topic file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicOutput {
    pub topic: &'static str,
    pub group: &'static str,
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

/// The linked indicators file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorsOutput {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

/// The written boundary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryOutput {
    pub path: PathBuf,
    pub rows_fetched: usize,
    pub rows_excluded: usize,
    pub shapes: ShapeWriteSummary,
}

/// All outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub catalog_entries: usize,
    pub topics: Vec<TopicOutput>,
    pub indicators: IndicatorsOutput,
    pub boundary: BoundaryOutput,
}

/// Run the full extract against `source`.
pub fn run_extract<S: DataSource>(source: &S, config: &RunConfig) -> Result<RunOutput, AppError> {
    let catalog = source.load_catalog(VINTAGE, SURVEY)?;
    info!(entries = catalog.len(), vintage = VINTAGE, survey = %SURVEY, "catalog ready");

    let mut topics = Vec::with_capacity(TOPICS.len());
    for topic in TOPICS {
        topics.push(run_topic(source, &catalog, topic, config)?);
    }

    let indicators = run_indicators(config)?;
    let boundary = run_boundary(source, config)?;

    Ok(RunOutput {
        catalog_entries: catalog.len(),
        topics,
        indicators,
        boundary,
    })
}

fn run_topic<S: DataSource>(
    source: &S,
    catalog: &Catalog,
    topic: TopicSpec,
    config: &RunConfig,
) -> Result<TopicOutput, AppError> {
    let _span = info_span!("topic", topic = topic.name, group = topic.group).entered();

    let table = source.fetch_table(&TableQuery::block_groups(topic.group, true))?;
    let table = rename_and_filter(table, topic.name, catalog)?;

    let path = config.topic_csv_path(topic.name);
    let rows = write_table_csv(&path, &table)?;
    let columns = table.column_names().len();
    info!(rows, columns, path = %path.display(), "wrote topic");

    Ok(TopicOutput {
        topic: topic.name,
        group: topic.group,
        path,
        rows,
        columns,
    })
}

fn run_indicators(config: &RunConfig) -> Result<IndicatorsOutput, AppError> {
    let _span = info_span!("indicators").entered();

    let linked = write_indicators(config)?;
    let path = config.indicators_csv_path();
    let columns = linked.columns.len() + 1;
    info!(rows = linked.n_rows(), columns, path = %path.display(), "wrote indicators");

    Ok(IndicatorsOutput {
        path,
        rows: linked.n_rows(),
        columns,
    })
}

fn run_boundary<S: DataSource>(source: &S, config: &RunConfig) -> Result<BoundaryOutput, AppError> {
    let _span = info_span!("boundary", group = BOUNDARY_GROUP).entered();

    let table = source.fetch_table(&TableQuery::block_groups(BOUNDARY_GROUP, true))?;
    let extract = BoundaryExtract::from_table(table)?;
    let rows_fetched = extract.len();
    let extract = extract.without_excluded();
    let rows_excluded = rows_fetched - extract.len();
    if extract.is_empty() {
        warn!(rows_fetched, "no block groups left after exclusions");
    }

    let path = config.boundary_shp_path();
    let shapes = write_boundary_shp(&path, &extract)?;
    info!(
        rows_fetched,
        rows_excluded,
        written = shapes.written,
        path = %path.display(),
        "wrote boundary"
    );

    Ok(BoundaryOutput {
        path,
        rows_fetched,
        rows_excluded,
        shapes,
    })
}
