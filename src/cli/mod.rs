//! Command-line parsing.
//!
//! The extract itself (topics, region, vintage, exclusions) is fixed; the
//! flags only choose where files go and whether downloads are cached.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::RunConfig;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "acs-extract",
    version,
    about = "Cook County ACS block-group extract: per-topic CSVs plus a boundary shapefile"
)]
pub struct Cli {
    /// Output root; topic CSVs go to `<dir>/acs/`, the boundary to `<dir>/shp_files/`.
    #[arg(long, value_name = "DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Where the variable catalog and boundary archives are cached.
    #[arg(long, value_name = "DIR", default_value = ".cache/acs-extract")]
    pub cache_dir: PathBuf,

    /// Always download; neither read nor write the cache.
    #[arg(long)]
    pub no_cache: bool,
}

impl Cli {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            data_dir: self.data_dir.clone(),
            cache_dir: (!self.no_cache).then(|| self.cache_dir.clone()),
        }
    }
}
