//! Data providers.
//!
//! - `census`: Census Data API (variable catalog + wide block-group tables)
//! - `tiger`: cartographic boundary archives (block-group polygons)

pub mod census;
pub mod tiger;

pub use census::CensusClient;

use crate::catalog::Catalog;
use crate::domain::{Survey, TableQuery, WideTable};
use crate::error::AppError;

/// Fetch-by-code contract the extract pipeline runs against.
pub trait DataSource {
    /// Load the variable catalog; failures are `MetadataUnavailable`.
    fn load_catalog(&self, vintage: u16, survey: Survey) -> Result<Catalog, AppError>;

    /// Fetch one wide table; failures are `ProviderFetch`.
    fn fetch_table(&self, query: &TableQuery<'_>) -> Result<WideTable, AppError>;
}
