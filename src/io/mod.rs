//! Input/output helpers.
//!
//! - topic table CSV export (`export`) and read-back (`ingest`)
//! - boundary shapefile export (`shape`)
//! - variable catalog cache (`cache`)

pub mod cache;
pub mod export;
pub mod ingest;
pub mod shape;

pub use export::*;
pub use ingest::read_topic_csv;
pub use shape::*;
