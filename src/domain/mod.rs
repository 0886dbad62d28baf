//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the fixed extract definition (topics, region, vintage)
//! - wide provider tables (`WideTable`)
//! - the `<code><suffix>` value-column grammar (`ValueColumn`, `ValueSuffix`)

pub mod columns;
pub mod types;

pub use columns::*;
pub use types::*;
