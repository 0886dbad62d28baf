//! `acs-extract` library crate.
//!
//! The binary (`acs-extract`) is a thin wrapper around this library so that
//! the catalog, renaming and boundary logic is testable without the network.

pub mod app;
pub mod boundary;
pub mod catalog;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod io;
pub mod rename;
pub mod report;
