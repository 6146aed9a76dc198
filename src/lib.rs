//! Combined co-occurrence / phylogeny / HGT table preparation
//!
//! Joins four pre-computed tables (co-occurrence measures, tip distances,
//! taxonomic breakdown, and within-species RANGER-DTL HGT tallies) keyed by
//! taxon pairs, and writes one denormalized report row per HGT pair to
//! standard output.
//!
//! - `keys`: canonical and ordered pair-key handling
//! - `taxa`: fixed rank levels and the differentiating-rank scan
//! - `data`: gzipped TSV loading with Polars and the in-memory indexes
//! - `report`: the join/validate/print loop

pub mod data;
pub mod error;
pub mod keys;
pub mod report;
pub mod taxa;

// Re-export commonly used types
pub use data::{CooccurTable, HgtTable, PairTables, TablePaths, TaxaTable, TipDistances};
pub use error::PrepError;
pub use report::{write_header, write_report};
