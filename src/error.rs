//! Error types for combined-table preparation
//!
//! Defines the fatal validation errors using thiserror. Loader I/O and
//! table-shape failures are reported with anyhow context at the call sites
//! instead; missing optional data is never an error and prints as `NA`.

use thiserror::Error;

/// Fatal validation errors for the pair-join report
///
/// Every variant terminates the run with the offending key in the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrepError {
    /// Pair key does not split into exactly two non-empty taxon IDs
    #[error("taxa combo not in correct format: {0}")]
    MalformedPairKey(String),

    /// Taxon has no row in the taxonomic table
    #[error("taxon missing from taxonomic table: {0}")]
    UnknownTaxon(String),

    /// First differing rank is coarser than Strain
    #[error("taxa combo not at strain level: {combo} (first difference at {level})")]
    NotStrainLevel { combo: String, level: String },

    /// Rank vectors identical at every level
    #[error("taxa combo not at strain level: {0} (no differing rank found)")]
    NoRankDifference(String),

    /// Both orderings of a pair present in the HGT table
    #[error("reverse taxa combo found in HGT table: {0}")]
    ReverseHgtPair(String),

    /// Pair reachable only through its reversed ordering in the
    /// co-occurrence table, or stored there under both orderings
    #[error("reverse taxa combo found in co-occurrence table: {0}")]
    ReverseCooccurPair(String),
}
