//! Data loading and indexing
//!
//! Handles loading the co-occurrence, tip distance, taxonomic, and HGT
//! tables using Polars, and builds the lookup structures the report loop
//! works from. All four tables are gzip-compressed, tab-delimited files
//! with a header row, read fully into memory before any pair is processed.

use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use polars::prelude::*;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::keys::canonical_key;
use crate::taxa::{RankVector, RANK_LEVELS};

/// Locations of the four input tables
pub struct TablePaths {
    pub cooccur: PathBuf,
    pub tip_distances: PathBuf,
    pub taxa: PathBuf,
    pub hgt: PathBuf,
}

/// All four input tables, loaded and indexed
pub struct PairTables {
    pub cooccur: CooccurTable,
    pub tip_dist: TipDistances,
    pub taxa: TaxaTable,
    pub hgt: HgtTable,
}

impl PairTables {
    /// Load every input table
    pub fn load(paths: &TablePaths, measures: &[String]) -> Result<Self> {
        let cooccur = CooccurTable::load(&paths.cooccur, measures)?;
        info!("co-occurrence pairs: {}", cooccur.len());

        let tip_dist = TipDistances::load(&paths.tip_distances)?;
        info!("tip distance taxa: {}", tip_dist.len());

        let taxa = TaxaTable::load(&paths.taxa)?;
        info!("classified taxa: {}", taxa.len());

        let hgt = HgtTable::load(&paths.hgt)?;
        info!("HGT pairs: {}", hgt.len());

        Ok(Self {
            cooccur,
            tip_dist,
            taxa,
            hgt,
        })
    }
}

/// Read a gzipped, tab-delimited table with a header row
///
/// The literal string `NA` parses as null in every column.
pub fn read_gzipped_tsv(path: &Path) -> Result<DataFrame> {
    let file =
        File::open(path).with_context(|| format!("Failed to open table: {}", path.display()))?;
    let mut decoder = GzDecoder::new(file);
    let mut bytes = Vec::new();
    decoder
        .read_to_end(&mut bytes)
        .with_context(|| format!("Failed to decompress table: {}", path.display()))?;

    let parse_options = CsvParseOptions::default()
        .with_separator(b'\t')
        .with_null_values(Some(NullValues::AllColumnsSingle("NA".into())));

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None) // Scan entire file
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .with_context(|| format!("Failed to parse table: {}", path.display()))
}

/// One co-occurrence row: requested measure values in request order
pub struct CooccurEntry {
    /// Pre-rendered measure values; `None` prints as `NA`
    pub measures: Vec<Option<String>>,
    /// Whether the stored row's literal taxon order was already canonical
    canonical_order: bool,
    /// Set when a second row with the opposite taxon order collides here
    pub reverse_duplicate: bool,
}

/// Co-occurrence rows indexed by canonical pair key
pub struct CooccurTable {
    measures: Vec<String>,
    entries: FxHashMap<String, CooccurEntry>,
}

impl CooccurTable {
    /// Load and index the co-occurrence table
    pub fn load(path: &Path, measures: &[String]) -> Result<Self> {
        let mut df = read_gzipped_tsv(path)?;
        normalize_legacy_columns(&mut df)?;
        Self::from_dataframe(&df, measures)
    }

    /// Index an already-loaded co-occurrence frame
    ///
    /// Rows are keyed by the canonical (sorted) pair of their `taxon_i` /
    /// `taxon_j` values. A measure column missing from the frame, or null
    /// for a row, becomes a null slot. Two rows colliding on one canonical
    /// key with opposite literal orders mark the entry as a reverse
    /// duplicate; the run fails when that pair is processed.
    pub fn from_dataframe(df: &DataFrame, measures: &[String]) -> Result<Self> {
        let taxon_i = df
            .column("taxon_i")
            .context("co-occurrence table must start with a taxon_i column")?
            .str()
            .context("co-occurrence column taxon_i is not string typed")?;
        let taxon_j = df
            .column("taxon_j")
            .context("co-occurrence table must start with a taxon_j column")?
            .str()
            .context("co-occurrence column taxon_j is not string typed")?;

        let measure_cols: Vec<Option<&Column>> =
            measures.iter().map(|m| df.column(m).ok()).collect();

        let mut entries: FxHashMap<String, CooccurEntry> = FxHashMap::default();
        for idx in 0..df.height() {
            let (Some(ti), Some(tj)) = (taxon_i.get(idx), taxon_j.get(idx)) else {
                continue;
            };
            let key = canonical_key(ti, tj);
            let canonical_order = ti <= tj;
            match entries.entry(key) {
                Entry::Occupied(mut occupied) => {
                    if occupied.get().canonical_order != canonical_order {
                        occupied.get_mut().reverse_duplicate = true;
                    }
                }
                Entry::Vacant(vacant) => {
                    let values = measure_cols
                        .iter()
                        .map(|col| col.and_then(|c| display_value(c, idx)))
                        .collect();
                    vacant.insert(CooccurEntry {
                        measures: values,
                        canonical_order,
                        reverse_duplicate: false,
                    });
                }
            }
        }

        Ok(Self {
            measures: measures.to_vec(),
            entries,
        })
    }

    /// Probe the index under one literal ordering of a pair
    ///
    /// Only hits when that ordering is the canonical one.
    pub fn get(&self, ordered_key: &str) -> Option<&CooccurEntry> {
        self.entries.get(ordered_key)
    }

    /// Measure column names, in request order
    pub fn measures(&self) -> &[String] {
        &self.measures
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rename legacy `taxoni` / `taxonj` headers
///
/// Applies only when they are the first two column names; no other column
/// is touched.
pub fn normalize_legacy_columns(df: &mut DataFrame) -> Result<()> {
    let legacy = {
        let names = df.get_column_names();
        names.len() >= 2 && names[0].as_str() == "taxoni" && names[1].as_str() == "taxonj"
    };
    if legacy {
        df.rename("taxoni", "taxon_i".into())
            .context("renaming legacy taxoni column")?;
        df.rename("taxonj", "taxon_j".into())
            .context("renaming legacy taxonj column")?;
    }
    Ok(())
}

/// Render one cell the way the report prints it
fn display_value(col: &Column, idx: usize) -> Option<String> {
    match col.dtype() {
        DataType::Float64 => col.f64().ok()?.get(idx).map(|v| v.to_string()),
        DataType::Int64 => col.i64().ok()?.get(idx).map(|v| v.to_string()),
        DataType::String => col.str().ok()?.get(idx).map(|v| v.to_string()),
        _ => col.get(idx).ok().and_then(|v| {
            if v.is_null() {
                None
            } else {
                Some(v.to_string())
            }
        }),
    }
}

/// Square tip-distance matrix
///
/// The first column of the source table holds the row taxon ID; the
/// remaining column names are taxa.
pub struct TipDistances {
    values: DataFrame,
    row_index: FxHashMap<String, usize>,
}

impl TipDistances {
    /// Load and index the tip distance table
    pub fn load(path: &Path) -> Result<Self> {
        let df = read_gzipped_tsv(path)?;
        Self::from_dataframe(&df)
    }

    /// Index an already-loaded distance frame
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        if df.width() < 2 {
            bail!("tip distance table needs an ID column and at least one taxon column");
        }
        let columns = df.get_columns();
        let ids = columns[0]
            .str()
            .context("tip distance table: first column must be taxon IDs")?;

        let mut row_index = FxHashMap::default();
        for idx in 0..df.height() {
            if let Some(id) = ids.get(idx) {
                row_index.insert(id.to_string(), idx);
            }
        }

        let mut casted = Vec::with_capacity(columns.len() - 1);
        for col in &columns[1..] {
            let col = col.cast(&DataType::Float64).with_context(|| {
                format!("tip distance column {} is not numeric", col.name())
            })?;
            casted.push(col);
        }
        let values = DataFrame::new(casted).context("rebuilding tip distance matrix")?;

        Ok(Self { values, row_index })
    }

    /// Distance between two taxa, trying either matrix direction
    ///
    /// `None` when either taxon is absent or the cell is null.
    pub fn get(&self, taxon_i: &str, taxon_j: &str) -> Option<f64> {
        self.lookup(taxon_i, taxon_j)
            .or_else(|| self.lookup(taxon_j, taxon_i))
    }

    fn lookup(&self, row: &str, col: &str) -> Option<f64> {
        let idx = *self.row_index.get(row)?;
        self.values.column(col).ok()?.f64().ok()?.get(idx)
    }

    pub fn len(&self) -> usize {
        self.row_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_index.is_empty()
    }
}

/// Taxonomic classifications indexed by taxon
///
/// The taxon ID comes from the second column of the breakdown table; the
/// rank columns are looked up by name.
pub struct TaxaTable {
    ranks: FxHashMap<String, RankVector>,
}

impl TaxaTable {
    /// Load and index the taxonomic breakdown table
    pub fn load(path: &Path) -> Result<Self> {
        let df = read_gzipped_tsv(path)?;
        Self::from_dataframe(&df)
    }

    /// Index an already-loaded taxa frame
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        if df.width() < 2 {
            bail!("taxa table needs the taxon ID in its second column");
        }
        let ids = df.get_columns()[1]
            .str()
            .context("taxa table: second column must be taxon IDs")?;

        let mut rank_cols = Vec::with_capacity(RANK_LEVELS.len());
        for level in RANK_LEVELS {
            let col = df
                .column(level)
                .with_context(|| format!("taxa table missing rank column {level}"))?
                .cast(&DataType::String)
                .with_context(|| format!("taxa table rank column {level} is not castable"))?;
            rank_cols.push(col);
        }
        let mut rank_cells = Vec::with_capacity(rank_cols.len());
        for col in &rank_cols {
            rank_cells.push(
                col.str()
                    .with_context(|| format!("taxa table rank column {} lost string type", col.name()))?,
            );
        }

        let mut ranks = FxHashMap::default();
        for idx in 0..df.height() {
            let Some(id) = ids.get(idx) else { continue };
            let vector: RankVector = rank_cells
                .iter()
                .map(|cells| cells.get(idx).map(str::to_string))
                .collect();
            ranks.insert(id.to_string(), vector);
        }

        Ok(Self { ranks })
    }

    pub fn get(&self, taxon: &str) -> Option<&RankVector> {
        self.ranks.get(taxon)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

/// One HGT row
pub struct HgtRow {
    pub species: String,
    pub hgt_count: i64,
}

/// HGT pairwise tallies indexed by the literal ordered pair key
///
/// File row order is preserved; the report walks pairs in that order.
pub struct HgtTable {
    order: Vec<String>,
    rows: FxHashMap<String, HgtRow>,
}

impl HgtTable {
    /// Load and index the HGT tally table
    pub fn load(path: &Path) -> Result<Self> {
        let df = read_gzipped_tsv(path)?;
        Self::from_dataframe(&df)
    }

    /// Index an already-loaded HGT frame (first column = ordered pair key)
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        if df.width() < 1 {
            bail!("HGT table needs the pair key in its first column");
        }
        let keys = df.get_columns()[0]
            .str()
            .context("HGT table: first column must be the taxon pair key")?;
        let species = df
            .column("species")
            .context("HGT table missing species column")?
            .cast(&DataType::String)
            .context("HGT species column is not castable")?;
        let species = species.str().context("HGT species column lost string type")?;
        let counts = df
            .column("hgt_count")
            .context("HGT table missing hgt_count column")?
            .cast(&DataType::Int64)
            .context("HGT hgt_count column is not integer typed")?;
        let counts = counts.i64().context("HGT hgt_count column lost integer type")?;

        let mut order = Vec::with_capacity(df.height());
        let mut rows: FxHashMap<String, HgtRow> = FxHashMap::default();
        for idx in 0..df.height() {
            let Some(key) = keys.get(idx) else { continue };
            if rows.contains_key(key) {
                continue;
            }
            let Some(species_val) = species.get(idx) else {
                bail!("HGT table: species missing for {key}");
            };
            let Some(count) = counts.get(idx) else {
                bail!("HGT table: hgt_count missing for {key}");
            };
            order.push(key.to_string());
            rows.insert(
                key.to_string(),
                HgtRow {
                    species: species_val.to_string(),
                    hgt_count: count,
                },
            );
        }

        Ok(Self { order, rows })
    }

    /// Pairs with their rows, in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HgtRow)> {
        self.order
            .iter()
            .filter_map(|key| self.rows.get(key).map(|row| (key.as_str(), row)))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
