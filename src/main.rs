//! Combined-table preparation entry point
//!
//! Parses the co-occurrence table, tip distances, MAG taxa levels, and the
//! within-species RANGER-DTL HGT summary, then writes the combined report
//! for every tip pair present to standard output. Diagnostics go to stderr.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cooccur_phylo_hgt::{report, PairTables, TablePaths};

/// Command-line arguments
///
/// Flag spellings match the long-standing pipeline interface.
#[derive(Parser, Debug)]
#[command(name = "cooccur_phylo_hgt")]
#[command(about = "Combine co-occurrence, tip distance, taxa level, and \
within-species RANGER-DTL HGT tables into one report on stdout")]
#[command(version)]
struct Args {
    /// Column(s) from the co-occurrence table to report as association
    /// measures; comma-delimited if multiple are desired
    #[arg(long = "cooccur_measure", value_name = "MEASURE")]
    cooccur_measure: String,

    /// Path to the gzipped co-occurrence table; tab-delimited, starting
    /// with the columns taxon_i and taxon_j
    #[arg(long = "cooccur_tab", value_name = "COOCCUR_TAB")]
    cooccur_tab: PathBuf,

    /// Path to the gzipped tip distances table
    #[arg(
        long = "tip_distances",
        value_name = "TIP_DIST",
        default_value = "/mfs/gdouglas/projects/ocean_mags/phylogenetic_analyses/tip_dist.tsv.gz"
    )]
    tip_distances: PathBuf,

    /// Path to the gzipped HGT pairwise tallies of all combined
    /// RANGER-DTL/HOMER analyses
    #[arg(
        long = "hgt_tab",
        value_name = "HGT_TAB",
        default_value = "/mfs/gdouglas/projects/ocean_mags/water_mag_analysis/species_DTL_analyses/pairwise_hgt_counts.tsv.gz"
    )]
    hgt_tab: PathBuf,

    /// Path to the gzipped taxonomic breakdown table
    #[arg(
        long = "taxa_tab",
        value_name = "TAX_TAB",
        default_value = "/mfs/gdouglas/projects/ocean_mags/mapfiles/MAG_taxa_breakdown.tsv.gz"
    )]
    taxa_tab: PathBuf,
}

fn main() -> Result<()> {
    // Logging goes to stderr; stdout carries only the report.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cooccur_phylo_hgt=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let measures: Vec<String> = args
        .cooccur_measure
        .split(',')
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    if measures.is_empty() {
        bail!("no co-occurrence measures provided");
    }

    let paths = TablePaths {
        cooccur: args.cooccur_tab,
        tip_distances: args.tip_distances,
        taxa: args.taxa_tab,
        hgt: args.hgt_tab,
    };
    let tables = PairTables::load(&paths, &measures)?;
    info!("tables loaded; writing combined report");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    report::write_report(&mut out, &tables)?;
    out.flush().context("Failed to flush report to stdout")?;

    Ok(())
}
