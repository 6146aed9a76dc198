//! Combined-table report
//!
//! Walks the HGT table in file order, validates each pair against the other
//! tables, and writes one denormalized row per pair. The first validation
//! failure aborts the run; rows already written stay on the output.

use std::io::Write;

use anyhow::Result;

use crate::data::PairTables;
use crate::error::PrepError;
use crate::keys::{reversed_key, split_pair};
use crate::taxa::differentiating_rank;

const NA: &str = "NA";

/// Write the header line for the given measure names
pub fn write_header(out: &mut impl Write, measures: &[String]) -> Result<()> {
    let mut fields = vec![
        "taxa_combo".to_string(),
        "taxon_i".to_string(),
        "taxon_j".to_string(),
        "tip_dist".to_string(),
        "species".to_string(),
        "ranger_hgt_tallies".to_string(),
    ];
    for measure in measures {
        fields.push(format!("cooccur_{measure}"));
    }
    writeln!(out, "{}", fields.join("\t"))?;
    Ok(())
}

/// Write the full report: header plus one row per HGT pair
pub fn write_report(out: &mut impl Write, tables: &PairTables) -> Result<()> {
    write_header(out, tables.cooccur.measures())?;

    for (combo, hgt_row) in tables.hgt.iter() {
        let (taxon_i, taxon_j) = split_pair(combo)?;
        let reverse = reversed_key(taxon_i, taxon_j);

        let tip_dist = tables
            .tip_dist
            .get(taxon_i, taxon_j)
            .map(|d| d.to_string())
            .unwrap_or_else(|| NA.to_string());

        let ranks_i = tables
            .taxa
            .get(taxon_i)
            .ok_or_else(|| PrepError::UnknownTaxon(taxon_i.to_string()))?;
        let ranks_j = tables
            .taxa
            .get(taxon_j)
            .ok_or_else(|| PrepError::UnknownTaxon(taxon_j.to_string()))?;
        match differentiating_rank(ranks_i, ranks_j) {
            Some("Strain") => {}
            Some(level) => {
                return Err(PrepError::NotStrainLevel {
                    combo: combo.to_string(),
                    level: level.to_string(),
                }
                .into())
            }
            None => return Err(PrepError::NoRankDifference(combo.to_string()).into()),
        }

        if tables.hgt.contains(&reverse) {
            return Err(PrepError::ReverseHgtPair(reverse).into());
        }

        let measure_values: Vec<String> = match tables.cooccur.get(combo) {
            Some(entry) if entry.reverse_duplicate => {
                return Err(PrepError::ReverseCooccurPair(reverse).into());
            }
            Some(entry) => entry
                .measures
                .iter()
                .map(|v| v.clone().unwrap_or_else(|| NA.to_string()))
                .collect(),
            None if tables.cooccur.get(&reverse).is_some() => {
                return Err(PrepError::ReverseCooccurPair(reverse).into());
            }
            None => vec![NA.to_string(); tables.cooccur.measures().len()],
        };

        let mut fields = vec![
            combo.to_string(),
            taxon_i.to_string(),
            taxon_j.to_string(),
            tip_dist,
            hgt_row.species.clone(),
            hgt_row.hgt_count.to_string(),
        ];
        fields.extend(measure_values);
        writeln!(out, "{}", fields.join("\t"))?;
    }

    Ok(())
}
