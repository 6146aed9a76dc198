//! Taxonomic rank levels and the differentiating-rank scan
//!
//! Every taxon carries a classification at 8 fixed levels. Two taxa in an
//! HGT pair must first diverge at the Strain level; the scan below finds
//! that first point of divergence.

use smallvec::SmallVec;

/// The fixed classification levels, coarsest to finest
pub const RANK_LEVELS: [&str; 8] = [
    "Domain", "Phylum", "Class", "Order", "Family", "Genus", "Species", "Strain",
];

/// One taxon's classification in [`RANK_LEVELS`] order; `None` is an NA cell
pub type RankVector = SmallVec<[Option<String>; 8]>;

/// First rank at which two classifications diverge
///
/// An NA cell never compares equal, not even to another NA, so two taxa
/// that are both unclassified at a level diverge there. Returns `None`
/// when every level matches.
pub fn differentiating_rank(a: &RankVector, b: &RankVector) -> Option<&'static str> {
    for (idx, level) in RANK_LEVELS.iter().enumerate() {
        let differ = match (
            a.get(idx).and_then(|v| v.as_deref()),
            b.get(idx).and_then(|v| v.as_deref()),
        ) {
            (Some(x), Some(y)) => x != y,
            _ => true,
        };
        if differ {
            return Some(level);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank_vector(values: &[&str]) -> RankVector {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_strain_level_difference() {
        let a = rank_vector(&["Bacteria", "P", "C", "O", "F", "G", "S", "strain_1"]);
        let b = rank_vector(&["Bacteria", "P", "C", "O", "F", "G", "S", "strain_2"]);
        assert_eq!(differentiating_rank(&a, &b), Some("Strain"));
    }

    #[test]
    fn test_coarser_difference_wins() {
        let a = rank_vector(&["Bacteria", "P1", "C", "O", "F", "G1", "S1", "s1"]);
        let b = rank_vector(&["Bacteria", "P1", "C", "O", "F", "G2", "S2", "s2"]);
        assert_eq!(differentiating_rank(&a, &b), Some("Genus"));
    }

    #[test]
    fn test_identical_vectors() {
        let a = rank_vector(&["Bacteria", "P", "C", "O", "F", "G", "S", "s"]);
        assert_eq!(differentiating_rank(&a, &a.clone()), None);
    }

    #[test]
    fn test_na_never_equal() {
        // Both unclassified at Strain: still counts as diverging there.
        let mut a = rank_vector(&["Bacteria", "P", "C", "O", "F", "G", "S"]);
        a.push(None);
        let mut b = rank_vector(&["Bacteria", "P", "C", "O", "F", "G", "S"]);
        b.push(None);
        assert_eq!(differentiating_rank(&a, &b), Some("Strain"));
    }

    #[test]
    fn test_na_against_value() {
        let mut a = rank_vector(&["Bacteria"]);
        a.push(None);
        let b = rank_vector(&["Bacteria", "P"]);
        assert_eq!(differentiating_rank(&a, &b), Some("Phylum"));
    }
}
