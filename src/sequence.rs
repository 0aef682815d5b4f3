//! Motif scanning and reverse complementation, delegated to rust-bio.
//!
//! Nothing here implements a sequence algorithm: [`BomScanner`] wraps
//! rust-bio's Backward Oracle Matching searcher and [`reverse_complement`]
//! wraps its DNA complement table.

use anyhow::{Result, bail};
use bio::alphabets::dna;
use bio::pattern_matching::bom::BOM;
use tracing::debug;

use crate::align::Sequence;

pub trait MotifScanner {
    /// 0-based start offsets of every occurrence of `motif` in `sequence`.
    fn scan(&self, sequence: &Sequence, motif: &str) -> Result<Vec<usize>>;
}

/// Exact motif search with rust-bio's BOM automaton.
#[derive(Debug, Clone, Copy, Default)]
pub struct BomScanner;

impl MotifScanner for BomScanner {
    fn scan(&self, sequence: &Sequence, motif: &str) -> Result<Vec<usize>> {
        let motif = motif.trim().to_ascii_uppercase();
        if motif.is_empty() {
            bail!("motif must not be empty");
        }
        if motif.len() > sequence.len() {
            return Ok(Vec::new());
        }

        let bom = BOM::new(motif.as_bytes());
        let mut hits: Vec<usize> = bom.find_all(sequence.residues().as_bytes()).collect();
        hits.sort_unstable();
        debug!(id = sequence.id(), %motif, hits = hits.len(), "scanned motif");

        Ok(hits)
    }
}

/// Reverse complement of a DNA sequence; IUPAC ambiguity codes are
/// complemented too.
pub fn reverse_complement(sequence: &Sequence) -> Result<Sequence> {
    let residues = sequence.residues().as_bytes();
    if !dna::iupac_alphabet().is_word(residues) {
        bail!("sequence '{}' is not IUPAC DNA", sequence.id());
    }

    let complemented = dna::revcomp(residues);
    // revcomp maps ASCII to ASCII
    Sequence::new(
        format!("{}_rc", sequence.id()),
        &String::from_utf8_lossy(&complemented),
    )
}
