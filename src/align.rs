//! Pairwise/multiple sequence alignment through an external program.
//!
//! Alignment itself is not implemented here. [`ClustalwAligner`] shells out
//! to ClustalW and returns whatever alignment text it produced.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{debug, instrument};

/// Program name looked up on `PATH` when none is configured.
pub const DEFAULT_CLUSTALW: &str = "clustalw2";

const FASTA_LINE_WIDTH: usize = 60;

/// A named nucleotide or protein sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    id: String,
    residues: String,
}

impl Sequence {
    /// Residues are upper-cased; anything outside the IUPAC letters, `*` and
    /// `-` is rejected.
    pub fn new(id: impl Into<String>, residues: &str) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            bail!("sequence id must be non-empty and contain no whitespace");
        }

        let residues = residues.trim().to_ascii_uppercase();
        if residues.is_empty() {
            bail!("sequence '{id}' is empty");
        }
        if let Some(bad) = residues
            .chars()
            .find(|c| !(c.is_ascii_uppercase() || *c == '*' || *c == '-'))
        {
            bail!("sequence '{id}' contains invalid residue '{bad}'");
        }

        Ok(Self { id, residues })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn residues(&self) -> &str {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

impl fmt::Display for Sequence {
    /// FASTA record, wrapped at 60 columns.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ">{}", self.id)?;
        for line in self.residues.as_bytes().chunks(FASTA_LINE_WIDTH) {
            // residues are ASCII, checked in `new`
            writeln!(f, "{}", String::from_utf8_lossy(line))?;
        }
        Ok(())
    }
}

/// Alignment text as produced by the aligner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    text: String,
}

impl Alignment {
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

pub trait SequenceAligner {
    fn align(&self, sequences: &[Sequence]) -> Result<Alignment>;
}

/// Runs ClustalW on a temporary FASTA file.
#[derive(Debug, Clone)]
pub struct ClustalwAligner {
    program: PathBuf,
}

impl Default for ClustalwAligner {
    fn default() -> Self {
        Self::new(DEFAULT_CLUSTALW)
    }
}

impl ClustalwAligner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }
}

/// Concatenated FASTA records for `sequences`.
pub fn to_fasta(sequences: &[Sequence]) -> String {
    sequences.iter().map(ToString::to_string).collect()
}

impl SequenceAligner for ClustalwAligner {
    #[instrument(skip_all, fields(program = %self.program.display(), count = sequences.len()))]
    fn align(&self, sequences: &[Sequence]) -> Result<Alignment> {
        if sequences.len() < 2 {
            bail!("alignment needs at least two sequences");
        }

        let workdir = tempfile::tempdir().context("failed to create alignment work directory")?;
        let infile = workdir.path().join("input.fasta");
        let outfile = workdir.path().join("output.aln");
        fs::write(&infile, to_fasta(sequences)).context("failed to write FASTA input")?;

        let output = Command::new(&self.program)
            .arg(format!("-INFILE={}", infile.display()))
            .arg(format!("-OUTFILE={}", outfile.display()))
            .arg("-OUTPUT=CLUSTAL")
            .arg("-QUIET")
            .current_dir(workdir.path())
            .output()
            .with_context(|| format!("failed to run aligner '{}'", self.program.display()))?;

        if !output.status.success() {
            bail!(
                "aligner '{}' exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let text = fs::read_to_string(&outfile).with_context(|| {
            format!(
                "aligner '{}' produced no alignment file",
                self.program.display()
            )
        })?;
        debug!(bytes = text.len(), "alignment complete");

        Ok(Alignment { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_normalizes_case() {
        let s = Sequence::new("seq1", " acgtagt\n").unwrap();
        assert_eq!(s.residues(), "ACGTAGT");
        assert_eq!(s.len(), 7);
    }

    #[test]
    fn sequence_rejects_bad_input() {
        assert!(Sequence::new("seq1", "ACGT1").is_err());
        assert!(Sequence::new("seq1", "").is_err());
        assert!(Sequence::new("has space", "ACGT").is_err());
        assert!(Sequence::new("", "ACGT").is_err());
    }

    #[test]
    fn fasta_wraps_long_sequences() {
        let s = Sequence::new("long", &"A".repeat(130)).unwrap();
        let fasta = s.to_string();
        let lines: Vec<_> = fasta.lines().collect();

        assert_eq!(lines[0], ">long");
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2].len(), 60);
        assert_eq!(lines[3].len(), 10);
    }

    #[test]
    fn fasta_concatenates_records() {
        let seqs = [
            Sequence::new("seq1", "ACGTAGTACGTAGTACGTAGT").unwrap(),
            Sequence::new("seq2", "TACGTACGTACGTACGTACGT").unwrap(),
        ];
        assert_eq!(
            to_fasta(&seqs),
            ">seq1\nACGTAGTACGTAGTACGTAGT\n>seq2\nTACGTACGTACGTACGTACGT\n"
        );
    }

    #[test]
    fn align_needs_two_sequences() {
        let one = [Sequence::new("seq1", "ACGT").unwrap()];
        assert!(ClustalwAligner::default().align(&one).is_err());
    }

    #[test]
    fn missing_program_is_reported() {
        let seqs = [
            Sequence::new("seq1", "ACGT").unwrap(),
            Sequence::new("seq2", "ACGA").unwrap(),
        ];
        let aligner = ClustalwAligner::new("/nonexistent/pwcrypt-clustalw");

        let err = aligner.align(&seqs).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/pwcrypt-clustalw"));
    }
}
