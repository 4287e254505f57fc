// ============================================================
// Layer 4 — Sentence Pair Loader
// ============================================================
// Reads the tab-delimited Anki export (fra.txt):
//
//   Go.<TAB>Va !<TAB>CC-BY 2.0 (France) Attribution: tatoeba.org ...
//
// Column 1 is English, column 2 is French, anything after that
// (attribution) is ignored. Lines with fewer than two columns
// are logged and skipped rather than failing the whole load.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (Reading a File)

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use crate::domain::sentence_pair::SentencePair;
use crate::domain::traits::PairSource;

/// Loads sentence pairs from a tab-separated file.
/// Implements the PairSource trait from Layer 3.
pub struct TsvPairLoader {
    path:      PathBuf,
    /// Stop after this many pairs (useful for quick experiments)
    max_pairs: Option<usize>,
}

impl TsvPairLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), max_pairs: None }
    }

    pub fn with_max_pairs(mut self, max_pairs: Option<usize>) -> Self {
        self.max_pairs = max_pairs;
        self
    }
}

impl PairSource for TsvPairLoader {
    fn load_pairs(&self) -> Result<Vec<SentencePair>> {
        let file = File::open(&self.path).with_context(|| {
            format!(
                "Cannot open dataset '{}'. Run 'fetch' first.",
                self.path.display()
            )
        })?;

        let limit     = self.max_pairs.unwrap_or(usize::MAX);
        let mut pairs = Vec::new();
        let mut skipped = 0usize;

        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            if pairs.len() >= limit {
                break;
            }
            let line = line
                .with_context(|| format!("Cannot read line {} of '{}'", line_no + 1, self.path.display()))?;
            if line.trim().is_empty() {
                continue;
            }

            match parse_line(&line) {
                Some(pair) => pairs.push(pair),
                None => {
                    skipped += 1;
                    tracing::warn!("Skipping malformed line {}: {:?}", line_no + 1, line);
                }
            }
        }

        tracing::info!(
            "Loaded {} sentence pairs from '{}' ({} skipped)",
            pairs.len(),
            self.path.display(),
            skipped
        );
        Ok(pairs)
    }
}

/// Split one line into (english, french); `None` when a column is missing.
fn parse_line(line: &str) -> Option<SentencePair> {
    let mut columns = line.split('\t');
    let english = columns.next()?.trim();
    let french  = columns.next()?.trim();
    if english.is_empty() || french.is_empty() {
        return None;
    }
    Some(SentencePair::new(english, french))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tsv(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_parses_columns_and_ignores_attribution() {
        let f = write_tsv("Go.\tVa !\tCC-BY 2.0\nHi.\tSalut !\tCC-BY 2.0\n");
        let pairs = TsvPairLoader::new(f.path()).load_pairs().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], SentencePair::new("Go.", "Va !"));
        assert_eq!(pairs[1].french, "Salut !");
    }

    #[test]
    fn test_skips_malformed_lines() {
        let f = write_tsv("Go.\tVa !\nno tab here\n\nRun!\tCours !\n");
        let pairs = TsvPairLoader::new(f.path()).load_pairs().unwrap();
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_max_pairs_limit() {
        let f = write_tsv("a\tb\nc\td\ne\tf\n");
        let pairs = TsvPairLoader::new(f.path())
            .with_max_pairs(Some(2))
            .load_pairs()
            .unwrap();
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let loader = TsvPairLoader::new("/definitely/not/here/fra.txt");
        assert!(loader.load_pairs().is_err());
    }
}
