// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Saves and loads the English and French vocabularies next to
// the checkpoints, so translation uses exactly the indices the
// model was trained with.
//
//   checkpoints/gru/
//     en_vocab.json   ← ["<unk>", "<pad>", "<bos>", "<eos>", ".", "I", ...]
//     fr_vocab.json
//
// A vocabulary is stored as its index→token list. Loading
// re-validates the special tokens (see Vocab's TryFrom).

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::vocab::Vocab;

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write both vocabularies, creating the directory if needed.
    pub fn save(&self, en_vocab: &Vocab, fr_vocab: &Vocab) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        for (name, vocab) in [("en_vocab.json", en_vocab), ("fr_vocab.json", fr_vocab)] {
            let path = self.dir.join(name);
            fs::write(&path, serde_json::to_string(vocab)?)
                .with_context(|| format!("Cannot write vocabulary to '{}'", path.display()))?;
        }

        tracing::info!(
            "Saved vocabularies ({} en / {} fr) to '{}'",
            en_vocab.len(),
            fr_vocab.len(),
            self.dir.display()
        );
        Ok(())
    }

    /// Load `(english, french)` vocabularies.
    pub fn load(&self) -> Result<(Vocab, Vocab)> {
        Ok((self.load_one("en_vocab.json")?, self.load_one("fr_vocab.json")?))
    }

    fn load_one(&self, name: &str) -> Result<Vocab> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read '{}'. Have you run 'train' first?", path.display())
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid vocabulary file '{}'", path.display()))
    }
}
