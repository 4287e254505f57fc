// ============================================================
// Layer 3 — SentencePair Domain Type
// ============================================================
// One line of the bilingual corpus: an English sentence and its
// French translation. Read once from disk, never mutated.
//
// Reference: Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

/// A source/target pair. English is always the source language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePair {
    /// Source sentence
    pub english: String,

    /// Reference translation
    pub french: String,
}

impl SentencePair {
    pub fn new(english: impl Into<String>, french: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            french:  french.into(),
        }
    }
}
