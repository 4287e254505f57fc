// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer only talks to these traits, so the
// concrete loader and model can change without touching it.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::sentence_pair::SentencePair;

// ─── PairSource ───────────────────────────────────────────────────────────────
/// Any component that can produce the parallel corpus.
///
/// Implementations:
///   - TsvPairLoader → reads the tab-delimited Anki export
pub trait PairSource {
    /// Load every available sentence pair from this source.
    fn load_pairs(&self) -> Result<Vec<SentencePair>>;
}

// ─── Translator ───────────────────────────────────────────────────────────────
/// Any component that can translate an English sentence.
///
/// Implementations:
///   - TranslateUseCase → beam search over a trained checkpoint
pub trait Translator {
    /// Return candidate translations with their likelihood,
    /// most likely first.
    fn translate(&self, sentence: &str) -> Result<Vec<(String, f64)>>;
}
