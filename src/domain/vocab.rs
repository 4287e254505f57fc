// ============================================================
// Layer 3 — Vocabulary
// ============================================================
// Maps tokens to integer indices for one language.
//
// Layout of the index space:
//   0 → <unk>   default for any token not seen during building
//   1 → <pad>   fills batches up to the longest sentence
//   2 → <bos>   prepended to every sentence
//   3 → <eos>   appended to every sentence
//   4.. → corpus tokens, most frequent first (ties broken
//         alphabetically so the order is reproducible)
//
// The vocabulary is built once from the training split and is
// frozen afterwards. It serialises as a plain JSON array of
// tokens; deserialising re-validates the layout above.
//
// Reference: Rust Book §8 (HashMaps)

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

pub const UNK: &str = "<unk>";
pub const PAD: &str = "<pad>";
pub const BOS: &str = "<bos>";
pub const EOS: &str = "<eos>";

/// Special tokens in index order.
pub const SPECIALS: [&str; 4] = [UNK, PAD, BOS, EOS];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocab {
    itos: Vec<String>,
    stoi: HashMap<String, usize>,
}

impl Vocab {
    /// Build a vocabulary from tokenized sentences.
    /// Tokens seen fewer than `min_freq` times are left out and will
    /// encode as `<unk>`.
    pub fn build<I, S>(sentences: I, min_freq: usize) -> Self
    where
        I: IntoIterator,
        I::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut freq: HashMap<String, usize> = HashMap::new();
        for tokens in sentences {
            for token in tokens {
                *freq.entry(token.as_ref().to_string()).or_insert(0) += 1;
            }
        }

        let mut words: Vec<(String, usize)> = freq
            .into_iter()
            .filter(|(w, n)| *n >= min_freq && !SPECIALS.contains(&w.as_str()))
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let itos = SPECIALS
            .iter()
            .map(|s| s.to_string())
            .chain(words.into_iter().map(|(w, _)| w))
            .collect();
        Self::from_tokens(itos)
    }

    fn from_tokens(itos: Vec<String>) -> Self {
        let stoi = itos
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { itos, stoi }
    }

    /// Index of `token`, or the `<unk>` index when it is unknown.
    pub fn index(&self, token: &str) -> usize {
        self.stoi.get(token).copied().unwrap_or(self.unk_index())
    }

    pub fn encode<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<usize> {
        tokens.iter().map(|t| self.index(t.as_ref())).collect()
    }

    /// Token at `index`; out-of-range indices read as `<unk>`.
    pub fn token(&self, index: usize) -> &str {
        self.itos.get(index).map(String::as_str).unwrap_or(UNK)
    }

    pub fn lookup_tokens(&self, indices: &[usize]) -> Vec<&str> {
        indices.iter().map(|&i| self.token(i)).collect()
    }

    pub fn len(&self) -> usize {
        self.itos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itos.is_empty()
    }

    pub fn unk_index(&self) -> usize { 0 }
    pub fn pad_index(&self) -> usize { 1 }
    pub fn bos_index(&self) -> usize { 2 }
    pub fn eos_index(&self) -> usize { 3 }
}

impl TryFrom<Vec<String>> for Vocab {
    type Error = String;

    fn try_from(itos: Vec<String>) -> Result<Self, Self::Error> {
        for (i, special) in SPECIALS.iter().enumerate() {
            if itos.get(i).map(String::as_str) != Some(*special) {
                return Err(format!("expected '{special}' at index {i}"));
            }
        }
        let vocab = Self::from_tokens(itos);
        if vocab.stoi.len() != vocab.itos.len() {
            return Err("vocabulary contains duplicate tokens".to_string());
        }
        Ok(vocab)
    }
}

impl From<Vocab> for Vec<String> {
    fn from(v: Vocab) -> Self {
        v.itos
    }
}
