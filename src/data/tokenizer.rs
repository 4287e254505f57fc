// ============================================================
// Layer 4 — Sentence Tokenizer
// ============================================================
// Splits a sentence into word and punctuation tokens using the
// `tokenizers` crate's whitespace pre-tokenizer (\w+|[^\w\s]+).
//
//   "Je n'ai pas faim." → ["Je", "n", "'", "ai", "pas", "faim", "."]
//
// The same rules are applied to English and French; the language
// is only kept for logging.
//
// Reference: tokenizers crate documentation (pre_tokenizers)

use anyhow::Result;
use tokenizers::{
    pre_tokenizers::whitespace::Whitespace,
    OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer,
};

#[derive(Debug, Clone)]
pub struct SentenceTokenizer {
    language:      &'static str,
    pre_tokenizer: Whitespace,
}

impl SentenceTokenizer {
    pub fn new(language: &'static str) -> Self {
        Self { language, pre_tokenizer: Whitespace::default() }
    }

    pub fn english() -> Self { Self::new("en") }
    pub fn french()  -> Self { Self::new("fr") }

    pub fn language(&self) -> &'static str {
        self.language
    }

    /// Split `sentence` into owned tokens.
    pub fn tokenize(&self, sentence: &str) -> Result<Vec<String>> {
        let mut pretokenized = PreTokenizedString::from(sentence);
        self.pre_tokenizer
            .pre_tokenize(&mut pretokenized)
            .map_err(|e| anyhow::anyhow!("{} tokenise: {e}", self.language))?;

        Ok(pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Byte)
            .into_iter()
            .map(|(token, _, _)| token.to_string())
            .collect())
    }
}
