// ============================================================
// Layer 4 — Pair Preprocessor
// ============================================================
// Cleans the raw corpus before vocabularies are built:
//
//   1. Drop pairs where either sentence has `max_words` tokens
//      or more. Long sentences dominate batch padding and memory.
//   2. Remove stray newline characters inside sentences.
//
// Reference: Rust Book §13 (Iterators)

use anyhow::Result;

use crate::data::tokenizer::SentenceTokenizer;
use crate::domain::sentence_pair::SentencePair;

pub struct Preprocessor<'a> {
    en_tokenizer: &'a SentenceTokenizer,
    fr_tokenizer: &'a SentenceTokenizer,
    max_words:    usize,
}

impl<'a> Preprocessor<'a> {
    pub fn new(
        en_tokenizer: &'a SentenceTokenizer,
        fr_tokenizer: &'a SentenceTokenizer,
        max_words:    usize,
    ) -> Self {
        Self { en_tokenizer, fr_tokenizer, max_words }
    }

    /// Keep only pairs short enough on both sides.
    pub fn filter(&self, pairs: &[SentencePair]) -> Result<Vec<SentencePair>> {
        let mut kept = Vec::with_capacity(pairs.len());

        for pair in pairs {
            if self.en_tokenizer.tokenize(&pair.english)?.len() >= self.max_words
                || self.fr_tokenizer.tokenize(&pair.french)?.len() >= self.max_words
            {
                continue;
            }
            kept.push(SentencePair::new(
                pair.english.replace('\n', ""),
                pair.french.replace('\n', ""),
            ));
        }

        tracing::debug!(
            "Preprocessing kept {} of {} pairs (max_words={})",
            kept.len(),
            pairs.len(),
            self.max_words
        );
        Ok(kept)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_long_pairs() {
        let en = SentenceTokenizer::english();
        let fr = SentenceTokenizer::french();
        let p  = Preprocessor::new(&en, &fr, 4);

        let pairs = vec![
            SentencePair::new("Go.", "Va !"),                            // 2 / 2 tokens
            SentencePair::new("I am very hungry.", "J'ai faim."),         // 5 English tokens
            SentencePair::new("Hi.", "Je suis très content."),            // 5 French tokens
        ];
        let kept = p.filter(&pairs).unwrap();
        assert_eq!(kept, vec![SentencePair::new("Go.", "Va !")]);
    }

    #[test]
    fn test_limit_is_exclusive() {
        let en = SentenceTokenizer::english();
        let fr = SentenceTokenizer::french();
        // "a b c" is exactly 3 tokens → dropped with max_words = 3
        let p  = Preprocessor::new(&en, &fr, 3);
        let kept = p.filter(&[SentencePair::new("a b c", "a")]).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn test_strips_newlines() {
        let en = SentenceTokenizer::english();
        let fr = SentenceTokenizer::french();
        let p  = Preprocessor::new(&en, &fr, 10);
        let kept = p.filter(&[SentencePair::new("Go.\n", "Va !\n")]).unwrap();
        assert_eq!(kept[0], SentencePair::new("Go.", "Va !"));
    }
}
