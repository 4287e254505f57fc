use std::sync::Arc;

use anyhow::{Context, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::{preprocessor::Preprocessor, tokenizer::SentenceTokenizer};
use crate::domain::{sentence_pair::SentencePair, vocab::Vocab};

/// One encoded pair: `<bos> tokens <eos>` on both sides, not padded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationItem {
    pub source: Vec<usize>,
    pub target: Vec<usize>,
}

/// Tokenizers and vocabularies for both languages.
#[derive(Debug, Clone)]
pub struct PairEncoder {
    pub en_tokenizer: SentenceTokenizer,
    pub fr_tokenizer: SentenceTokenizer,
    pub en_vocab:     Vocab,
    pub fr_vocab:     Vocab,
}

impl PairEncoder {
    pub fn encode_source(&self, sentence: &str) -> Result<Vec<usize>> {
        encode_framed(&self.en_tokenizer, &self.en_vocab, sentence)
    }

    pub fn encode_target(&self, sentence: &str) -> Result<Vec<usize>> {
        encode_framed(&self.fr_tokenizer, &self.fr_vocab, sentence)
    }

    pub fn encode(&self, pair: &SentencePair) -> Result<TranslationItem> {
        Ok(TranslationItem {
            source: self.encode_source(&pair.english)?,
            target: self.encode_target(&pair.french)?,
        })
    }
}

fn encode_framed(tokenizer: &SentenceTokenizer, vocab: &Vocab, sentence: &str) -> Result<Vec<usize>> {
    let tokens = tokenizer.tokenize(sentence)?;
    let mut ids = Vec::with_capacity(tokens.len() + 2);
    ids.push(vocab.bos_index());
    ids.extend(vocab.encode(&tokens));
    ids.push(vocab.eos_index());
    Ok(ids)
}

/// Sentence pairs encoded up front, next to their raw text. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TranslationDataset {
    pairs:   Arc<Vec<SentencePair>>,
    items:   Arc<Vec<TranslationItem>>,
    encoder: Arc<PairEncoder>,
}

impl TranslationDataset {
    /// Fails on the first pair that cannot be encoded.
    pub fn new(pairs: Vec<SentencePair>, encoder: Arc<PairEncoder>) -> Result<Self> {
        let items = pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| encoder.encode(pair).with_context(|| format!("Cannot encode pair {i}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { pairs: Arc::new(pairs), items: Arc::new(items), encoder })
    }

    /// The raw sentences at `index`, used to show sample translations.
    pub fn pair(&self, index: usize) -> Option<&SentencePair> {
        self.pairs.get(index)
    }

    pub fn encoder(&self) -> &PairEncoder {
        &self.encoder
    }
}

impl Dataset<TranslationItem> for TranslationDataset {
    fn get(&self, index: usize) -> Option<TranslationItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Training and validation datasets sharing one encoder.
pub struct PreparedData {
    pub train: TranslationDataset,
    pub valid: TranslationDataset,
}

impl PreparedData {
    pub fn encoder(&self) -> &PairEncoder {
        self.train.encoder()
    }
}

/// Filter both splits, build vocabularies from the filtered
/// training split only, and wrap both splits as datasets.
pub fn build_datasets(
    train:          &[SentencePair],
    valid:          &[SentencePair],
    en_tokenizer:   SentenceTokenizer,
    fr_tokenizer:   SentenceTokenizer,
    max_words:      usize,
    min_token_freq: usize,
) -> Result<PreparedData> {
    let preprocessor = Preprocessor::new(&en_tokenizer, &fr_tokenizer, max_words);
    let train = preprocessor.filter(train)?;
    let valid = preprocessor.filter(valid)?;

    let en_tokens = train
        .iter()
        .map(|p| en_tokenizer.tokenize(&p.english))
        .collect::<Result<Vec<_>>>()?;
    let fr_tokens = train
        .iter()
        .map(|p| fr_tokenizer.tokenize(&p.french))
        .collect::<Result<Vec<_>>>()?;

    let en_vocab = Vocab::build(en_tokens, min_token_freq);
    let fr_vocab = Vocab::build(fr_tokens, min_token_freq);
    tracing::info!(
        "Vocabularies: {} English tokens, {} French tokens (min_freq={})",
        en_vocab.len(),
        fr_vocab.len(),
        min_token_freq
    );

    let encoder = Arc::new(PairEncoder { en_tokenizer, fr_tokenizer, en_vocab, fr_vocab });
    Ok(PreparedData {
        train: TranslationDataset::new(train, encoder.clone())?,
        valid: TranslationDataset::new(valid, encoder)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<SentencePair> {
        vec![
            SentencePair::new("I run.", "Je cours."),
            SentencePair::new("I eat.", "Je mange."),
            SentencePair::new("You run.", "Tu cours."),
        ]
    }

    #[test]
    fn test_items_are_framed_with_bos_and_eos() {
        let data = build_datasets(
            &corpus(), &corpus()[..1],
            SentenceTokenizer::english(), SentenceTokenizer::french(),
            60, 1,
        ).unwrap();

        let item = data.train.get(0).unwrap();
        let en   = &data.encoder().en_vocab;
        let fr   = &data.encoder().fr_vocab;
        assert_eq!(item.source.first(), Some(&en.bos_index()));
        assert_eq!(item.source.last(),  Some(&en.eos_index()));
        assert_eq!(fr.lookup_tokens(&item.target), vec!["<bos>", "Je", "cours", ".", "<eos>"]);
    }

    #[test]
    fn test_vocab_comes_from_training_split_only() {
        let valid = vec![SentencePair::new("Unseen words.", "Mots inconnus.")];
        let data  = build_datasets(
            &corpus(), &valid,
            SentenceTokenizer::english(), SentenceTokenizer::french(),
            60, 1,
        ).unwrap();

        let item = data.valid.get(0).unwrap();
        let unk  = data.encoder().en_vocab.unk_index();
        assert_eq!(item.source[1], unk);
        assert_eq!(data.valid.len(), 1);
        assert!(data.valid.get(1).is_none());
    }

    #[test]
    fn test_every_pair_is_encoded_up_front() {
        let data = build_datasets(
            &corpus(), &[],
            SentenceTokenizer::english(), SentenceTokenizer::french(),
            60, 1,
        ).unwrap();

        let items: Vec<TranslationItem> = data.train.iter().collect();
        assert_eq!(items.len(), corpus().len());
        for (i, item) in items.iter().enumerate() {
            let pair = data.train.pair(i).unwrap();
            assert_eq!(item, &data.encoder().encode(pair).unwrap());
        }
        assert!(data.valid.is_empty());
    }
}
