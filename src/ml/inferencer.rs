// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds a trained model from its checkpoint directory and
// translates English sentences with beam search.
//
//   train_config.json  → architecture + hyperparameters
//   en/fr_vocab.json   → vocabularies (and so the model's sizes)
//   model_epoch_N      → weights of the latest epoch
//
// The rebuilt model never trains, so its dropout is set to 0.

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::application::train_use_case::TrainConfig;
use crate::data::{dataset::PairEncoder, tokenizer::SentenceTokenizer};
use crate::domain::{architecture::Architecture, vocab::Vocab};
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::{
    rnn::TranslationRnn,
    search::{beam_search, beautify, greedy_search, render, BeamSearchConfig, SearchTokens},
    transformer::TranslationTransformer,
    InferBackend, Seq2Seq,
};

/// A trained model of any of the three architectures.
#[derive(Debug)]
pub enum LoadedModel<B: Backend> {
    Recurrent(TranslationRnn<B>),
    Transformer(TranslationTransformer<B>),
}

impl<B: Backend> LoadedModel<B> {
    /// Build the model `cfg` describes and load the latest weights of `ckpt` into it.
    pub fn load(
        cfg:      &TrainConfig,
        en_vocab: &Vocab,
        fr_vocab: &Vocab,
        ckpt:     &CheckpointManager,
        device:   &B::Device,
    ) -> Result<Self> {
        Ok(match cfg.architecture {
            Architecture::Rnn | Architecture::Gru => {
                let model = cfg.rnn_config(en_vocab.len(), fr_vocab.len()).init::<B>(device);
                Self::Recurrent(ckpt.load_model(model, device)?)
            }
            Architecture::Transformer => {
                let model = cfg.transformer_config(en_vocab, fr_vocab).init::<B>(device);
                Self::Transformer(ckpt.load_model(model, device)?)
            }
        })
    }
}

impl<B: Backend> Seq2Seq<B> for LoadedModel<B> {
    fn forward(&self, source: Tensor<B, 2, Int>, target: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        match self {
            Self::Recurrent(m)   => m.forward(source, target),
            Self::Transformer(m) => m.forward(source, target),
        }
    }
}

pub struct Inferencer<B: Backend = InferBackend> {
    model:          LoadedModel<B>,
    encoder:        PairEncoder,
    search:         BeamSearchConfig,
    /// Longest encoded source, <bos> and <eos> included, seen in training
    max_source_len: usize,
    device:         B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn from_checkpoint(ckpt: &CheckpointManager, device: &B::Device) -> Result<Self> {
        let mut cfg = ckpt.load_config()?;
        cfg.dropout = 0.0;

        let (en_vocab, fr_vocab) = VocabStore::new(ckpt.dir()).load()?;
        let model = LoadedModel::load(&cfg, &en_vocab, &fr_vocab, ckpt, device)?;
        tracing::info!("{} model loaded from '{}'", cfg.architecture, ckpt.dir().display());

        Ok(Self {
            model,
            encoder: PairEncoder {
                en_tokenizer: SentenceTokenizer::english(),
                fr_tokenizer: SentenceTokenizer::french(),
                en_vocab,
                fr_vocab,
            },
            search: BeamSearchConfig {
                beam_width:          cfg.beam_width,
                max_target:          cfg.max_target,
                max_sentence_length: cfg.max_seq_len,
            },
            max_source_len: cfg.max_seq_len + 1,
            device: device.clone(),
        })
    }

    /// Tokenize and encode `sentence`, rejecting empty input and
    /// sentences longer than anything seen in training.
    fn encode_checked(&self, sentence: &str) -> Result<Vec<usize>> {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            bail!("Nothing to translate: the sentence is empty");
        }

        let source = self.encoder.encode_source(sentence)?;
        if source.len() > self.max_source_len {
            bail!(
                "Sentence too long: {} tokens, the model was trained on at most {}",
                source.len() - 2,
                self.max_source_len.saturating_sub(2)
            );
        }
        let unknown = source.iter().filter(|&&t| t == self.encoder.en_vocab.unk_index()).count();
        if unknown > 0 {
            tracing::warn!("{} source token(s) are not in the vocabulary", unknown);
        }
        Ok(source)
    }

    fn search_tokens(&self) -> SearchTokens {
        let fr = &self.encoder.fr_vocab;
        SearchTokens { bos: fr.bos_index(), eos: fr.eos_index(), pad: fr.pad_index() }
    }

    /// Beam-search candidates for `sentence`, most likely first,
    /// as `(beautified French, likelihood)`.
    pub fn translate(&self, sentence: &str) -> Result<Vec<(String, f64)>> {
        let source     = self.encode_checked(sentence)?;
        let hypotheses = beam_search::<B, _>(&self.model, &source, self.search_tokens(), self.search, &self.device);

        tracing::debug!("Beam search kept {} hypotheses", hypotheses.len());
        let fr = &self.encoder.fr_vocab;
        Ok(hypotheses
            .iter()
            .map(|h| (render(h, fr), h.likelihood))
            .collect())
    }

    /// Single translation picking the most likely token at every step.
    pub fn translate_greedy(&self, sentence: &str) -> Result<String> {
        let source = self.encode_checked(sentence)?;
        let tokens = self.search_tokens();
        // <bos> counts towards the maximum sentence length
        let max_length = self.search.max_sentence_length.saturating_sub(1);
        let generated  = greedy_search::<B, _>(&self.model, &source, tokens, max_length, &self.device);

        let end = generated.iter().position(|&t| t == tokens.eos).unwrap_or(generated.len());
        Ok(beautify(&self.encoder.fr_vocab.lookup_tokens(&generated[..end]).join(" ")))
    }
}
