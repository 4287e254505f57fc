// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load sentence pairs          (Layer 4 - data)
//   Step 2: Split train/validation       (Layer 4 - data)
//   Step 3: Filter, build vocabularies,
//           build datasets               (Layer 4 - data)
//   Step 4: Save config + vocabularies   (Layer 6 - infra)
//   Step 5: Build the chosen model       (Layer 5 - ml)
//   Step 6: Run training loop            (Layer 5 - ml)
//
// Steps 1-3 are exposed on their own (`prepare_data`) so the
// comparison workflow can prepare the data once and train
// every architecture on exactly the same pairs.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Result};
use burn::{data::dataset::Dataset, module::{AutodiffModule, Module}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{
    dataset::{build_datasets, PreparedData},
    loader::TsvPairLoader,
    splitter::split_train_val,
    tokenizer::SentenceTokenizer,
};
use crate::domain::{architecture::Architecture, traits::PairSource, vocab::Vocab};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::EpochMetrics,
    vocab_store::VocabStore,
};
use crate::ml::{
    rnn::TranslationRnnConfig,
    trainer::train_model,
    transformer::TranslationTransformerConfig,
    InferBackend, Seq2Seq, TrainBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved next to the checkpoints and
// reloaded to rebuild the model for translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Tab-separated English/French pairs (fra.txt)
    pub data_file:      String,
    /// Root directory; each architecture gets its own subdirectory
    pub checkpoint_dir: String,
    pub architecture:   Architecture,
    /// Only read the first N pairs of the file
    pub max_pairs:      Option<usize>,

    /// Pairs with a side of this many tokens or more are dropped
    pub max_seq_len:    usize,
    /// Tokens seen fewer times in the training split map to <unk>
    pub min_token_freq: usize,
    pub valid_fraction: f64,

    pub epochs:         usize,
    pub batch_size:     usize,
    pub lr:             f64,
    pub beta_1:         f64,
    pub beta_2:         f64,
    /// Gradient norm clipping threshold
    pub clip:           f64,
    /// Loss weight of the <unk> target token
    pub unk_weight:     f64,

    pub n_heads:        usize,
    pub dim_embedding:  usize,
    pub dim_hidden:     usize,
    pub n_layers:       usize,
    pub dropout:        f64,

    pub seed:           u64,
    /// Batches between two training log lines
    pub log_every:      usize,
    pub beam_width:     usize,
    /// Hypotheses kept by the beam search
    pub max_target:     usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_file:      "data/fra.txt".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            architecture:   Architecture::Transformer,
            max_pairs:      None,
            max_seq_len:    60,
            min_token_freq: 2,
            valid_fraction: 0.1,
            epochs:         5,
            batch_size:     128,
            lr:             1e-3,
            beta_1:         0.9,
            beta_2:         0.99,
            clip:           5.0,
            unk_weight:     0.1,
            n_heads:        4,
            dim_embedding:  196,
            dim_hidden:     256,
            n_layers:       3,
            dropout:        0.1,
            seed:           0,
            log_every:      50,
            beam_width:     10,
            max_target:     100,
        }
    }
}

impl TrainConfig {
    /// Reject hyperparameters the models cannot be built or trained with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.n_layers == 0 {
            bail!("n_layers must be at least 1");
        }
        if self.architecture == Architecture::Transformer {
            if self.n_heads == 0 {
                bail!("n_heads must be at least 1");
            }
            if self.dim_embedding % self.n_heads != 0 {
                bail!(
                    "dim_embedding ({}) must be divisible by n_heads ({})",
                    self.dim_embedding,
                    self.n_heads
                );
            }
        }
        Ok(())
    }

    /// `{checkpoint_dir}/{architecture}`
    pub fn run_dir(&self) -> PathBuf {
        Path::new(&self.checkpoint_dir).join(self.architecture.slug())
    }

    pub fn rnn_config(&self, n_tokens_src: usize, n_tokens_tgt: usize) -> TranslationRnnConfig {
        TranslationRnnConfig::new(
            n_tokens_src,
            n_tokens_tgt,
            self.dim_embedding,
            self.dim_hidden,
            self.n_layers,
            self.dropout,
            self.architecture == Architecture::Gru,
        )
    }

    pub fn transformer_config(&self, en_vocab: &Vocab, fr_vocab: &Vocab) -> TranslationTransformerConfig {
        // <bos> and <eos> frame sentences of up to max_seq_len - 1 tokens
        TranslationTransformerConfig::new(
            en_vocab.len(),
            fr_vocab.len(),
            self.n_heads,
            self.dim_embedding,
            self.dim_hidden,
            self.n_layers,
            self.dropout,
            en_vocab.pad_index(),
            fr_vocab.pad_index(),
        )
        .with_max_positions(self.max_seq_len + 1)
    }
}

/// Steps 1-3: load, split, filter and encode the corpus.
pub fn prepare_data(cfg: &TrainConfig) -> Result<PreparedData> {
    // ── Step 1: Load sentence pairs ───────────────────────────────────────────
    tracing::info!("Loading sentence pairs from '{}'", cfg.data_file);
    let pairs = TsvPairLoader::new(&cfg.data_file)
        .with_max_pairs(cfg.max_pairs)
        .load_pairs()?;
    if pairs.is_empty() {
        bail!("No sentence pairs found in '{}'", cfg.data_file);
    }
    tracing::info!("Loaded {} pairs", pairs.len());

    // ── Step 2: Train / validation split ──────────────────────────────────────
    let (train, valid) = split_train_val(pairs, cfg.valid_fraction, cfg.seed);

    // ── Step 3: Filter long pairs, build vocabularies and datasets ────────────
    let data = build_datasets(
        &train,
        &valid,
        SentenceTokenizer::english(),
        SentenceTokenizer::french(),
        cfg.max_seq_len,
        cfg.min_token_freq,
    )?;
    if data.train.is_empty() {
        bail!(
            "No training pairs left after filtering (max_seq_len={})",
            cfg.max_seq_len
        );
    }
    tracing::info!(
        "Split: {} train, {} validation",
        data.train.len(),
        data.valid.len()
    );

    Ok(data)
}

/// What a finished training run produced.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub architecture: Architecture,
    pub num_params:   usize,
    pub history:      Vec<EpochMetrics>,
}

/// Steps 4-6 on already prepared data.
pub fn train_prepared(cfg: &TrainConfig, data: &PreparedData) -> Result<TrainOutcome> {
    cfg.validate()?;

    // ── Step 4: Save config and vocabularies for translation ──────────────────
    let ckpt    = CheckpointManager::new(cfg.run_dir())?;
    let encoder = data.encoder();
    ckpt.save_config(cfg)?;
    VocabStore::new(ckpt.dir()).save(&encoder.en_vocab, &encoder.fr_vocab)?;

    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Training {} on WGPU device: {:?}", cfg.architecture, device);

    // ── Steps 5-6: Build model and run training loop (Layer 5) ────────────────
    let n_src = encoder.en_vocab.len();
    let n_tgt = encoder.fr_vocab.len();
    match cfg.architecture {
        Architecture::Rnn | Architecture::Gru => {
            let model = cfg.rnn_config(n_src, n_tgt).init::<TrainBackend>(&device);
            fit(model, cfg, data, &ckpt, &device)
        }
        Architecture::Transformer => {
            let model = cfg
                .transformer_config(&encoder.en_vocab, &encoder.fr_vocab)
                .init::<TrainBackend>(&device);
            fit(model, cfg, data, &ckpt, &device)
        }
    }
}

fn fit<M>(
    model:  M,
    cfg:    &TrainConfig,
    data:   &PreparedData,
    ckpt:   &CheckpointManager,
    device: &burn::backend::wgpu::WgpuDevice,
) -> Result<TrainOutcome>
where
    M: AutodiffModule<TrainBackend> + Seq2Seq<TrainBackend>,
    M::InnerModule: Seq2Seq<InferBackend>,
{
    let num_params = model.num_params();
    let (_, history) = train_model::<TrainBackend, M>(model, cfg, data, ckpt, device)?;
    Ok(TrainOutcome { architecture: cfg.architecture, num_params, history })
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and trains one architecture end to end.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainOutcome> {
        self.config.validate()?;
        let data = prepare_data(&self.config)?;
        train_prepared(&self.config, &data)
    }
}
