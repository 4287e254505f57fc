// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Teacher-forced train + validation loop using Burn's DataLoader
// and Adam, shared by every architecture through `Seq2Seq`.
//
// One training step on a batch:
//   target_in  = target[:, :-1]   (<bos> w1 w2 ... wn)
//   target_out = target[:, 1:]    (w1 w2 ... wn <eos>)
//   logits     = model(source, target_in)
//   loss       = weighted CE(logits, target_out), padding excluded
//
// Key Burn insight:
//   - Training uses an AutodiffBackend for gradients
//   - model.valid() returns the model on B::InnerBackend with
//     dropout disabled, so validation and sample decoding use it
//   - The weighted CrossEntropyLoss divides by the sum of the
//     target weights, so <pad> gets weight 0 to stay out of the
//     denominator as well as the numerator
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{TranslationBatch, TranslationBatcher},
    dataset::{PreparedData, TranslationDataset},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{
        format_logs, BatchMetrics, EpochMetrics, MetricsAccumulator, MetricsLogger,
        PredictionLogger, PredictionSample,
    },
};
use crate::ml::{
    search::{beam_search, render, BeamSearchConfig, SearchTokens},
    Seq2Seq,
};

/// Fraction of non-padding targets whose true token is among the
/// `k` highest logits.
///
/// real:   [n]          true token ids
/// logits: [n, vocab]   raw model outputs
pub fn topk_accuracy<B: Backend>(
    real:   Tensor<B, 1, Int>,
    logits: Tensor<B, 2>,
    k:      usize,
    pad:    usize,
) -> f64 {
    let [n, vocab] = logits.dims();
    let k = k.clamp(1, vocab);

    let (_, top) = logits.topk_with_indices(k, 1);           // [n, k]
    let real_k   = real.clone().reshape([n, 1]).expand([n, k]);
    let hits     = top.equal(real_k).int().sum_dim(1).reshape([n]);

    let not_pad = real.equal_elem(pad as i64).bool_not().int();
    let total: f64 = not_pad.clone().sum().into_scalar().elem::<f64>();
    if total == 0.0 {
        return 0.0;
    }
    let correct: f64 = (hits * not_pad).sum().into_scalar().elem::<f64>();
    correct / total
}

/// Cross-entropy over the target vocabulary: `<unk>` down-weighted,
/// `<pad>` ignored.
pub fn build_loss<B: Backend>(
    n_tokens_tgt: usize,
    unk:          usize,
    unk_weight:   f64,
    pad:          usize,
    device:       &B::Device,
) -> CrossEntropyLoss<B> {
    let mut weights = vec![1.0f32; n_tokens_tgt];
    weights[unk] = unk_weight as f32;
    weights[pad] = 0.0;

    CrossEntropyLossConfig::new()
        .with_pad_tokens(Some(vec![pad]))
        .with_weights(Some(weights))
        .init(device)
}

/// Teacher-forced forward pass on one batch.
/// Returns the loss tensor (for backward) and its detached metrics.
pub fn loss_batch<B: Backend, M: Seq2Seq<B>>(
    model:   &M,
    batch:   TranslationBatch<B>,
    loss_fn: &CrossEntropyLoss<B>,
    tgt_pad: usize,
) -> (Tensor<B, 1>, BatchMetrics) {
    let [batch_size, tgt_len] = batch.target.dims();
    let target_in  = batch.target.clone().slice([0..batch_size, 0..tgt_len - 1]);
    let target_out = batch.target.slice([0..batch_size, 1..tgt_len]);

    let logits = model.forward(batch.source, target_in);
    let [_, steps, vocab] = logits.dims();
    let logits = logits.reshape([batch_size * steps, vocab]);
    let real   = target_out.reshape([batch_size * steps]);

    let loss = loss_fn.forward(logits.clone(), real.clone());

    let logits = logits.detach();
    let metrics = BatchMetrics {
        loss:  loss.clone().into_scalar().elem::<f64>(),
        top1:  topk_accuracy(real.clone(), logits.clone(), 1, tgt_pad),
        top5:  topk_accuracy(real.clone(), logits.clone(), 5, tgt_pad),
        top10: topk_accuracy(real, logits, 10, tgt_pad),
    };
    (loss, metrics)
}

/// Mean metrics of `model` over every batch of `loader`.
pub fn eval_model<B: Backend, M: Seq2Seq<B>>(
    model:   &M,
    loader:  &dyn DataLoader<TranslationBatch<B>>,
    loss_fn: &CrossEntropyLoss<B>,
    tgt_pad: usize,
) -> BatchMetrics {
    let mut acc = MetricsAccumulator::default();
    for batch in loader.iter() {
        let (_, metrics) = loss_batch(model, batch, loss_fn, tgt_pad);
        acc.push(metrics);
    }
    acc.mean()
}

/// Train `model` for `cfg.epochs` epochs.
///
/// After every epoch: evaluate on the validation split, translate one
/// random training pair and one random validation pair, append to the
/// CSV logs and save a checkpoint in `ckpt`.
pub fn train_model<B, M>(
    mut model: M,
    cfg:       &TrainConfig,
    data:      &PreparedData,
    ckpt:      &CheckpointManager,
    device:    &B::Device,
) -> Result<(M, Vec<EpochMetrics>)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Seq2Seq<B>,
    M::InnerModule: Seq2Seq<B::InnerBackend>,
{
    B::seed(cfg.seed);

    let encoder = data.encoder();
    let src_pad = encoder.en_vocab.pad_index();
    let tgt_pad = encoder.fr_vocab.pad_index();
    let tokens  = SearchTokens {
        bos: encoder.fr_vocab.bos_index(),
        eos: encoder.fr_vocab.eos_index(),
        pad: tgt_pad,
    };
    let search = BeamSearchConfig {
        beam_width:          cfg.beam_width,
        max_target:          cfg.max_target,
        max_sentence_length: cfg.max_seq_len,
    };

    tracing::info!("Model ready: {} parameters", model.num_params());

    // ── Adam optimiser with gradient-norm clipping ────────────────────────────
    // Norm clipping applies to each parameter tensor on its own, not to the
    // global norm over all parameters.
    let optim_cfg = AdamConfig::new()
        .with_beta_1(cfg.beta_1 as f32)
        .with_beta_2(cfg.beta_2 as f32)
        .with_epsilon(1e-8)
        .with_grad_clipping(Some(GradientClippingConfig::Norm(cfg.clip as f32)));
    let mut optim = optim_cfg.init::<B, M>();

    let n_tokens_tgt = encoder.fr_vocab.len();
    let unk          = encoder.fr_vocab.unk_index();
    let train_loss   = build_loss::<B>(n_tokens_tgt, unk, cfg.unk_weight, tgt_pad, device);
    let valid_loss   = build_loss::<B::InnerBackend>(n_tokens_tgt, unk, cfg.unk_weight, tgt_pad, device);

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_loader = DataLoaderBuilder::new(TranslationBatcher::<B>::new(device.clone(), src_pad, tgt_pad))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(data.train.clone());

    let valid_loader = DataLoaderBuilder::new(TranslationBatcher::<B::InnerBackend>::new(device.clone(), src_pad, tgt_pad))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(data.valid.clone());

    let metrics_log     = MetricsLogger::new(ckpt.dir())?;
    let predictions_log = PredictionLogger::new(ckpt.dir())?;

    let mut history       = Vec::with_capacity(cfg.epochs);
    let mut best_val_loss = f64::INFINITY;
    let log_every         = cfg.log_every.max(1);

    println!("Starting training for {} epochs.", cfg.epochs);
    for epoch in 1..=cfg.epochs {
        println!("\nEpoch {epoch}");

        // ── Training phase ────────────────────────────────────────────────────
        let mut window = MetricsAccumulator::default();
        let mut total  = MetricsAccumulator::default();

        for (batch_id, batch) in train_loader.iter().enumerate() {
            let (loss, metrics) = loss_batch(&model, batch, &train_loss, tgt_pad);

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.lr, model, grads);

            window.push(metrics);
            total.push(metrics);
            if (batch_id + 1) % log_every == 0 {
                tracing::info!("[batch {}] {}", batch_id + 1, format_logs("Train", &window.mean()));
                window.clear();
            }
        }
        let train_metrics = total.mean();
        println!("{}", format_logs("Train", &train_metrics));

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid   = model.valid();
        let valid_metrics = eval_model(&model_valid, &*valid_loader, &valid_loss, tgt_pad);
        println!("{}", format_logs("Eval", &valid_metrics));

        // ── Sample translations ───────────────────────────────────────────────
        let mut rng      = StdRng::seed_from_u64(cfg.seed.wrapping_add(epoch as u64));
        let train_sample = sample_translation::<B::InnerBackend, _>(
            &model_valid, &data.train, &mut rng, tokens, search, device,
        );
        let valid_sample = sample_translation::<B::InnerBackend, _>(
            &model_valid, &data.valid, &mut rng, tokens, search, device,
        );
        if let Some(s) = &valid_sample {
            println!("{}", s.source);
            println!("{}", s.predicted);
        }
        predictions_log.log(epoch, train_sample.as_ref(), valid_sample.as_ref())?;

        // ── Record and checkpoint ─────────────────────────────────────────────
        let row = EpochMetrics { epoch, train: train_metrics, valid: valid_metrics };
        metrics_log.log(&row)?;
        if row.is_improvement(best_val_loss) {
            best_val_loss = row.valid.loss;
            tracing::info!("New best validation loss: {:.4}", best_val_loss);
        }
        history.push(row);

        ckpt.save_model::<B, M>(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete!");
    Ok((model, history))
}

/// Beam-search translation of one random pair of `dataset`.
/// `None` when the dataset is empty or the pair cannot be encoded.
fn sample_translation<B: Backend, M: Seq2Seq<B>>(
    model:   &M,
    dataset: &TranslationDataset,
    rng:     &mut StdRng,
    tokens:  SearchTokens,
    search:  BeamSearchConfig,
    device:  &B::Device,
) -> Option<PredictionSample> {
    use burn::data::dataset::Dataset;

    if dataset.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..dataset.len());
    let pair  = dataset.pair(index)?;
    let item  = dataset.get(index)?;

    let best = beam_search::<B, M>(model, &item.source, tokens, search, device).into_iter().next()?;
    Some(PredictionSample {
        source:     pair.english.clone(),
        target:     pair.french.clone(),
        predicted:  render(&best, &dataset.encoder().fr_vocab),
        likelihood: best.likelihood,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::data::{batcher::pad_sequences, dataset::build_datasets, tokenizer::SentenceTokenizer};
    use crate::domain::sentence_pair::SentencePair;
    use crate::ml::{rnn::TranslationRnnConfig, transformer::TranslationTransformerConfig};

    type TestBackend  = NdArray;
    type TestAutodiff = Autodiff<NdArray>;

    const PAD: usize = 1;
    const SRC_TOKENS: usize = 10;
    const TGT_TOKENS: usize = 12;

    #[test]
    fn test_topk_accuracy_ignores_padding() {
        let device = Default::default();
        // Row 0 predicts 2, row 1 predicts 0, row 2 is padding.
        let logits = Tensor::<TestBackend, 1>::from_floats(
            [0.1, 0.2, 0.9, 0.0,
             0.9, 0.1, 0.2, 0.0,
             0.0, 0.0, 0.0, 0.9].as_slice(),
            &device,
        ).reshape([3, 4]);
        let real = Tensor::<TestBackend, 1, Int>::from_ints([2, 2, PAD as i32].as_slice(), &device);

        let top1 = topk_accuracy(real.clone(), logits.clone(), 1, PAD);
        let top2 = topk_accuracy(real.clone(), logits.clone(), 2, PAD);
        assert!((top1 - 0.5).abs() < 1e-9);
        assert!((top2 - 1.0).abs() < 1e-9);

        // k larger than the vocabulary means every real token is a hit.
        assert!((topk_accuracy(real, logits, 10, PAD) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_topk_accuracy_all_padding_is_zero() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::zeros([2, 4], &device);
        let real   = Tensor::<TestBackend, 1, Int>::from_ints([PAD as i32, PAD as i32].as_slice(), &device);
        assert_eq!(topk_accuracy(real, logits, 1, PAD), 0.0);
    }

    #[test]
    fn test_loss_ignores_padding_positions() {
        let device  = Default::default();
        let loss_fn = build_loss::<TestBackend>(4, 0, 0.1, PAD, &device);
        let logits  = Tensor::<TestBackend, 1>::from_floats(
            [0.0, 0.0, 3.0, 0.0,
             5.0, 0.0, 0.0, 0.0].as_slice(),
            &device,
        ).reshape([2, 4]);

        let only_real = loss_fn.forward(
            logits.clone().slice([0..1, 0..4]),
            Tensor::<TestBackend, 1, Int>::from_ints([2].as_slice(), &device),
        );
        let with_pad = loss_fn.forward(
            logits,
            Tensor::<TestBackend, 1, Int>::from_ints([2, PAD as i32].as_slice(), &device),
        );

        let a: f64 = only_real.into_scalar().elem();
        let b: f64 = with_pad.into_scalar().elem();
        assert!((a - b).abs() < 1e-5, "{a} != {b}");
    }

    fn fixed_batch(device: &<TestAutodiff as Backend>::Device) -> TranslationBatch<TestAutodiff> {
        let sources: [&[usize]; 3] = [&[2, 4, 5, 3], &[2, 6, 3], &[2, 7, 8, 9, 3]];
        let targets: [&[usize]; 3] = [&[2, 4, 5, 3], &[2, 6, 7, 8, 3], &[2, 9, 3]];
        TranslationBatch {
            source: pad_sequences(&sources, PAD, device),
            target: pad_sequences(&targets, PAD, device),
        }
    }

    /// Loss on a fixed batch before and after `steps` Adam updates.
    fn loss_before_and_after<M>(mut model: M, steps: usize) -> (f64, f64)
    where
        M: AutodiffModule<TestAutodiff> + Seq2Seq<TestAutodiff>,
    {
        let device  = Default::default();
        let loss_fn = build_loss::<TestAutodiff>(TGT_TOKENS, 0, 0.1, PAD, &device);
        let mut optim = AdamConfig::new()
            .with_grad_clipping(Some(GradientClippingConfig::Norm(5.0)))
            .init::<TestAutodiff, M>();

        let (_, before) = loss_batch(&model, fixed_batch(&device), &loss_fn, PAD);
        for _ in 0..steps {
            let (loss, _) = loss_batch(&model, fixed_batch(&device), &loss_fn, PAD);
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(1e-2, model, grads);
        }
        let (_, after) = loss_batch(&model, fixed_batch(&device), &loss_fn, PAD);
        (before.loss, after.loss)
    }

    #[test]
    fn test_rnn_loss_decreases() {
        TestAutodiff::seed(0);
        let model = TranslationRnnConfig::new(SRC_TOKENS, TGT_TOKENS, 8, 16, 1, 0.0, false)
            .init::<TestAutodiff>(&Default::default());
        let (before, after) = loss_before_and_after(model, 30);
        assert!(after < before, "loss went from {before} to {after}");
    }

    #[test]
    fn test_gru_loss_decreases() {
        TestAutodiff::seed(0);
        let model = TranslationRnnConfig::new(SRC_TOKENS, TGT_TOKENS, 8, 16, 2, 0.0, true)
            .init::<TestAutodiff>(&Default::default());
        let (before, after) = loss_before_and_after(model, 30);
        assert!(after < before, "loss went from {before} to {after}");
    }

    #[test]
    fn test_transformer_loss_decreases() {
        TestAutodiff::seed(0);
        let model = TranslationTransformerConfig::new(SRC_TOKENS, TGT_TOKENS, 2, 8, 16, 1, 0.0, PAD, PAD)
            .init::<TestAutodiff>(&Default::default());
        let (before, after) = loss_before_and_after(model, 30);
        assert!(after < before, "loss went from {before} to {after}");
    }

    #[test]
    fn test_train_model_writes_logs_and_checkpoints() {
        let pairs = vec![
            SentencePair::new("I run.", "Je cours."),
            SentencePair::new("You run.", "Tu cours."),
            SentencePair::new("I eat.", "Je mange."),
            SentencePair::new("You eat.", "Tu manges."),
        ];
        let data = build_datasets(
            &pairs, &pairs[..2],
            SentenceTokenizer::english(), SentenceTokenizer::french(),
            60, 1,
        ).unwrap();

        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let cfg  = TrainConfig {
            epochs:      2,
            batch_size:  2,
            log_every:   1,
            beam_width:  2,
            max_target:  3,
            max_seq_len: 6,
            ..TrainConfig::default()
        };

        let device = Default::default();
        let model  = TranslationRnnConfig::new(
            data.encoder().en_vocab.len(),
            data.encoder().fr_vocab.len(),
            8, 8, 1, 0.0, true,
        ).init::<TestAutodiff>(&device);

        let (_, history) = train_model::<TestAutodiff, _>(model, &cfg, &data, &ckpt, &device).unwrap();

        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|m| m.train.loss.is_finite() && m.valid.loss.is_finite()));
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);

        let metrics = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(metrics.lines().count(), 3);
        let predictions = std::fs::read_to_string(dir.path().join("predictions.csv")).unwrap();
        assert_eq!(predictions.lines().count(), 3);
    }
}
