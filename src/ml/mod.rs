// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here.
//
//   rnn.rs         — vanilla RNN and GRU encoder/decoder
//   transformer.rs — attention encoder/decoder
//   trainer.rs     — teacher-forced training loop, loss and
//                    top-k accuracy, validation, checkpointing
//   search.rs      — greedy and beam search decoding
//   inferencer.rs  — rebuilds a trained model from a checkpoint
//
// Every model implements `Seq2Seq`, so the trainer and the
// search functions never need to know which architecture
// they are driving.
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Sutskever et al. (2014) Sequence to Sequence Learning
//            Vaswani et al. (2017) Attention Is All You Need

use burn::prelude::*;

/// Recurrent encoder/decoder (RNN and GRU cells)
pub mod rnn;

/// Transformer encoder/decoder
pub mod transformer;

/// Training and evaluation loop
pub mod trainer;

/// Greedy and beam search decoding
pub mod search;

/// Checkpoint-backed translation engine
pub mod inferencer;

/// Training runs on the default WGPU device (a GPU when one is available).
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;
pub type InferBackend = burn::backend::Wgpu;

/// Shared contract of the three architectures.
pub trait Seq2Seq<B: Backend> {
    /// source: [batch, src_len], target: [batch, tgt_len]
    /// → logits over the target vocabulary: [batch, tgt_len, n_tokens_tgt]
    ///
    /// Position t of the output predicts target token t + 1.
    /// No softmax is applied.
    fn forward(&self, source: Tensor<B, 2, Int>, target: Tensor<B, 2, Int>) -> Tensor<B, 3>;
}
