// ============================================================
// Layer 4 — Translation Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<TranslationItem>
// into two padded integer tensors.
//
// Sentences have different lengths, so each side is padded to
// the longest sentence *in this batch* (not a global maximum):
//
//   source: [bos a b eos]        →  [bos a b eos pad]
//           [bos c d e eos]      →  [bos c d e eos]
//
// Source and target are padded independently with their own
// language's pad index.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TranslationItem;

/// A batch of encoded pairs.
#[derive(Debug, Clone)]
pub struct TranslationBatch<B: Backend> {
    /// Source token ids — shape: [batch_size, max_source_len]
    pub source: Tensor<B, 2, Int>,

    /// Target token ids — shape: [batch_size, max_target_len]
    pub target: Tensor<B, 2, Int>,
}

#[derive(Clone, Debug)]
pub struct TranslationBatcher<B: Backend> {
    device:  B::Device,
    src_pad: usize,
    tgt_pad: usize,
}

impl<B: Backend> TranslationBatcher<B> {
    pub fn new(device: B::Device, src_pad: usize, tgt_pad: usize) -> Self {
        Self { device, src_pad, tgt_pad }
    }
}

/// Pad every sequence to the longest one and stack into [n, max_len].
pub fn pad_sequences<B: Backend>(
    sequences: &[&[usize]],
    pad:       usize,
    device:    &B::Device,
) -> Tensor<B, 2, Int> {
    let max_len = sequences.iter().map(|s| s.len()).max().unwrap_or(0);

    let flat: Vec<i32> = sequences
        .iter()
        .flat_map(|s| {
            s.iter()
                .copied()
                .chain(std::iter::repeat(pad).take(max_len - s.len()))
                .map(|x| x as i32)
        })
        .collect();

    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device)
        .reshape([sequences.len(), max_len])
}

impl<B: Backend> Batcher<TranslationItem, TranslationBatch<B>> for TranslationBatcher<B> {
    fn batch(&self, items: Vec<TranslationItem>) -> TranslationBatch<B> {
        let sources: Vec<&[usize]> = items.iter().map(|i| i.source.as_slice()).collect();
        let targets: Vec<&[usize]> = items.iter().map(|i| i.target.as_slice()).collect();

        TranslationBatch {
            source: pad_sequences(&sources, self.src_pad, &self.device),
            target: pad_sequences(&targets, self.tgt_pad, &self.device),
        }
    }
}
