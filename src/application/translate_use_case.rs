// ============================================================
// Layer 2 — Translate Use Case
// ============================================================
// Loads the latest checkpoint of one architecture and
// translates English sentences with beam search, or greedily
// when a single quick answer is enough.

use anyhow::Result;
use std::path::Path;

use crate::domain::{architecture::Architecture, traits::Translator};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

pub struct TranslateUseCase {
    inferencer: Inferencer,
}

impl TranslateUseCase {
    pub fn new(checkpoint_dir: &str, architecture: Architecture) -> Result<Self> {
        let ckpt   = CheckpointManager::open(Path::new(checkpoint_dir).join(architecture.slug()));
        let device = burn::backend::wgpu::WgpuDevice::default();
        let inferencer = Inferencer::from_checkpoint(&ckpt, &device)?;
        Ok(Self { inferencer })
    }

    pub fn translate_greedy(&self, sentence: &str) -> Result<String> {
        self.inferencer.translate_greedy(sentence)
    }
}

impl Translator for TranslateUseCase {
    fn translate(&self, sentence: &str) -> Result<Vec<(String, f64)>> {
        self.inferencer.translate(sentence)
    }
}
