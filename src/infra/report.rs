// ============================================================
// Layer 6 — Comparison Report
// ============================================================
// Aggregates the final-epoch metrics of every trained
// architecture into one table, written as comparison.json in
// the checkpoint root and printed to stdout:
//
//   Architecture  Params   Train loss  Val loss  Val top-1  Val top-5  Val top-10
//   Transformer   4.1M     2.1034      2.3519    0.5120     0.7345     0.7902
//   GRU           ...

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use serde::{Deserialize, Serialize};

use crate::domain::architecture::Architecture;
use crate::infra::metrics::{BatchMetrics, EpochMetrics};

/// Final numbers for one architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectureResult {
    pub architecture: Architecture,
    pub num_params:   usize,
    pub epochs:       usize,
    pub train:        BatchMetrics,
    pub valid:        BatchMetrics,
    /// Lowest validation loss over all epochs
    pub best_val_loss: f64,
}

impl ArchitectureResult {
    /// `None` when no epoch was run.
    pub fn from_history(
        architecture: Architecture,
        num_params:   usize,
        history:      &[EpochMetrics],
    ) -> Option<Self> {
        let last = history.last()?;
        let best_val_loss = history
            .iter()
            .map(|m| m.valid.loss)
            .filter(|l| !l.is_nan())
            .fold(f64::INFINITY, f64::min);
        Some(Self {
            architecture,
            num_params,
            epochs: last.epoch,
            train:  last.train,
            valid:  last.valid,
            best_val_loss,
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub results: Vec<ArchitectureResult>,
}

impl ComparisonReport {
    pub fn push(&mut self, result: ArchitectureResult) {
        self.results.push(result);
    }

    /// Results ordered by final validation loss, best first.
    pub fn ranked(&self) -> Vec<&ArchitectureResult> {
        let mut ranked: Vec<&ArchitectureResult> = self.results.iter().collect();
        ranked.sort_by(|a, b| a.valid.loss.total_cmp(&b.valid.loss));
        ranked
    }

    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join("comparison.json");
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Cannot write report to '{}'", path.display()))?;
        tracing::info!("Comparison report written to '{}'", path.display());
        Ok(path)
    }

    pub fn to_table(&self) -> String {
        let mut out = format!(
            "{:<13} {:>8} {:>11} {:>9} {:>10} {:>10} {:>11}\n",
            "Architecture", "Params", "Train loss", "Val loss", "Val top-1", "Val top-5", "Val top-10"
        );
        for r in self.ranked() {
            out.push_str(&format!(
                "{:<13} {:>8} {:>11.4} {:>9.4} {:>10.4} {:>10.4} {:>11.4}\n",
                r.architecture.to_string(),
                human_count(r.num_params),
                r.train.loss,
                r.valid.loss,
                r.valid.top1,
                r.valid.top5,
                r.valid.top10,
            ));
        }
        out
    }
}

fn human_count(n: usize) -> String {
    match n {
        n if n >= 1_000_000 => format!("{:.1}M", n as f64 / 1e6),
        n if n >= 1_000     => format!("{:.1}K", n as f64 / 1e3),
        n => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch(epoch: usize, val_loss: f64) -> EpochMetrics {
        let m = BatchMetrics { loss: val_loss, top1: 0.1, top5: 0.2, top10: 0.3 };
        EpochMetrics { epoch, train: m, valid: m }
    }

    #[test]
    fn test_result_uses_last_epoch_and_best_loss() {
        let history = [epoch(1, 3.0), epoch(2, 2.0), epoch(3, 2.5)];
        let r = ArchitectureResult::from_history(Architecture::Gru, 10, &history).unwrap();
        assert_eq!(r.epochs, 3);
        assert_eq!(r.valid.loss, 2.5);
        assert_eq!(r.best_val_loss, 2.0);
        assert!(ArchitectureResult::from_history(Architecture::Gru, 10, &[]).is_none());
    }

    #[test]
    fn test_table_is_ranked_by_validation_loss() {
        let mut report = ComparisonReport::default();
        for (arch, loss) in [(Architecture::Rnn, 4.0), (Architecture::Transformer, 2.0), (Architecture::Gru, 3.0)] {
            report.push(ArchitectureResult::from_history(arch, 2_500_000, &[epoch(1, loss)]).unwrap());
        }

        let table = report.to_table();
        let rows: Vec<&str> = table.lines().skip(1).collect();
        assert!(rows[0].starts_with("Transformer"));
        assert!(rows[1].starts_with("GRU"));
        assert!(rows[2].starts_with("RNN"));
        assert!(rows[0].contains("2.5M"));
    }

    #[test]
    fn test_save_writes_json() {
        let dir        = tempfile::tempdir().unwrap();
        let mut report = ComparisonReport::default();
        report.push(ArchitectureResult::from_history(Architecture::Rnn, 5, &[epoch(1, 1.0)]).unwrap());

        let path = report.save(dir.path()).unwrap();
        let back: ComparisonReport = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back.results.len(), 1);
        assert_eq!(back.results[0].architecture, Architecture::Rnn);
    }
}
