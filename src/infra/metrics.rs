// ============================================================
// Layer 6 — Metrics
// ============================================================
// Aggregates per-batch metrics and records them to disk.
//
// Metrics tracked for every batch:
//   - loss:   weighted cross-entropy, padding excluded
//   - top-1:  fraction of non-padding target tokens predicted exactly
//   - top-5:  ... present among the 5 most likely tokens
//   - top-10: ... present among the 10 most likely tokens
//
// Files written next to the checkpoints of a run:
//   metrics.csv     — one row per epoch, train and validation columns
//   predictions.csv — one sample translation from each split per epoch
//
// Example metrics.csv:
//   epoch,train_loss,train_top1,train_top5,train_top10,val_loss,val_top1,val_top5,val_top10
//   1,4.210000,0.310000,0.520000,0.600000,3.870000,0.340000,0.550000,0.630000
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// Loss and top-k accuracies for one batch, or an average of batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchMetrics {
    pub loss:  f64,
    pub top1:  f64,
    pub top5:  f64,
    pub top10: f64,
}

/// Running sum of BatchMetrics.
#[derive(Debug, Default)]
pub struct MetricsAccumulator {
    sum:   BatchMetrics,
    count: usize,
}

impl MetricsAccumulator {
    pub fn push(&mut self, m: BatchMetrics) {
        self.sum.loss  += m.loss;
        self.sum.top1  += m.top1;
        self.sum.top5  += m.top5;
        self.sum.top10 += m.top10;
        self.count     += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean of everything pushed; NaN loss when nothing was pushed.
    pub fn mean(&self) -> BatchMetrics {
        if self.count == 0 {
            return BatchMetrics { loss: f64::NAN, ..Default::default() };
        }
        let n = self.count as f64;
        BatchMetrics {
            loss:  self.sum.loss  / n,
            top1:  self.sum.top1  / n,
            top5:  self.sum.top5  / n,
            top10: self.sum.top10 / n,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Format one line of logs, e.g.
/// `Train -  loss: 2.31  top-1: 0.45  top-5: 0.70  top-10: 0.78`
pub fn format_logs(dataset_type: &str, m: &BatchMetrics) -> String {
    format!(
        "{dataset_type} -  loss: {:.2}  top-1: {:.2}  top-5: {:.2}  top-10: {:.2}",
        m.loss, m.top1, m.top5, m.top10
    )
}

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,
    pub train: BatchMetrics,
    pub valid: BatchMetrics,
}

impl EpochMetrics {
    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.valid.loss < best_val_loss
    }
}

/// Appends epoch metrics to `metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, truncating any CSV left by an earlier run.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(
            f,
            "epoch,train_loss,train_top1,train_top5,train_top10,val_loss,val_top1,val_top5,val_top10"
        )?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train.loss, m.train.top1, m.train.top5, m.train.top10,
            m.valid.loss, m.valid.top1, m.valid.top5, m.valid.top10,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

/// A source sentence, its reference, and what the model produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionSample {
    pub source:     String,
    pub target:     String,
    pub predicted:  String,
    pub likelihood: f64,
}

/// Appends per-epoch sample translations to `predictions.csv`.
pub struct PredictionLogger {
    csv_path: PathBuf,
}

impl PredictionLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("predictions.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        let mut columns = vec!["epoch".to_string()];
        for mode in ["train", "validation"] {
            for col in ["source", "target", "predicted", "likelihood"] {
                columns.push(format!("{mode} - {col}"));
            }
        }
        writeln!(f, "{}", columns.join(","))?;

        Ok(Self { csv_path })
    }

    pub fn log(
        &self,
        epoch: usize,
        train: Option<&PredictionSample>,
        valid: Option<&PredictionSample>,
    ) -> Result<()> {
        let mut row = vec![epoch.to_string()];
        for sample in [train, valid] {
            match sample {
                Some(s) => row.extend([
                    csv_field(&s.source),
                    csv_field(&s.target),
                    csv_field(&s.predicted),
                    format!("{:.6}", s.likelihood),
                ]),
                None => row.extend(std::iter::repeat(String::new()).take(4)),
            }
        }

        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(f, "{}", row.join(","))?;
        Ok(())
    }
}

/// Quote a free-text CSV field.
fn csv_field(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
