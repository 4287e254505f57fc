// ============================================================
// Layer 2 — CompareUseCase
// ============================================================
// Trains several architectures on the same prepared data and
// aggregates their final metrics:
//
//   prepare_data (once)
//     └─ for each architecture: train_prepared → ArchitectureResult
//   ComparisonReport → {checkpoint_dir}/comparison.json + table
//
// The data is split, filtered and encoded once, so every model
// sees exactly the same training and validation pairs.

use anyhow::{bail, Result};
use std::path::Path;

use crate::application::train_use_case::{prepare_data, train_prepared, TrainConfig};
use crate::domain::architecture::Architecture;
use crate::infra::report::{ArchitectureResult, ComparisonReport};

pub struct CompareUseCase {
    config:        TrainConfig,
    architectures: Vec<Architecture>,
}

impl CompareUseCase {
    /// `architectures` are trained in order; duplicates are ignored.
    pub fn new(config: TrainConfig, architectures: Vec<Architecture>) -> Self {
        let mut unique = Vec::with_capacity(architectures.len());
        for arch in architectures {
            if !unique.contains(&arch) {
                unique.push(arch);
            }
        }
        Self { config, architectures: unique }
    }

    pub fn execute(&self) -> Result<ComparisonReport> {
        if self.architectures.is_empty() {
            bail!("Nothing to compare: no architecture selected");
        }

        let configs: Vec<TrainConfig> = self
            .architectures
            .iter()
            .map(|&architecture| TrainConfig { architecture, ..self.config.clone() })
            .collect();
        for cfg in &configs {
            cfg.validate()?;
        }

        let data = prepare_data(&self.config)?;

        let mut report = ComparisonReport::default();
        for cfg in &configs {
            let architecture = cfg.architecture;
            println!("\n══ {architecture} ══");
            let outcome = train_prepared(cfg, &data)?;

            match ArchitectureResult::from_history(architecture, outcome.num_params, &outcome.history) {
                Some(result) => report.push(result),
                None => tracing::warn!("{} ran no epoch, left out of the report", architecture),
            }
        }

        report.save(Path::new(&self.config.checkpoint_dir))?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_architectures_are_dropped() {
        let uc = CompareUseCase::new(
            TrainConfig::default(),
            vec![Architecture::Gru, Architecture::Rnn, Architecture::Gru],
        );
        assert_eq!(uc.architectures, vec![Architecture::Gru, Architecture::Rnn]);
    }

    #[test]
    fn test_empty_selection_is_an_error() {
        let uc = CompareUseCase::new(TrainConfig::default(), Vec::new());
        assert!(uc.execute().is_err());
    }

    #[test]
    fn test_invalid_transformer_config_fails_before_any_training() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainConfig {
            data_file:      "does/not/matter.txt".into(),
            checkpoint_dir: dir.path().to_string_lossy().into_owned(),
            n_heads:        3,
            ..TrainConfig::default()
        };
        let uc  = CompareUseCase::new(config, vec![Architecture::Rnn, Architecture::Transformer]);
        let err = uc.execute().unwrap_err();

        assert!(err.to_string().contains("divisible"));
        assert!(!dir.path().join("rnn").exists());
    }
}
