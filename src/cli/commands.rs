// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands `fetch`, `train`, `compare` and
// `translate` and all their configurable flags.
//
// Defaults follow the reference setup (max length 60, batch 128,
// lr 1e-3, 3 layers, embedding 196, hidden 256, 4 heads).
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::domain::architecture::Architecture;
use crate::infra::fetch::DATASET_URL;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the English–French corpus
    Fetch(FetchArgs),

    /// Train one architecture
    Train(TrainArgs),

    /// Train several architectures on the same data and compare them
    Compare(CompareArgs),

    /// Translate an English sentence with a trained checkpoint
    Translate(TranslateArgs),
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Directory where fra.txt is written
    #[arg(long, default_value = "data")]
    pub dest_dir: String,

    /// Archive to download
    #[arg(long, default_value = DATASET_URL)]
    pub url: String,

    /// Download again even if fra.txt already exists
    #[arg(long)]
    pub force: bool,
}

/// Hyperparameters shared by `train` and `compare`.
#[derive(Args, Debug, Clone)]
pub struct HyperParams {
    /// Tab-separated pairs produced by `fetch`
    #[arg(long, default_value = "data/fra.txt")]
    pub data_file: String,

    /// Directory to save checkpoints, vocabularies and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Only use the first N pairs of the file
    #[arg(long)]
    pub max_pairs: Option<usize>,

    /// Pairs with a side of this many tokens or more are dropped
    #[arg(long, default_value_t = 60)]
    pub max_seq_len: usize,

    /// Minimum number of occurrences for a token to enter the vocabulary
    #[arg(long, default_value_t = 2)]
    pub min_token_freq: usize,

    /// Fraction of pairs held out for validation
    #[arg(long, default_value_t = 0.1)]
    pub valid_fraction: f64,

    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    #[arg(long, default_value_t = 0.9)]
    pub beta_1: f64,

    #[arg(long, default_value_t = 0.99)]
    pub beta_2: f64,

    /// Gradient norm clipping threshold
    #[arg(long, default_value_t = 5.0)]
    pub clip: f64,

    /// Loss weight of the <unk> token
    #[arg(long, default_value_t = 0.1)]
    pub unk_weight: f64,

    /// Attention heads (Transformer only); must divide dim_embedding
    #[arg(long, default_value_t = 4)]
    pub n_heads: usize,

    #[arg(long, default_value_t = 196)]
    pub dim_embedding: usize,

    /// Recurrent state size, or feed-forward width for the Transformer
    #[arg(long, default_value_t = 256)]
    pub dim_hidden: usize,

    #[arg(long, default_value_t = 3)]
    pub n_layers: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Batches between two training log lines
    #[arg(long, default_value_t = 50)]
    pub log_every: usize,

    /// Beam width of the per-epoch sample translations
    #[arg(long, default_value_t = 10)]
    pub beam_width: usize,

    /// Hypotheses kept by the beam search
    #[arg(long, default_value_t = 100)]
    pub max_target: usize,
}

impl HyperParams {
    /// Convert CLI flags into the application-layer TrainConfig.
    /// The application layer never sees clap types.
    pub fn into_config(self, architecture: Architecture) -> TrainConfig {
        TrainConfig {
            data_file:      self.data_file,
            checkpoint_dir: self.checkpoint_dir,
            architecture,
            max_pairs:      self.max_pairs,
            max_seq_len:    self.max_seq_len,
            min_token_freq: self.min_token_freq,
            valid_fraction: self.valid_fraction,
            epochs:         self.epochs,
            batch_size:     self.batch_size,
            lr:             self.lr,
            beta_1:         self.beta_1,
            beta_2:         self.beta_2,
            clip:           self.clip,
            unk_weight:     self.unk_weight,
            n_heads:        self.n_heads,
            dim_embedding:  self.dim_embedding,
            dim_hidden:     self.dim_hidden,
            n_layers:       self.n_layers,
            dropout:        self.dropout,
            seed:           self.seed,
            log_every:      self.log_every,
            beam_width:     self.beam_width,
            max_target:     self.max_target,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// rnn, gru or transformer
    #[arg(long, default_value = "transformer")]
    pub architecture: Architecture,

    #[command(flatten)]
    pub params: HyperParams,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        a.params.into_config(a.architecture)
    }
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Comma-separated list of architectures to train
    #[arg(long, value_delimiter = ',', default_value = "rnn,gru,transformer")]
    pub architectures: Vec<Architecture>,

    #[command(flatten)]
    pub params: HyperParams,
}

#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// The English sentence to translate
    #[arg(long)]
    pub sentence: String,

    /// Which trained architecture to use
    #[arg(long, default_value = "transformer")]
    pub architecture: Architecture,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Number of candidates to print
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    /// Greedy decoding instead of beam search (prints one translation)
    #[arg(long)]
    pub greedy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_train_config() {
        let cli = Cli::try_parse_from(["mt-compare", "train", "--architecture", "GRU"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };

        let cfg: TrainConfig = args.into();
        let default = TrainConfig::default();
        assert_eq!(cfg.architecture, Architecture::Gru);
        assert_eq!(cfg.max_seq_len, default.max_seq_len);
        assert_eq!(cfg.dim_embedding, default.dim_embedding);
        assert_eq!(cfg.lr, default.lr);
    }

    #[test]
    fn test_compare_parses_architecture_list() {
        let cli = Cli::try_parse_from(["mt-compare", "compare", "--architectures", "rnn,transformer"]).unwrap();
        let Commands::Compare(args) = cli.command else { panic!("expected compare") };
        assert_eq!(args.architectures, vec![Architecture::Rnn, Architecture::Transformer]);
    }

    #[test]
    fn test_translate_defaults_to_beam_search() {
        let cli = Cli::try_parse_from(["mt-compare", "translate", "--sentence", "I run."]).unwrap();
        let Commands::Translate(args) = cli.command else { panic!("expected translate") };
        assert!(!args.greedy);
        assert_eq!(args.top, 5);

        let cli = Cli::try_parse_from(["mt-compare", "translate", "--sentence", "I run.", "--greedy"]).unwrap();
        let Commands::Translate(args) = cli.command else { panic!("expected translate") };
        assert!(args.greedy);
    }

    #[test]
    fn test_unknown_architecture_is_rejected() {
        assert!(Cli::try_parse_from(["mt-compare", "train", "--architecture", "lstm"]).is_err());
    }
}
