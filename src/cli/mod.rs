// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Four commands are supported:
//   1. `fetch`     — downloads and extracts fra.txt
//   2. `train`     — trains one architecture
//   3. `compare`   — trains RNN, GRU and Transformer on the same
//                    data and prints a comparison table
//   4. `translate` — loads a checkpoint and translates a sentence
//                    (beam search, or `--greedy`)
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::Path;

use commands::{Commands, CompareArgs, FetchArgs, TrainArgs, TranslateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "mt-compare",
    version,
    about = "Train and compare RNN, GRU and Transformer models for English to French translation."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Fetch(args)     => run_fetch(args),
            Commands::Train(args)     => run_train(args),
            Commands::Compare(args)   => run_compare(args),
            Commands::Translate(args) => run_translate(args),
        }
    }
}

fn run_fetch(args: FetchArgs) -> Result<()> {
    use crate::infra::fetch::DatasetFetcher;

    let fetcher = DatasetFetcher::new(args.url)?;
    let path    = fetcher.fetch(Path::new(&args.dest_dir), args.force)?;
    println!("Dataset ready: {}", path.display());
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training {} on '{}'", args.architecture, args.params.data_file);

    let use_case = TrainUseCase::new(args.into());
    let outcome  = use_case.execute()?;

    if let Some(last) = outcome.history.last() {
        println!(
            "\n{} finished: val_loss={:.4} top-1={:.3}",
            outcome.architecture, last.valid.loss, last.valid.top1
        );
    }
    println!("Training complete. Checkpoint saved.");
    Ok(())
}

fn run_compare(args: CompareArgs) -> Result<()> {
    use crate::application::compare_use_case::CompareUseCase;
    use crate::domain::architecture::Architecture;

    // Any architecture works here; CompareUseCase overrides it per run.
    let config   = args.params.into_config(Architecture::Transformer);
    let use_case = CompareUseCase::new(config, args.architectures);
    let report   = use_case.execute()?;

    println!("\n{}", report.to_table());
    Ok(())
}

fn run_translate(args: TranslateArgs) -> Result<()> {
    use crate::application::translate_use_case::TranslateUseCase;
    use crate::domain::traits::Translator;

    let use_case = TranslateUseCase::new(&args.checkpoint_dir, args.architecture)?;

    println!("\n{}", args.sentence);
    if args.greedy {
        println!("  {}", use_case.translate_greedy(&args.sentence)?);
        return Ok(());
    }

    let candidates = use_case.translate(&args.sentence)?;
    for (sentence, likelihood) in candidates.iter().take(args.top.max(1)) {
        println!("  {likelihood:.4}  {sentence}");
    }
    Ok(())
}
