// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw TSV file to padded tensor batches.
//
//   fra.txt
//       │
//       ▼
//   TsvPairLoader     → reads (english, french) pairs
//       │
//       ▼
//   split_train_val   → seeded 90/10 split
//       │
//       ▼
//   Preprocessor      → drops over-long pairs, strips newlines
//       │
//       ▼
//   SentenceTokenizer → words and punctuation
//   Vocab::build      → token ids per language (training split only)
//       │
//       ▼
//   TranslationDataset → implements Burn's Dataset trait
//       │
//       ▼
//   TranslationBatcher → pads each batch to its longest sentence
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads tab-delimited sentence pairs
pub mod loader;

/// Word/punctuation tokenizer
pub mod tokenizer;

/// Length filtering and cleanup
pub mod preprocessor;

/// Burn Dataset over encoded pairs, plus vocabulary building
pub mod dataset;

/// Burn Batcher with per-batch padding
pub mod batcher;

/// Seeded train/validation split
pub mod splitter;
