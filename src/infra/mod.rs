// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting concerns that don't belong in
// any specific business layer:
//
//   checkpoint.rs  — Saving and loading model weights
//                    Uses Burn's CompactRecorder to serialise
//                    model parameters to disk. Also saves/loads
//                    TrainConfig as JSON so translation can
//                    rebuild the model.
//
//   vocab_store.rs — Vocabulary persistence
//                    Saves both vocabularies next to the weights
//                    so translation uses the training indices.
//
//   metrics.rs     — Training metrics logging
//                    Epoch-level loss and top-k accuracy CSV,
//                    plus sample translations per epoch.
//
//   report.rs      — Cross-architecture comparison table
//
//   fetch.rs       — Dataset download and extraction
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary saving and loading
pub mod vocab_store;

/// Training metrics CSV loggers
pub mod metrics;

/// Comparison of trained architectures
pub mod report;

/// HTTP download of the parallel corpus
pub mod fetch;
