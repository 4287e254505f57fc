// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe the translation task:
// sentence pairs, vocabularies, and the architectures we compare.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// An (english, french) sentence pair read from the dataset
pub mod sentence_pair;

// Token ↔ index mapping for one language
pub mod vocab;

// The three model families being compared
pub mod architecture;

// Core abstractions (traits) that other layers implement
pub mod traits;
