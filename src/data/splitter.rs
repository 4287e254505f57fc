// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles the corpus with a seeded RNG and splits it in two:
//   - Training set:   used to update model weights
//   - Validation set: used to measure generalisation each epoch
//
// The Anki export is ordered by sentence length, so splitting
// without a shuffle would put only the longest sentences in the
// validation set. A given seed always yields the same split.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, validation).
///
/// # Arguments
/// * `samples`        - All available samples (consumed by this function)
/// * `valid_fraction` - Proportion held out for validation, e.g. 0.1 = 10%
/// * `seed`           - RNG seed; the same seed always gives the same split
pub fn split_train_val<T>(mut samples: Vec<T>, valid_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let n_valid  = ((total as f64) * valid_fraction.clamp(0.0, 1.0)).round() as usize;
    let split_at = total - n_valid.min(total);

    // split_off(n) removes elements [n..] from the Vec and returns them
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}
