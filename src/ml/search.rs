// ============================================================
// Layer 5 — Decoding (greedy and beam search)
// ============================================================
// Both searches drive any `Seq2Seq` model autoregressively:
// feed the source plus the target prefix, read the distribution
// at the last position, extend the prefix.
//
// Beam search keeps a pool of hypotheses:
//   - every unfinished hypothesis is extended with its
//     `beam_width` most likely next tokens
//   - finished hypotheses (already containing <eos>) are carried
//     over with their probability multiplied by 0.999, which
//     slowly penalises stopping early
//   - only the `max_target` most likely hypotheses survive
//
// Probabilities are plain products of softmax values, kept in
// f64 so long sentences do not underflow to zero.

use burn::{prelude::*, tensor::activation::softmax};

use crate::domain::vocab::Vocab;
use crate::ml::Seq2Seq;

/// Multiplier applied to finished hypotheses at every step.
pub const FINISHED_PENALTY: f64 = 0.999;

/// Special token ids the searches need.
#[derive(Debug, Clone, Copy)]
pub struct SearchTokens {
    pub bos: usize,
    pub eos: usize,
    pub pad: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    /// Target ids including the leading <bos>
    pub tokens:     Vec<usize>,
    pub likelihood: f64,
}

impl Hypothesis {
    pub fn is_finished(&self, eos: usize) -> bool {
        self.tokens.contains(&eos)
    }

    /// Tokens after <bos> and before the first <eos>.
    pub fn content(&self, eos: usize) -> &[usize] {
        let body = self.tokens.get(1..).unwrap_or(&[]);
        let end  = body.iter().position(|&t| t == eos).unwrap_or(body.len());
        &body[..end]
    }
}

/// Softmax over the last position of each row:
/// logits [n, t, vocab] → one probability vector per row.
fn last_position_probs<B: Backend>(logits: Tensor<B, 3>) -> Vec<Vec<f32>> {
    let [n, t, vocab] = logits.dims();
    let last  = logits.slice([0..n, t - 1..t, 0..vocab]).reshape([n, vocab]);
    let probs: Vec<f32> = softmax(last, 1).into_data().iter::<f32>().collect();
    probs.chunks(vocab).map(|row| row.to_vec()).collect()
}

fn to_tensor<B: Backend>(rows: &[&[usize]], device: &B::Device) -> Tensor<B, 2, Int> {
    let width = rows.first().map_or(0, |r| r.len());
    let flat: Vec<i32> = rows.iter().flat_map(|r| r.iter().map(|&x| x as i32)).collect();
    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape([rows.len(), width])
}

/// Always pick the most likely next token.
/// Returns the generated ids, without <bos>, up to and including <eos>.
pub fn greedy_search<B: Backend, M: Seq2Seq<B>>(
    model:      &M,
    source:     &[usize],
    tokens:     SearchTokens,
    max_length: usize,
    device:     &B::Device,
) -> Vec<usize> {
    let src = to_tensor::<B>(&[source], device);
    let mut target = vec![tokens.bos];

    for _ in 0..max_length {
        let logits = model.forward(src.clone(), to_tensor::<B>(&[&target], device));
        let probs  = last_position_probs(logits);
        let next   = argmax(&probs[0]);
        target.push(next);
        if next == tokens.eos {
            break;
        }
    }

    target.split_off(1)
}

fn argmax(row: &[f32]) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
        .0
}

/// Indices of the `k` largest values, largest first.
fn top_k(row: &[f32], k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..row.len()).collect();
    idx.sort_by(|&a, &b| row[b].total_cmp(&row[a]));
    idx.truncate(k);
    idx
}

#[derive(Debug, Clone, Copy)]
pub struct BeamSearchConfig {
    /// Tokens kept per hypothesis at each step
    pub beam_width:          usize,
    /// Hypotheses kept after each step
    pub max_target:          usize,
    /// Maximum number of target tokens, <bos> included
    pub max_sentence_length: usize,
}

/// Beam search; hypotheses are returned most likely first.
pub fn beam_search<B: Backend, M: Seq2Seq<B>>(
    model:  &M,
    source: &[usize],
    tokens: SearchTokens,
    config: BeamSearchConfig,
    device: &B::Device,
) -> Vec<Hypothesis> {
    let mut pool = vec![Hypothesis { tokens: vec![tokens.bos], likelihood: 1.0 }];
    let beam_width = config.beam_width.max(1);

    while pool[0].tokens.len() < config.max_sentence_length {
        let (finished, open): (Vec<Hypothesis>, Vec<Hypothesis>) =
            pool.into_iter().partition(|h| h.is_finished(tokens.eos));

        if open.is_empty() {
            // Every hypothesis is penalised by the same factor from here on,
            // so their order can no longer change.
            pool = finished;
            break;
        }

        let rows: Vec<&[usize]> = open.iter().map(|h| h.tokens.as_slice()).collect();
        let sources: Vec<&[usize]> = vec![source; rows.len()];
        let logits = model.forward(to_tensor::<B>(&sources, device), to_tensor::<B>(&rows, device));
        let probs  = last_position_probs(logits);

        let mut next_pool = Vec::with_capacity(open.len() * beam_width + finished.len());
        for (hyp, row) in open.iter().zip(&probs) {
            for token in top_k(row, beam_width) {
                let mut extended = hyp.tokens.clone();
                extended.push(token);
                next_pool.push(Hypothesis {
                    tokens:     extended,
                    likelihood: hyp.likelihood * row[token] as f64,
                });
            }
        }
        for mut hyp in finished {
            hyp.tokens.push(tokens.pad);
            hyp.likelihood *= FINISHED_PENALTY;
            next_pool.push(hyp);
        }

        next_pool.sort_by(|a, b| b.likelihood.total_cmp(&a.likelihood));
        next_pool.truncate(config.max_target.max(1));
        pool = next_pool;
    }

    pool.sort_by(|a, b| b.likelihood.total_cmp(&a.likelihood));
    pool
}

/// Join tokens with spaces, then remove the spaces tokenization introduced
/// before `.`, `,`, `;` and around `-` and `'`.
pub fn beautify(sentence: &str) -> String {
    let mut out = sentence.to_string();
    for p in ['.', ',', ';'] {
        out = out.replace(&format!(" {p}"), &p.to_string());
    }
    for l in ['-', '\''] {
        out = out.replace(&format!("{l} "), &l.to_string());
        out = out.replace(&format!(" {l}"), &l.to_string());
    }
    out
}

/// Readable sentence for a hypothesis: its content tokens looked up
/// in `vocab`, joined and beautified.
pub fn render(hypothesis: &Hypothesis, vocab: &Vocab) -> String {
    let content = hypothesis.content(vocab.eos_index());
    beautify(&vocab.lookup_tokens(content).join(" "))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    const VOCAB: usize = 8;
    const TOKENS: SearchTokens = SearchTokens { bos: 2, eos: 3, pad: 1 };

    /// Deterministic stand-in model: at target length t it puts most of its
    /// mass on `script[t - 1]` and the rest on `runner_up`.
    struct Scripted {
        script:    Vec<usize>,
        runner_up: usize,
    }

    impl Seq2Seq<TestBackend> for Scripted {
        fn forward(
            &self,
            _source: Tensor<TestBackend, 2, Int>,
            target:  Tensor<TestBackend, 2, Int>,
        ) -> Tensor<TestBackend, 3> {
            let [n, t] = target.dims();
            let mut data = vec![-10.0f32; n * t * VOCAB];
            for row in 0..n {
                for pos in 0..t {
                    let best = self.script.get(pos).copied().unwrap_or(TOKENS.eos);
                    let base = (row * t + pos) * VOCAB;
                    data[base + best] = 2.0;
                    data[base + self.runner_up] = 1.0;
                }
            }
            Tensor::<TestBackend, 1>::from_floats(data.as_slice(), &Default::default())
                .reshape([n, t, VOCAB])
        }
    }

    #[test]
    fn test_greedy_follows_the_argmax_until_eos() {
        let model = Scripted { script: vec![5, 6, 3], runner_up: 4 };
        let out = greedy_search::<TestBackend, _>(&model, &[2, 7, 3], TOKENS, 10, &Default::default());
        assert_eq!(out, vec![5, 6, 3]);
    }

    #[test]
    fn test_greedy_respects_max_length() {
        let model = Scripted { script: vec![5; 20], runner_up: 4 };
        let out = greedy_search::<TestBackend, _>(&model, &[2, 3], TOKENS, 4, &Default::default());
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_beam_best_matches_greedy_and_is_sorted() {
        let model  = Scripted { script: vec![5, 6, 3], runner_up: 4 };
        let config = BeamSearchConfig { beam_width: 2, max_target: 5, max_sentence_length: 8 };
        let hyps = beam_search::<TestBackend, _>(&model, &[2, 7, 3], TOKENS, config, &Default::default());

        assert!(hyps.len() <= 5);
        assert_eq!(hyps[0].content(TOKENS.eos), &[5, 6]);
        for pair in hyps.windows(2) {
            assert!(pair[0].likelihood >= pair[1].likelihood);
        }
    }

    #[test]
    fn test_search_stops_once_every_hypothesis_is_finished() {
        let model  = Scripted { script: vec![3], runner_up: 4 };
        let config = BeamSearchConfig { beam_width: 1, max_target: 3, max_sentence_length: 10 };
        let hyps = beam_search::<TestBackend, _>(&model, &[2, 3], TOKENS, config, &Default::default());

        // Step 1 emits <eos>; nothing is open afterwards, so no padding is added.
        assert_eq!(hyps.len(), 1);
        assert_eq!(hyps[0].tokens, vec![2, 3]);
        assert!(hyps[0].content(TOKENS.eos).is_empty());
    }

    #[test]
    fn test_finished_hypotheses_are_padded_and_penalised() {
        // <eos> is the runner-up at step 1, so the pool keeps one
        // finished and one open hypothesis.
        let model  = Scripted { script: vec![5, 6, 7], runner_up: TOKENS.eos };
        let config = BeamSearchConfig { beam_width: 2, max_target: 10, max_sentence_length: 4 };
        let hyps = beam_search::<TestBackend, _>(&model, &[2, 3], TOKENS, config, &Default::default());

        // Step 1 softmax: 2.0 on the scripted token, 1.0 on <eos>, -10.0 elsewhere
        let others = (VOCAB - 2) as f64 * (-10.0f64).exp();
        let p_eos  = 1.0f64.exp() / (2.0f64.exp() + 1.0f64.exp() + others);

        let early = hyps
            .iter()
            .find(|h| h.tokens[..2] == [TOKENS.bos, TOKENS.eos])
            .unwrap();
        assert_eq!(early.tokens, vec![TOKENS.bos, TOKENS.eos, TOKENS.pad, TOKENS.pad]);

        // Carried over for two steps after finishing
        let expected = p_eos * FINISHED_PENALTY * FINISHED_PENALTY;
        assert!((early.likelihood - expected).abs() < 1e-6);

        for pair in hyps.windows(2) {
            assert!(pair[0].likelihood >= pair[1].likelihood);
        }
    }

    #[test]
    fn test_content_strips_bos_and_everything_after_eos() {
        let h = Hypothesis { tokens: vec![2, 5, 6, 3, 1, 1], likelihood: 0.5 };
        assert_eq!(h.content(3), &[5, 6]);
    }

    #[test]
    fn test_render_looks_up_content_tokens() {
        let vocab = Vocab::build([vec!["Salut", "."]], 1);
        let salut = vocab.index("Salut");
        let dot   = vocab.index(".");
        let h = Hypothesis { tokens: vec![2, salut, dot, 3, 1], likelihood: 0.9 };
        assert_eq!(render(&h, &vocab), "Salut.");
    }

    #[test]
    fn test_beautify() {
        assert_eq!(beautify("Je n ' ai pas faim ."), "Je n'ai pas faim.");
        assert_eq!(beautify("Oui , c ' est - à - dire ; non"), "Oui, c'est-à-dire; non");
    }
}
