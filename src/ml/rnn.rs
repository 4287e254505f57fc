use burn::{
    nn::{
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{sigmoid, tanh},
};

use crate::ml::Seq2Seq;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct TranslationRnnConfig {
    pub n_tokens_src:  usize,
    pub n_tokens_tgt:  usize,
    pub dim_embedding: usize,
    pub dim_hidden:    usize,
    pub n_layers:      usize,
    pub dropout:       f64,
    /// false → vanilla RNN cells, true → GRU cells
    pub gated:         bool,
}

impl TranslationRnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TranslationRnn<B> {
        TranslationRnn {
            src_embedding: EmbeddingConfig::new(self.n_tokens_src, self.dim_embedding).init(device),
            tgt_embedding: EmbeddingConfig::new(self.n_tokens_tgt, self.dim_embedding).init(device),
            encoder:       self.build_stack(device),
            decoder:       self.build_stack(device),
            output:        LinearConfig::new(self.dim_hidden, self.n_tokens_tgt).init(device),
        }
    }

    fn build_stack<B: Backend>(&self, device: &B::Device) -> RecurrentStack<B> {
        let cells = (0..self.n_layers)
            .map(|layer| {
                let input_size = if layer == 0 { self.dim_embedding } else { self.dim_hidden };
                self.build_cell(input_size, device)
            })
            .collect();
        RecurrentStack {
            cells,
            dropout:     DropoutConfig::new(self.dropout).init(),
            hidden_size: self.dim_hidden,
        }
    }

    fn build_cell<B: Backend>(&self, input_size: usize, device: &B::Device) -> RecurrentCell<B> {
        // A GRU needs reset, update and candidate projections side by side.
        let width = if self.gated { 3 * self.dim_hidden } else { self.dim_hidden };
        RecurrentCell {
            input:   LinearConfig::new(input_size, width).init(device),
            hidden:  LinearConfig::new(self.dim_hidden, width).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            gated:   self.gated,
        }
    }
}

/// One recurrent layer that walks a whole sequence.
#[derive(Module, Debug)]
pub struct RecurrentCell<B: Backend> {
    pub input:   Linear<B>,
    pub hidden:  Linear<B>,
    pub dropout: Dropout,
    pub gated:   bool,
}

impl<B: Backend> RecurrentCell<B> {
    /// x_t: [batch, input_size], h: [batch, hidden] → next h: [batch, hidden]
    pub fn step(&self, x_t: Tensor<B, 2>, h: Tensor<B, 2>) -> Tensor<B, 2> {
        let gi = self.input.forward(x_t);
        let gh = self.hidden.forward(h.clone());

        let h_next = if self.gated {
            let (i_r, i_z, i_n) = split_gates(gi);
            let (h_r, h_z, h_n) = split_gates(gh);

            let reset  = sigmoid(i_r + h_r);
            let update = sigmoid(i_z + h_z);
            let candidate = tanh(i_n + reset * h_n);

            // h' = (1 - z) * n + z * h
            update.clone().neg().add_scalar(1.0) * candidate + update * h
        } else {
            tanh(gi + gh)
        };

        self.dropout.forward(h_next)
    }

    /// x: [batch, seq_len, input_size], h: [batch, hidden]
    /// → (outputs: [batch, seq_len, hidden], last h: [batch, hidden])
    pub fn forward(&self, x: Tensor<B, 3>, mut h: Tensor<B, 2>) -> (Tensor<B, 3>, Tensor<B, 2>) {
        let [batch_size, seq_len, input_size] = x.dims();
        let mut outputs = Vec::with_capacity(seq_len);

        for t in 0..seq_len {
            let x_t = x
                .clone()
                .slice([0..batch_size, t..t + 1, 0..input_size])
                .reshape([batch_size, input_size]);
            h = self.step(x_t, h);
            outputs.push(h.clone());
        }

        (Tensor::stack::<3>(outputs, 1), h)
    }
}

/// [batch, 3 * hidden] → (reset, update, candidate), each [batch, hidden]
fn split_gates<B: Backend>(gates: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>, Tensor<B, 2>) {
    let [batch_size, width] = gates.dims();
    let hidden = width / 3;
    (
        gates.clone().slice([0..batch_size, 0..hidden]),
        gates.clone().slice([0..batch_size, hidden..2 * hidden]),
        gates.slice([0..batch_size, 2 * hidden..width]),
    )
}

/// Stacked recurrent layers with dropout between them.
#[derive(Module, Debug)]
pub struct RecurrentStack<B: Backend> {
    pub cells:       Vec<RecurrentCell<B>>,
    pub dropout:     Dropout,
    pub hidden_size: usize,
}

impl<B: Backend> RecurrentStack<B> {
    /// x: [batch, seq_len, input_size]
    /// h: per-layer initial state [batch, n_layers, hidden], zeros when `None`
    /// → (top layer outputs [batch, seq_len, hidden], final states [batch, n_layers, hidden])
    pub fn forward(&self, x: Tensor<B, 3>, h: Option<Tensor<B, 3>>) -> (Tensor<B, 3>, Tensor<B, 3>) {
        let [batch_size, _, _] = x.dims();
        let n_layers = self.cells.len();
        let hidden   = self.hidden_size;
        let h = h.unwrap_or_else(|| Tensor::zeros([batch_size, n_layers, hidden], &x.device()));

        let mut y = x;
        let mut finals = Vec::with_capacity(n_layers);
        for (layer, cell) in self.cells.iter().enumerate() {
            let h_layer = h
                .clone()
                .slice([0..batch_size, layer..layer + 1, 0..hidden])
                .reshape([batch_size, hidden]);
            let (out, h_last) = cell.forward(self.dropout.forward(y), h_layer);
            y = out;
            finals.push(h_last);
        }

        (y, Tensor::stack::<3>(finals, 1))
    }
}

/// Encoder/decoder translation model with recurrent stacks.
/// The decoder starts from the encoder's final per-layer states.
#[derive(Module, Debug)]
pub struct TranslationRnn<B: Backend> {
    pub src_embedding: Embedding<B>,
    pub tgt_embedding: Embedding<B>,
    pub encoder:       RecurrentStack<B>,
    pub decoder:       RecurrentStack<B>,
    pub output:        Linear<B>,
}

impl<B: Backend> TranslationRnn<B> {
    /// source: [batch, src_len], target: [batch, tgt_len] → [batch, tgt_len, n_tokens_tgt]
    pub fn forward(&self, source: Tensor<B, 2, Int>, target: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let (_, hidden_src) = self.encoder.forward(self.src_embedding.forward(source), None);
        let (y, _) = self.decoder.forward(self.tgt_embedding.forward(target), Some(hidden_src));
        self.output.forward(y)
    }
}

impl<B: Backend> Seq2Seq<B> for TranslationRnn<B> {
    fn forward(&self, source: Tensor<B, 2, Int>, target: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        TranslationRnn::forward(self, source, target)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn config(gated: bool) -> TranslationRnnConfig {
        TranslationRnnConfig::new(11, 13, 8, 6, 2, 0.0, gated)
    }

    fn tokens(data: &[i32], shape: [usize; 2]) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints(data, &Default::default()).reshape(shape)
    }

    #[test]
    fn test_rnn_logits_shape() {
        let model: TranslationRnn<TestBackend> = config(false).init(&Default::default());
        let source = tokens(&[2, 4, 5, 3, 2, 6, 3, 1], [2, 4]);
        let target = tokens(&[2, 7, 8, 2, 9, 1], [2, 3]);
        assert_eq!(model.forward(source, target).dims(), [2, 3, 13]);
    }

    #[test]
    fn test_gru_logits_shape() {
        let model: TranslationRnn<TestBackend> = config(true).init(&Default::default());
        let source = tokens(&[2, 4, 3], [1, 3]);
        let target = tokens(&[2, 7, 8, 9, 3], [1, 5]);
        assert_eq!(model.forward(source, target).dims(), [1, 5, 13]);
    }

    #[test]
    fn test_stack_returns_one_state_per_layer() {
        let device = Default::default();
        let stack  = config(true).build_stack::<TestBackend>(&device);
        let x      = Tensor::<TestBackend, 3>::ones([3, 5, 8], &device);
        let (y, h) = stack.forward(x, None);
        assert_eq!(y.dims(), [3, 5, 6]);
        assert_eq!(h.dims(), [3, 2, 6]);
    }

    #[test]
    fn test_last_output_equals_final_state() {
        let device = Default::default();
        let stack  = config(false).build_stack::<TestBackend>(&device);
        let x      = Tensor::<TestBackend, 3>::random([2, 4, 8], burn::tensor::Distribution::Default, &device);
        let (y, h) = stack.forward(x, None);

        let last_out: Vec<f32> = y.slice([0..2, 3..4, 0..6]).into_data().iter::<f32>().collect();
        let top_state: Vec<f32> = h.slice([0..2, 1..2, 0..6]).into_data().iter::<f32>().collect();
        for (a, b) in last_out.iter().zip(&top_state) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
