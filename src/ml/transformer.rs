use burn::{
    nn::{
        attention::{generate_autoregressive_mask, MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::Seq2Seq;

/// Smallest learned position table; grows with `max_positions` when needed.
pub const MIN_POSITIONS: usize = 256;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct TranslationTransformerConfig {
    pub n_tokens_src:  usize,
    pub n_tokens_tgt:  usize,
    pub n_heads:       usize,
    pub dim_embedding: usize,
    /// Inner width of the feed-forward blocks
    pub dim_hidden:    usize,
    pub n_layers:      usize,
    pub dropout:       f64,
    pub src_pad_idx:   usize,
    pub tgt_pad_idx:   usize,
    #[config(default = 256)]
    pub max_positions: usize,
}

impl TranslationTransformerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TranslationTransformer<B> {
        let positions = self.max_positions.max(MIN_POSITIONS);
        TranslationTransformer {
            src_embedding:          EmbeddingConfig::new(self.n_tokens_src, self.dim_embedding).init(device),
            tgt_embedding:          EmbeddingConfig::new(self.n_tokens_tgt, self.dim_embedding).init(device),
            src_position_embedding: EmbeddingConfig::new(positions, self.dim_embedding).init(device),
            tgt_position_embedding: EmbeddingConfig::new(positions, self.dim_embedding).init(device),
            encoder: (0..self.n_layers).map(|_| self.build_encoder_layer(device)).collect(),
            decoder: (0..self.n_layers).map(|_| self.build_decoder_layer(device)).collect(),
            output_layer: LinearConfig::new(self.dim_embedding, self.n_tokens_tgt).init(device),
            src_pad_idx:  self.src_pad_idx,
            tgt_pad_idx:  self.tgt_pad_idx,
        }
    }

    fn attention<B: Backend>(&self, device: &B::Device) -> MultiHeadAttention<B> {
        MultiHeadAttentionConfig::new(self.dim_embedding, self.n_heads)
            .with_dropout(self.dropout)
            .init(device)
    }

    fn feed_forward<B: Backend>(&self, device: &B::Device) -> FeedForward<B> {
        FeedForward {
            linear1: LinearConfig::new(self.dim_embedding, self.dim_hidden).init(device),
            linear2: LinearConfig::new(self.dim_hidden, self.dim_embedding).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }

    fn build_encoder_layer<B: Backend>(&self, device: &B::Device) -> EncoderLayer<B> {
        EncoderLayer {
            self_attn:    self.attention(device),
            feed_forward: self.feed_forward(device),
            norm1:        LayerNormConfig::new(self.dim_embedding).init(device),
            norm2:        LayerNormConfig::new(self.dim_embedding).init(device),
            dropout:      DropoutConfig::new(self.dropout).init(),
        }
    }

    fn build_decoder_layer<B: Backend>(&self, device: &B::Device) -> DecoderLayer<B> {
        DecoderLayer {
            self_attn:    self.attention(device),
            cross_attn:   self.attention(device),
            feed_forward: self.feed_forward(device),
            norm1:        LayerNormConfig::new(self.dim_embedding).init(device),
            norm2:        LayerNormConfig::new(self.dim_embedding).init(device),
            norm3:        LayerNormConfig::new(self.dim_embedding).init(device),
            dropout:      DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// Linear → ReLU → Dropout → Linear
#[derive(Module, Debug)]
pub struct FeedForward<B: Backend> {
    pub linear1: Linear<B>,
    pub linear2: Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> FeedForward<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.linear2.forward(self.dropout.forward(relu(self.linear1.forward(x))))
    }
}

/// Post-norm encoder layer: self-attention then feed-forward,
/// each wrapped in residual + LayerNorm.
#[derive(Module, Debug)]
pub struct EncoderLayer<B: Backend> {
    pub self_attn:    MultiHeadAttention<B>,
    pub feed_forward: FeedForward<B>,
    pub norm1:        LayerNorm<B>,
    pub norm2:        LayerNorm<B>,
    pub dropout:      Dropout,
}

impl<B: Backend> EncoderLayer<B> {
    /// src: [batch, src_len, dim], key_padding_mask: [batch, src_len] (true = padding)
    pub fn forward(&self, src: Tensor<B, 3>, key_padding_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn = self
            .self_attn
            .forward(MhaInput::self_attn(src.clone()).mask_pad(key_padding_mask))
            .context;
        let src = self.norm1.forward(src + self.dropout.forward(attn));

        let ff = self.feed_forward.forward(src.clone());
        self.norm2.forward(src + self.dropout.forward(ff))
    }
}

/// Post-norm decoder layer: masked self-attention, cross-attention
/// over the encoded source, then feed-forward.
#[derive(Module, Debug)]
pub struct DecoderLayer<B: Backend> {
    pub self_attn:    MultiHeadAttention<B>,
    pub cross_attn:   MultiHeadAttention<B>,
    pub feed_forward: FeedForward<B>,
    pub norm1:        LayerNorm<B>,
    pub norm2:        LayerNorm<B>,
    pub norm3:        LayerNorm<B>,
    pub dropout:      Dropout,
}

/// Masks shared by every decoder layer. `true` means "do not attend".
pub struct DecoderMasks<B: Backend> {
    /// [batch, tgt_len, tgt_len], true above the diagonal
    pub tgt_attn:        Tensor<B, 3, Bool>,
    /// [batch, src_len]
    pub src_key_padding: Tensor<B, 2, Bool>,
    /// [batch, tgt_len]
    pub tgt_key_padding: Tensor<B, 2, Bool>,
}

impl<B: Backend> DecoderLayer<B> {
    pub fn forward(&self, src: Tensor<B, 3>, tgt: Tensor<B, 3>, masks: &DecoderMasks<B>) -> Tensor<B, 3> {
        let attn = self
            .self_attn
            .forward(
                MhaInput::self_attn(tgt.clone())
                    .mask_pad(masks.tgt_key_padding.clone())
                    .mask_attn(masks.tgt_attn.clone()),
            )
            .context;
        let tgt = self.norm1.forward(tgt + self.dropout.forward(attn));

        let cross = self
            .cross_attn
            .forward(MhaInput::new(tgt.clone(), src.clone(), src).mask_pad(masks.src_key_padding.clone()))
            .context;
        let tgt = self.norm2.forward(tgt + self.dropout.forward(cross));

        let ff = self.feed_forward.forward(tgt.clone());
        self.norm3.forward(tgt + self.dropout.forward(ff))
    }
}

#[derive(Module, Debug)]
pub struct TranslationTransformer<B: Backend> {
    pub src_embedding:          Embedding<B>,
    pub tgt_embedding:          Embedding<B>,
    pub src_position_embedding: Embedding<B>,
    pub tgt_position_embedding: Embedding<B>,
    pub encoder:                Vec<EncoderLayer<B>>,
    pub decoder:                Vec<DecoderLayer<B>>,
    pub output_layer:           Linear<B>,
    pub src_pad_idx:            usize,
    pub tgt_pad_idx:            usize,
}

impl<B: Backend> TranslationTransformer<B> {
    /// source: [batch, src_len], target: [batch, tgt_len] → [batch, tgt_len, n_tokens_tgt]
    pub fn forward(&self, source: Tensor<B, 2, Int>, target: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, tgt_len] = target.dims();
        let device = target.device();

        let masks = DecoderMasks {
            tgt_attn:        generate_autoregressive_mask::<B>(batch_size, tgt_len, &device),
            src_key_padding: source.clone().equal_elem(self.src_pad_idx as i64),
            tgt_key_padding: target.clone().equal_elem(self.tgt_pad_idx as i64),
        };

        let src = embed(&self.src_embedding, &self.src_position_embedding, source);
        let tgt = embed(&self.tgt_embedding, &self.tgt_position_embedding, target);

        let mut encoded = src;
        for layer in &self.encoder {
            encoded = layer.forward(encoded, masks.src_key_padding.clone());
        }

        let mut decoded = tgt;
        for layer in &self.decoder {
            decoded = layer.forward(encoded.clone(), decoded, &masks);
        }

        self.output_layer.forward(decoded)
    }
}

/// Token embedding plus learned position embedding.
fn embed<B: Backend>(tokens: &Embedding<B>, positions: &Embedding<B>, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
    let [batch_size, seq_len] = ids.dims();
    let device = ids.device();

    // Self-attention is permutation-invariant, so position must be injected explicitly.
    let position_ids = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
        .unsqueeze::<2>()
        .expand([batch_size, seq_len]);

    tokens.forward(ids) + positions.forward(position_ids)
}

impl<B: Backend> Seq2Seq<B> for TranslationTransformer<B> {
    fn forward(&self, source: Tensor<B, 2, Int>, target: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        TranslationTransformer::forward(self, source, target)
    }
}
