// ============================================================
// Layer 3 — Architecture
// ============================================================
// The three sequence-to-sequence model families under comparison.

use std::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    /// Vanilla recurrent network: h' = tanh(W_i x + W_h h + b)
    Rnn,
    /// Gated recurrent unit network
    Gru,
    /// Encoder/decoder attention model
    Transformer,
}

impl Architecture {
    pub const ALL: [Architecture; 3] = [Self::Rnn, Self::Gru, Self::Transformer];

    /// Directory-friendly lowercase name
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Rnn         => "rnn",
            Self::Gru         => "gru",
            Self::Transformer => "transformer",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rnn         => "RNN",
            Self::Gru         => "GRU",
            Self::Transformer => "Transformer",
        };
        f.write_str(name)
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rnn"         => Ok(Self::Rnn),
            "gru"         => Ok(Self::Gru),
            "transformer" => Ok(Self::Transformer),
            other => Err(format!(
                "unknown architecture '{other}' (expected rnn, gru or transformer)"
            )),
        }
    }
}
