//! Seam traits over the opaque inference engine.
//!
//! The session state machine drives generation exclusively through these
//! traits. The real implementation lives in [`crate::llama`]; tests
//! substitute a scripted engine.

use std::path::Path;

use crate::error::Result;

/// Integer identifier from the model's fixed vocabulary.
pub type TokenId = i32;

/// Fixed-capacity execution window configuration.
///
/// These are policy constants rather than host-tunable knobs: the context
/// window holds 2048 tokens and one decode batch holds at most 512.
#[derive(Debug, Clone)]
pub struct ContextParams {
    pub context_length: u32,
    pub batch_capacity: u32,
}

impl Default for ContextParams {
    fn default() -> Self {
        Self {
            context_length: 2048,
            batch_capacity: 512,
        }
    }
}

/// Process-wide engine capabilities: backend setup and model loading.
pub trait Engine {
    type Model: ModelHandle;

    /// One-time compute backend setup, discovering backends under
    /// `library_dir`. Implementations must tolerate repeated calls.
    fn init(&mut self, library_dir: &Path) -> Result<()>;

    /// Loads model weights and vocabulary from a file path.
    fn load_model(&mut self, path: &Path) -> Result<Self::Model>;
}

/// Opaque handle to loaded weights and vocabulary; read-only after creation.
pub trait ModelHandle {
    type Context: ContextHandle;

    /// Creates an execution context bound to this model.
    fn new_context(&self, params: &ContextParams) -> Result<Self::Context>;

    /// Converts UTF-8 text into vocabulary tokens, with beginning-of-sequence
    /// and special-token handling enabled.
    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>>;

    /// Renders one sampled token's display fragment as raw bytes, or `None`
    /// when the piece cannot be rendered.
    fn piece_bytes(&self, token: TokenId) -> Option<Vec<u8>>;

    /// Whether `token` marks the end of generation for this vocabulary.
    fn is_end_of_generation(&self, token: TokenId) -> bool;
}

/// Opaque recurrent execution state, mutated in place by decode calls.
pub trait ContextHandle {
    /// Runs one forward pass over `tokens`, advancing the recurrent state.
    fn decode(&mut self, tokens: &[TokenId]) -> Result<()>;

    /// Deterministically selects the highest-probability next token from the
    /// last decode's output distribution.
    fn sample_greedy(&mut self) -> TokenId;

    /// Resets the recurrent state to empty.
    fn clear(&mut self);
}
