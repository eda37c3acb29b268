use tracing::warn;

use crate::engine::TokenId;

/// Hard cap on prompt tokens submitted to decoding.
///
/// The execution batch holds 512 tokens; 500 leaves headroom for
/// prompt-template overhead added upstream by the host.
pub const MAX_PROMPT_TOKENS: usize = 500;

/// Caps a tokenized prompt at [`MAX_PROMPT_TOKENS`], keeping the prefix and
/// discarding the remainder. Prompts at or under the cap pass through
/// unchanged.
pub fn truncate_prompt(mut tokens: Vec<TokenId>) -> Vec<TokenId> {
    if tokens.len() > MAX_PROMPT_TOKENS {
        warn!(
            "prompt too long ({} tokens), truncating to {}",
            tokens.len(),
            MAX_PROMPT_TOKENS
        );
        tokens.truncate(MAX_PROMPT_TOKENS);
    }
    tokens
}
