//! Sentinel strings for prompt failures.
//!
//! Host UIs display whatever `lsr_prompt` writes, so prompt-level failures
//! are flattened into fixed bracketed strings rather than surfaced as status
//! codes. These exact strings are part of the ABI contract; hosts match on
//! them.

use lsr_engine::PromptError;

pub const MODEL_NOT_LOADED: &str = "[Model not loaded. Call loadModel() first.]";
pub const EMPTY_OR_INVALID_PROMPT: &str = "[Empty or invalid prompt]";
pub const TOKENIZE_FAILED: &str = "[Tokenize failed]";

/// Collapses a prompt outcome into the single string the host displays.
pub fn flatten_prompt_result(result: Result<String, PromptError>) -> String {
    match result {
        Ok(text) => text,
        Err(PromptError::NotLoaded) => MODEL_NOT_LOADED.to_string(),
        Err(PromptError::EmptyPrompt) => EMPTY_OR_INVALID_PROMPT.to_string(),
        Err(PromptError::TokenizeFailed) => TOKENIZE_FAILED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_passes_text_through() {
        assert_eq!(flatten_prompt_result(Ok("hello".to_string())), "hello");
        assert_eq!(flatten_prompt_result(Ok(String::new())), "");
    }

    #[test]
    fn test_failures_map_to_exact_sentinels() {
        assert_eq!(
            flatten_prompt_result(Err(PromptError::NotLoaded)),
            "[Model not loaded. Call loadModel() first.]"
        );
        assert_eq!(
            flatten_prompt_result(Err(PromptError::EmptyPrompt)),
            "[Empty or invalid prompt]"
        );
        assert_eq!(
            flatten_prompt_result(Err(PromptError::TokenizeFailed)),
            "[Tokenize failed]"
        );
    }
}
