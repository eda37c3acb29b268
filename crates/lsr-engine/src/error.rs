use thiserror::Error;

/// Errors surfaced by the engine seam and the session lifecycle.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A load was attempted before backend initialization.
    #[error("backend not initialized")]
    NotInitialized,
    /// Process-wide compute backend setup failed.
    #[error("backend init failed: {0}")]
    BackendInit(String),
    /// The model file could not be loaded.
    #[error("failed to load model: {0}")]
    ModelLoad(String),
    /// An execution context could not be created for a loaded model.
    #[error("failed to init context: {0}")]
    ContextInit(String),
    /// The engine rejected the prompt text.
    #[error("tokenize failed: {0}")]
    Tokenize(String),
    /// A decode call failed.
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Failure kinds a `generate` call reports to its caller.
///
/// Decode failures are deliberately absent: the generation loop recovers from
/// them locally and returns whatever text was accumulated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    /// No (model, context) pair is live.
    #[error("no model loaded")]
    NotLoaded,
    /// The prompt produced nothing tokenizable.
    #[error("empty or invalid prompt")]
    EmptyPrompt,
    /// The engine reported a tokenization error.
    #[error("tokenize failed")]
    TokenizeFailed,
}

pub type Result<T> = std::result::Result<T, EngineError>;
