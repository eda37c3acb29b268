//! `lsr-engine` - Session lifecycle and generation loop for llm-session-runtime.
//!
//! This crate provides:
//! - A `Session` state machine owning at most one live (model, context) pair
//! - Seam traits (`Engine`, `ModelHandle`, `ContextHandle`) over the opaque
//!   inference engine
//! - The llama.cpp-backed engine implementation
//! - The fixed prompt-truncation policy
//! - A bridge from engine-internal log levels onto `tracing`
//!
//! Generation is single-turn and synchronous: one `generate` call blocks for
//! the full decode-sample-append loop. The caller serializes all access to a
//! session; there is no internal locking.

pub mod engine;
pub mod error;
pub mod llama;
pub mod logging;
pub mod session;
pub mod truncate;

// Re-export primary types at the crate root for convenience.
pub use engine::{ContextHandle, ContextParams, Engine, ModelHandle, TokenId};
pub use error::{EngineError, PromptError, Result};
pub use llama::LlamaCppEngine;
pub use session::{Session, MAX_GENERATED_TOKENS};
pub use truncate::{truncate_prompt, MAX_PROMPT_TOKENS};

/// Session backed by the real llama.cpp engine.
pub type LlamaSession = Session<LlamaCppEngine>;
