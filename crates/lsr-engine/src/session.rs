//! The session lifecycle state machine and generation loop.
//!
//! A `Session` owns at most one live (model, context) pair and moves through
//! a fixed call sequence: `init` -> `load` -> `generate`* -> `unload`. All
//! methods block on the caller's thread; the caller serializes access.

use std::path::Path;

use tracing::{error, info, warn};

use crate::engine::{ContextHandle, Engine, ContextParams, ModelHandle};
use crate::error::{EngineError, PromptError};
use crate::truncate::truncate_prompt;

/// Upper bound on sampled tokens per `generate` call. Generation always
/// terminates within this many decode steps.
pub const MAX_GENERATED_TOKENS: usize = 256;

/// Owning composite for a model and the execution context bound to it.
///
/// Field order is load-bearing: the context is declared first so it is
/// released before the model, making a dangling context unrepresentable.
struct ModelPair<M: ModelHandle> {
    context: M::Context,
    model: M,
}

/// Single-session engine state: backend initialization flag plus the live
/// (model, context) pair, if any.
pub struct Session<E: Engine> {
    engine: E,
    initialized: bool,
    pair: Option<ModelPair<E::Model>>,
}

impl<E: Engine> Session<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            initialized: false,
            pair: None,
        }
    }

    /// Whether `init` has completed successfully.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a (model, context) pair is live.
    pub fn is_loaded(&self) -> bool {
        self.pair.is_some()
    }

    /// One-time backend setup, discovering compute backends under
    /// `library_dir`. Idempotent: once initialized, later calls are no-ops.
    pub fn init(&mut self, library_dir: &Path) -> Result<(), EngineError> {
        if self.initialized {
            return Ok(());
        }
        self.engine.init(library_dir)?;
        self.initialized = true;
        info!("backend initialized");
        Ok(())
    }

    /// Loads a model and creates its execution context, replacing any prior
    /// pair.
    ///
    /// The previous pair is released in full (context before model) before
    /// the new load is attempted. On any failure the session is left fully
    /// empty; a half-initialized pair is never stored.
    pub fn load(&mut self, model_path: &Path) -> Result<(), EngineError> {
        if !self.initialized {
            error!("load called before init");
            return Err(EngineError::NotInitialized);
        }
        self.pair = None;

        let model = match self.engine.load_model(model_path) {
            Ok(model) => model,
            Err(e) => {
                error!("failed to load model: {e}");
                return Err(e);
            }
        };
        let context = match model.new_context(&ContextParams::default()) {
            Ok(context) => context,
            Err(e) => {
                // `model` is dropped here, so the failure path holds nothing.
                error!("failed to init context: {e}");
                return Err(e);
            }
        };
        self.pair = Some(ModelPair { context, model });
        info!("model loaded: {}", model_path.display());
        Ok(())
    }

    /// Releases the context and model, in that order. Safe to call when
    /// nothing is loaded.
    pub fn unload(&mut self) {
        self.pair = None;
        info!("model unloaded");
    }

    /// Runs the single-turn greedy generation loop against the loaded model.
    ///
    /// The prompt is tokenized, capped by the truncation policy, and fed as
    /// the first decode batch; each following batch is the single token just
    /// sampled. The loop stops at the end-of-generation token, after
    /// [`MAX_GENERATED_TOKENS`] sampled tokens, or on a decode error - the
    /// last returns the text accumulated so far rather than failing.
    pub fn generate(&mut self, prompt: &str) -> Result<String, PromptError> {
        let pair = self.pair.as_mut().ok_or(PromptError::NotLoaded)?;

        let tokens = pair.model.tokenize(prompt).map_err(|e| {
            error!("tokenize failed: {e}");
            PromptError::TokenizeFailed
        })?;
        if tokens.is_empty() {
            return Err(PromptError::EmptyPrompt);
        }
        let tokens = truncate_prompt(tokens);

        // Single-turn semantics: each call starts from an empty recurrent
        // state.
        pair.context.clear();

        let mut out: Vec<u8> = Vec::new();
        let mut batch = tokens;
        for step in 0..MAX_GENERATED_TOKENS {
            if let Err(e) = pair.context.decode(&batch) {
                warn!("decode failed after {step} tokens, returning partial text: {e}");
                break;
            }
            let next = pair.context.sample_greedy();
            if pair.model.is_end_of_generation(next) {
                break;
            }
            if let Some(piece) = pair.model.piece_bytes(next) {
                out.extend_from_slice(&piece);
            }
            batch = vec![next];
        }

        // Fragments are raw bytes; a multi-byte character may span several
        // tokens, so conversion happens only once the loop is done.
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
