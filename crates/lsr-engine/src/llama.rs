//! llama.cpp-backed implementation of the engine seam.
//!
//! The engine is consumed strictly as an opaque capability through the
//! `llama-cpp-2` bindings: weights, vocabulary, tokenization, and the
//! transformer forward pass all live behind `LlamaModel` and `LlamaContext`.

use std::ffi::CString;
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::context::LlamaContext;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaModel};
use llama_cpp_2::sampling::LlamaSampler;
use llama_cpp_2::token::LlamaToken;
use tracing::info;

use crate::engine::{ContextHandle, ContextParams, Engine, ModelHandle, TokenId};
use crate::error::EngineError;
use crate::logging;

/// Global llama.cpp backend. llama.cpp supports exactly one backend
/// initialization per process, so every engine instance shares this.
static BACKEND: OnceLock<Result<LlamaBackend, String>> = OnceLock::new();

fn backend() -> Result<&'static LlamaBackend, EngineError> {
    let result = BACKEND.get_or_init(|| LlamaBackend::init().map_err(|e| e.to_string()));
    match result {
        Ok(backend) => Ok(backend),
        Err(e) => Err(EngineError::BackendInit(e.clone())),
    }
}

/// Loads dynamic compute backends (CPU/GPU variants) from a directory.
fn load_backends_from(library_dir: &Path) -> Result<(), EngineError> {
    let path = library_dir.to_str().ok_or_else(|| {
        EngineError::BackendInit(format!(
            "non-UTF-8 library path: {}",
            library_dir.display()
        ))
    })?;
    let cpath = CString::new(path)
        .map_err(|e| EngineError::BackendInit(format!("invalid library path: {e}")))?;
    unsafe { llama_cpp_sys_2::ggml_backend_load_all_from_path(cpath.as_ptr()) };
    info!("compute backends loaded from {}", library_dir.display());
    Ok(())
}

/// Engine implementation backed by llama.cpp.
#[derive(Debug, Default)]
pub struct LlamaCppEngine;

impl LlamaCppEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for LlamaCppEngine {
    type Model = CppModel;

    fn init(&mut self, library_dir: &Path) -> Result<(), EngineError> {
        // The log callback must be live before backend discovery so early
        // engine output already reaches the host sink.
        logging::install_bridge();
        load_backends_from(library_dir)?;
        backend()?;
        Ok(())
    }

    fn load_model(&mut self, path: &Path) -> Result<CppModel, EngineError> {
        let backend = backend()?;
        let params = LlamaModelParams::default();
        let model = LlamaModel::load_from_file(backend, path, &params)
            .map_err(|e| EngineError::ModelLoad(e.to_string()))?;
        Ok(CppModel {
            inner: Arc::new(model),
        })
    }
}

/// Opaque handle to loaded weights and their vocabulary.
pub struct CppModel {
    inner: Arc<LlamaModel>,
}

impl ModelHandle for CppModel {
    type Context = CppContext;

    fn new_context(&self, params: &ContextParams) -> Result<CppContext, EngineError> {
        let backend = backend()?;
        let n_ctx = NonZeroU32::new(params.context_length)
            .ok_or_else(|| EngineError::ContextInit("context length must be non-zero".into()))?;
        let ctx_params = LlamaContextParams::default()
            .with_n_ctx(Some(n_ctx))
            .with_n_batch(params.batch_capacity);
        let model = Arc::clone(&self.inner);
        let ctx = model
            .new_context(backend, ctx_params)
            .map_err(|e| EngineError::ContextInit(e.to_string()))?;
        // The context borrows the model inside the Arc allocation, whose
        // address is stable. Erasing the lifetime lets both live in one
        // struct; `CppContext` keeps the Arc alive and drops the context
        // first.
        let inner =
            unsafe { std::mem::transmute::<LlamaContext<'_>, LlamaContext<'static>>(ctx) };
        Ok(CppContext {
            inner,
            batch: LlamaBatch::new(params.batch_capacity as usize, 1),
            n_past: 0,
            _model: model,
        })
    }

    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>, EngineError> {
        let tokens = self
            .inner
            .str_to_token(text, AddBos::Always)
            .map_err(|e| EngineError::Tokenize(e.to_string()))?;
        Ok(tokens.into_iter().map(|t| t.0).collect())
    }

    fn piece_bytes(&self, token: TokenId) -> Option<Vec<u8>> {
        // Pieces that do not fit the 128-byte render buffer are dropped.
        self.inner
            .token_to_piece_bytes(LlamaToken(token), 128, true, None)
            .ok()
    }

    fn is_end_of_generation(&self, token: TokenId) -> bool {
        self.inner.is_eog_token(LlamaToken(token))
    }
}

/// Opaque handle to a fixed-capacity execution window bound to one model.
pub struct CppContext {
    // Field order is load-bearing: `inner` borrows the model kept alive by
    // `_model` and must drop first.
    inner: LlamaContext<'static>,
    batch: LlamaBatch<'static>,
    n_past: i32,
    _model: Arc<LlamaModel>,
}

impl ContextHandle for CppContext {
    fn decode(&mut self, tokens: &[TokenId]) -> Result<(), EngineError> {
        if tokens.is_empty() {
            return Ok(());
        }
        self.batch.clear();
        let last = tokens.len() - 1;
        for (i, &token) in tokens.iter().enumerate() {
            self.batch
                .add(LlamaToken(token), self.n_past + i as i32, &[0], i == last)
                .map_err(|e| EngineError::Decode(e.to_string()))?;
        }
        self.inner
            .decode(&mut self.batch)
            .map_err(|e| EngineError::Decode(e.to_string()))?;
        self.n_past += tokens.len() as i32;
        Ok(())
    }

    fn sample_greedy(&mut self) -> TokenId {
        // Greedy selection is stateless, so the sampler's lifetime is one
        // step rather than one generation pass.
        let mut sampler = LlamaSampler::greedy();
        sampler.sample(&self.inner, -1).0
    }

    fn clear(&mut self) {
        self.inner.clear_kv_cache();
        self.n_past = 0;
    }
}
