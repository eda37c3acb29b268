mod types;
mod error;
mod sentinel;

pub use types::*;
pub use error::*;
pub use sentinel::*;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;

use lsr_engine::{LlamaCppEngine, LlamaSession};

/// Opaque session handle that owns the engine state and any loaded
/// (model, context) pair.
pub struct LsrSession {
    inner: LlamaSession,
}

impl Default for LsrSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LsrSession {
    pub fn new() -> Self {
        Self {
            inner: LlamaSession::new(LlamaCppEngine::new()),
        }
    }
}

/// Execute a closure that returns an `LsrStatus`, catching any panics
/// and converting them into `LsrStatus::ErrorInternal`.
fn catch_panic<F: FnOnce() -> LsrStatus + std::panic::UnwindSafe>(f: F) -> LsrStatus {
    match std::panic::catch_unwind(f) {
        Ok(status) => status,
        Err(_) => {
            set_last_error("internal panic".to_string());
            LsrStatus::ErrorInternal
        }
    }
}

/// Create a new session.
///
/// On success, writes a heap-allocated `LsrSession` pointer into
/// `*session_out` and returns `LsrStatus::Ok`. The caller must later call
/// `lsr_session_destroy` to free the session.
#[no_mangle]
pub extern "C" fn lsr_session_create(session_out: *mut *mut LsrSession) -> LsrStatus {
    catch_panic(|| {
        if session_out.is_null() {
            set_last_error("session_out is null".to_string());
            return LsrStatus::ErrorInvalidArgument;
        }
        let session = Box::new(LsrSession::new());
        unsafe {
            *session_out = Box::into_raw(session);
        }
        LsrStatus::Ok
    })
}

/// Destroy a session previously created by `lsr_session_create`.
///
/// Any loaded model is released on the way out, context before model.
/// Passing a null pointer is a no-op and returns `LsrStatus::Ok`.
#[no_mangle]
pub unsafe extern "C" fn lsr_session_destroy(session: *mut LsrSession) -> LsrStatus {
    if session.is_null() {
        return LsrStatus::Ok;
    }
    drop(Box::from_raw(session));
    LsrStatus::Ok
}

/// One-time backend setup, discovering compute backend libraries under
/// `library_dir`.
///
/// Idempotent per session: once a session is initialized, later calls
/// return `LsrStatus::Ok` without doing any work.
#[no_mangle]
pub unsafe extern "C" fn lsr_init(
    session: *mut LsrSession,
    library_dir: *const c_char,
) -> LsrStatus {
    catch_panic(|| {
        if session.is_null() || library_dir.is_null() {
            set_last_error("null argument".to_string());
            return LsrStatus::ErrorInvalidArgument;
        }
        let session = unsafe { &mut *session };
        let dir_str = match unsafe { CStr::from_ptr(library_dir) }.to_str() {
            Ok(s) => s,
            Err(e) => {
                set_last_error(format!("invalid library path: {}", e));
                return LsrStatus::ErrorInvalidArgument;
            }
        };

        match session.inner.init(Path::new(dir_str)) {
            Ok(()) => LsrStatus::Ok,
            Err(e) => {
                set_last_error(format!("backend init failed: {}", e));
                LsrStatus::from_engine_error(&e)
            }
        }
    })
}

/// Load a GGUF model from disk, replacing any previously loaded model.
///
/// Returns `true` on success. On failure the session holds no model at all
/// and the cause is retrievable via `lsr_last_error`. A session must be
/// initialized with `lsr_init` before loading.
#[no_mangle]
pub unsafe extern "C" fn lsr_load_model(
    session: *mut LsrSession,
    model_path: *const c_char,
) -> bool {
    let outcome = std::panic::catch_unwind(|| {
        if session.is_null() || model_path.is_null() {
            set_last_error("null argument".to_string());
            return false;
        }
        let session = unsafe { &mut *session };
        let path_str = match unsafe { CStr::from_ptr(model_path) }.to_str() {
            Ok(s) => s,
            Err(e) => {
                set_last_error(format!("invalid path: {}", e));
                return false;
            }
        };

        match session.inner.load(Path::new(path_str)) {
            Ok(()) => true,
            Err(e) => {
                set_last_error(format!("failed to load model: {}", e));
                false
            }
        }
    });
    match outcome {
        Ok(loaded) => loaded,
        Err(_) => {
            set_last_error("internal panic".to_string());
            false
        }
    }
}

/// Run one blocking prompt-to-completion turn against the loaded model.
///
/// On `LsrStatus::Ok` a heap-allocated C string is written into `*output`;
/// the caller must free it with `lsr_free_string`. Prompt-level failures
/// (no model loaded, empty prompt, tokenize failure) also return `Ok` with
/// a fixed bracketed sentinel string as the output, so the host always has
/// something to display.
#[no_mangle]
pub unsafe extern "C" fn lsr_prompt(
    session: *mut LsrSession,
    prompt: *const c_char,
    output: *mut *mut c_char,
) -> LsrStatus {
    catch_panic(|| {
        if session.is_null() || prompt.is_null() || output.is_null() {
            set_last_error("null argument".to_string());
            return LsrStatus::ErrorInvalidArgument;
        }
        let session = unsafe { &mut *session };
        let prompt_str = match unsafe { CStr::from_ptr(prompt) }.to_str() {
            Ok(s) => s,
            Err(e) => {
                set_last_error(format!("invalid prompt: {}", e));
                return LsrStatus::ErrorInvalidArgument;
            }
        };

        let text = sentinel::flatten_prompt_result(session.inner.generate(prompt_str));
        match CString::new(text) {
            Ok(c) => {
                unsafe { *output = c.into_raw() };
                LsrStatus::Ok
            }
            Err(e) => {
                set_last_error(format!("output encoding error: {}", e));
                LsrStatus::ErrorInternal
            }
        }
    })
}

/// Release the loaded model and its context, context first.
///
/// Safe to call when nothing is loaded. The session stays initialized, so a
/// new model can be loaded afterwards without another `lsr_init`.
#[no_mangle]
pub unsafe extern "C" fn lsr_unload(session: *mut LsrSession) -> LsrStatus {
    if session.is_null() {
        return LsrStatus::ErrorInvalidArgument;
    }
    let session = &mut *session;
    session.inner.unload();
    LsrStatus::Ok
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error, or
/// null if no error has occurred. The caller must free the returned string
/// with `lsr_free_string`.
#[no_mangle]
pub extern "C" fn lsr_last_error() -> *const c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null(),
    }
}

/// Free a string previously returned by `lsr_prompt` or `lsr_last_error`.
#[no_mangle]
pub unsafe extern "C" fn lsr_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    fn create_session() -> *mut LsrSession {
        let mut session: *mut LsrSession = ptr::null_mut();
        let status = lsr_session_create(&mut session);
        assert_eq!(status, LsrStatus::Ok);
        assert!(!session.is_null());
        session
    }

    fn read_and_free(s: *mut c_char) -> String {
        assert!(!s.is_null());
        let text = unsafe { CStr::from_ptr(s) }.to_str().unwrap().to_string();
        unsafe { lsr_free_string(s) };
        text
    }

    #[test]
    fn test_create_rejects_null_out_pointer() {
        assert_eq!(
            lsr_session_create(ptr::null_mut()),
            LsrStatus::ErrorInvalidArgument
        );
    }

    #[test]
    fn test_destroy_null_is_a_no_op() {
        assert_eq!(unsafe { lsr_session_destroy(ptr::null_mut()) }, LsrStatus::Ok);
    }

    #[test]
    fn test_init_rejects_null_arguments() {
        let session = create_session();
        assert_eq!(
            unsafe { lsr_init(session, ptr::null()) },
            LsrStatus::ErrorInvalidArgument
        );
        assert_eq!(
            unsafe { lsr_init(ptr::null_mut(), c"/libs".as_ptr()) },
            LsrStatus::ErrorInvalidArgument
        );
        unsafe { lsr_session_destroy(session) };
    }

    #[test]
    fn test_load_before_init_fails() {
        let session = create_session();
        let loaded = unsafe { lsr_load_model(session, c"/models/tiny.gguf".as_ptr()) };
        assert!(!loaded);
        let err = read_and_free(lsr_last_error() as *mut c_char);
        assert!(err.contains("not initialized"));
        unsafe { lsr_session_destroy(session) };
    }

    #[test]
    fn test_load_rejects_null_arguments() {
        let session = create_session();
        assert!(!unsafe { lsr_load_model(session, ptr::null()) });
        assert!(!unsafe { lsr_load_model(ptr::null_mut(), c"/m.gguf".as_ptr()) });
        unsafe { lsr_session_destroy(session) };
    }

    #[test]
    fn test_prompt_without_model_returns_sentinel() {
        let session = create_session();
        let mut output: *mut c_char = ptr::null_mut();
        let status = unsafe { lsr_prompt(session, c"2+2=".as_ptr(), &mut output) };
        assert_eq!(status, LsrStatus::Ok);
        assert_eq!(
            read_and_free(output),
            "[Model not loaded. Call loadModel() first.]"
        );
        unsafe { lsr_session_destroy(session) };
    }

    #[test]
    fn test_prompt_rejects_null_arguments() {
        let session = create_session();
        let mut output: *mut c_char = ptr::null_mut();
        assert_eq!(
            unsafe { lsr_prompt(session, ptr::null(), &mut output) },
            LsrStatus::ErrorInvalidArgument
        );
        assert_eq!(
            unsafe { lsr_prompt(session, c"hi".as_ptr(), ptr::null_mut()) },
            LsrStatus::ErrorInvalidArgument
        );
        unsafe { lsr_session_destroy(session) };
    }

    #[test]
    fn test_unload_without_model_is_ok() {
        let session = create_session();
        assert_eq!(unsafe { lsr_unload(session) }, LsrStatus::Ok);
        assert_eq!(unsafe { lsr_unload(ptr::null_mut()) }, LsrStatus::ErrorInvalidArgument);
        unsafe { lsr_session_destroy(session) };
    }

    #[test]
    fn test_last_error_is_cleared_on_read() {
        set_last_error("boom".to_string());
        let err = read_and_free(lsr_last_error() as *mut c_char);
        assert_eq!(err, "boom");
        assert!(lsr_last_error().is_null());
    }
}
