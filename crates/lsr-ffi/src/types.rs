use lsr_engine::EngineError;

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LsrStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    ErrorBackendInit = 2,
    ErrorNotInitialized = 3,
    ErrorModelLoad = 4,
    ErrorInternal = 5,
}

impl LsrStatus {
    pub fn from_engine_error(e: &EngineError) -> Self {
        match e {
            EngineError::NotInitialized => LsrStatus::ErrorNotInitialized,
            EngineError::BackendInit(_) => LsrStatus::ErrorBackendInit,
            EngineError::ModelLoad(_) | EngineError::ContextInit(_) => LsrStatus::ErrorModelLoad,
            EngineError::Tokenize(_) | EngineError::Decode(_) => LsrStatus::ErrorInternal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_and_context_failures_share_a_status() {
        let load = EngineError::ModelLoad("bad file".into());
        let ctx = EngineError::ContextInit("alloc failed".into());
        assert_eq!(LsrStatus::from_engine_error(&load), LsrStatus::ErrorModelLoad);
        assert_eq!(LsrStatus::from_engine_error(&ctx), LsrStatus::ErrorModelLoad);
    }

    #[test]
    fn test_not_initialized_maps_to_its_own_status() {
        assert_eq!(
            LsrStatus::from_engine_error(&EngineError::NotInitialized),
            LsrStatus::ErrorNotInitialized
        );
    }
}
