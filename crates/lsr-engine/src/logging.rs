//! Bridge from engine-internal log callbacks onto the host `tracing` stack.
//!
//! The engine reports diagnostics through a C callback carrying a severity
//! level and a text line. The bridge forwards each line as-is under a fixed
//! component target; there is no buffering or filtering.

use std::ffi::{c_char, c_void, CStr};
use std::sync::Once;

use tracing::{debug, error, info, warn};

/// Component tag for engine-originated log lines.
const TARGET: &str = "lsr_engine";

// ggml_log_level values, from ggml.h.
const LEVEL_DEBUG: i32 = 1;
const LEVEL_INFO: i32 = 2;
const LEVEL_WARN: i32 = 3;
const LEVEL_ERROR: i32 = 4;

/// Host-side severity for an engine log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeLevel {
    Error,
    Warn,
    Info,
    Debug,
}

/// Maps a raw engine log level onto a host level.
///
/// The mapping is total: unrecognized levels (including continuation lines)
/// fall back to `Info`.
pub fn map_level(raw: i32) -> BridgeLevel {
    match raw {
        LEVEL_ERROR => BridgeLevel::Error,
        LEVEL_WARN => BridgeLevel::Warn,
        LEVEL_INFO => BridgeLevel::Info,
        LEVEL_DEBUG => BridgeLevel::Debug,
        _ => BridgeLevel::Info,
    }
}

fn emit(level: BridgeLevel, text: &str) {
    match level {
        BridgeLevel::Error => error!(target: TARGET, "{text}"),
        BridgeLevel::Warn => warn!(target: TARGET, "{text}"),
        BridgeLevel::Info => info!(target: TARGET, "{text}"),
        BridgeLevel::Debug => debug!(target: TARGET, "{text}"),
    }
}

unsafe extern "C" fn engine_log_callback(
    level: llama_cpp_sys_2::ggml_log_level,
    text: *const c_char,
    _user_data: *mut c_void,
) {
    if text.is_null() {
        return;
    }
    let text = CStr::from_ptr(text).to_string_lossy();
    let line = text.trim_end_matches('\n');
    if line.is_empty() {
        return;
    }
    emit(map_level(level as i32), line);
}

static INSTALL: Once = Once::new();

/// Registers the bridge as the engine's log callback. Process-wide; repeated
/// calls are no-ops.
pub fn install_bridge() {
    INSTALL.call_once(|| unsafe {
        llama_cpp_sys_2::llama_log_set(Some(engine_log_callback), std::ptr::null_mut());
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_levels_map_directly() {
        assert_eq!(map_level(LEVEL_ERROR), BridgeLevel::Error);
        assert_eq!(map_level(LEVEL_WARN), BridgeLevel::Warn);
        assert_eq!(map_level(LEVEL_INFO), BridgeLevel::Info);
        assert_eq!(map_level(LEVEL_DEBUG), BridgeLevel::Debug);
    }

    #[test]
    fn test_unrecognized_levels_fall_back_to_info() {
        assert_eq!(map_level(0), BridgeLevel::Info);
        assert_eq!(map_level(5), BridgeLevel::Info);
        assert_eq!(map_level(99), BridgeLevel::Info);
        assert_eq!(map_level(-1), BridgeLevel::Info);
    }
}
