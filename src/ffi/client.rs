//! FFI session implementation.
//!
//! This module provides the C-callable functions wrapping [`Session`].

use std::ffi::{c_char, c_int, CStr, CString};
use std::sync::{Arc, Mutex, OnceLock};

use super::callbacks::*;
use super::types::*;
use crate::config::DecoderConfig;
use crate::device::KNOWN_DEVICES;
use crate::error::Error;
use crate::session::{Session, SessionSink};

/// Internal handle state.
struct FfiSession {
    session: Session,
    // Log side of the callbacks; status and pages go through the session sink
    callbacks: PocsagCallbacks,
}

// Thread-safe wrapper
type SessionHandle = Arc<Mutex<FfiSession>>;

/// Box a session into a raw handle.
fn into_handle(session: Session, callbacks: PocsagCallbacks) -> PocsagHandle {
    let handle: SessionHandle = Arc::new(Mutex::new(FfiSession { session, callbacks }));
    Arc::into_raw(handle) as PocsagHandle
}

/// Build a session for a foreign caller and return its handle.
pub(crate) fn create_session(
    config: DecoderConfig,
    sink: Box<dyn SessionSink>,
    callbacks: PocsagCallbacks,
) -> Result<PocsagHandle, Error> {
    let session = Session::new(config, sink)?;
    callbacks.log_info("POCSAG session created");
    Ok(into_handle(session, callbacks))
}

/// Parse an optional JSON configuration string.
unsafe fn config_from_cstr(ptr: *const c_char) -> Result<DecoderConfig, Error> {
    if ptr.is_null() {
        return Ok(DecoderConfig::default());
    }
    let json = CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| Error::param("configuration is not valid UTF-8"))?;
    DecoderConfig::from_json_str(json)
}

/// Run `f` on the session behind `handle`.
unsafe fn with_session<T>(
    handle: PocsagHandle,
    f: impl FnOnce(&mut FfiSession) -> T,
) -> Result<T, PocsagResult> {
    if handle.is_null() {
        return Err(PocsagResult::InvalidParam);
    }
    let inner = &*(handle as *const Mutex<FfiSession>);
    let mut guard = inner.lock().map_err(|_| PocsagResult::InternalError)?;
    Ok(f(&mut guard))
}

// =============================================================================
// FFI Functions - C ABI
// =============================================================================

/// Create a new decode session.
///
/// # Parameters
/// - `config_json`: JSON configuration, or NULL for defaults.
/// - `callbacks`: Optional callbacks for status, pages and logs.
///
/// # Returns
/// Handle to the session, or NULL on error.
///
/// # Safety
/// - `config_json` must be NULL or a valid null-terminated string.
/// - `callbacks` must be NULL or point to a valid `PocsagCallbacks`.
#[no_mangle]
pub unsafe extern "C" fn pocsag_create(
    config_json: *const c_char,
    callbacks: *const PocsagCallbacks,
) -> PocsagHandle {
    let cbs = if callbacks.is_null() {
        PocsagCallbacks::default()
    } else {
        *callbacks
    };

    let config = match config_from_cstr(config_json) {
        Ok(c) => c,
        Err(e) => {
            cbs.log_error(&format!("Invalid configuration: {e}"));
            return POCSAG_HANDLE_NULL;
        }
    };

    match create_session(config, Box::new(cbs), cbs) {
        Ok(handle) => handle,
        Err(e) => {
            cbs.log_error(&format!("Failed to create session: {e}"));
            POCSAG_HANDLE_NULL
        }
    }
}

/// Destroy a session.
///
/// # Safety
/// - `handle` must be a valid handle from `pocsag_create`.
/// - `handle` must not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn pocsag_destroy(handle: PocsagHandle) {
    if handle.is_null() {
        return;
    }
    let session = Arc::from_raw(handle as *const Mutex<FfiSession>);
    if let Ok(guard) = session.lock() {
        guard.callbacks.log_debug("POCSAG session destroyed");
    }
    drop(session);
}

/// Process the first `length` bytes of `data`.
///
/// Reports `Received <length> bytes` through `on_status`, then any decoded
/// pages through `on_message`.
///
/// # Parameters
/// - `handle`: Session handle.
/// - `data`: Sample bytes (may be NULL when `capacity` is 0).
/// - `capacity`: Size of the `data` buffer.
/// - `length`: Number of valid leading bytes.
///
/// # Returns
/// - `length` on success.
/// - Negative `PocsagResult` code on failure; no callback is made.
///
/// # Safety
/// - `data` must be valid for reads of `capacity` bytes.
#[no_mangle]
pub unsafe extern "C" fn pocsag_process(
    handle: PocsagHandle,
    data: *const u8,
    capacity: usize,
    length: c_int,
) -> c_int {
    if data.is_null() && capacity > 0 {
        return PocsagResult::InvalidParam as c_int;
    }
    let buf: &[u8] = if capacity == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(data, capacity)
    };

    let result = with_session(handle, |inner| match inner.session.process(buf, length) {
        Ok(n) => n,
        Err(e) => {
            inner.callbacks.log_warn(&format!("process rejected: {e}"));
            PocsagResult::from(&e) as c_int
        }
    });
    result.unwrap_or_else(|code| code as c_int)
}

/// Flush the page still being collected (end of stream).
///
/// # Returns
/// Number of pages delivered, or a negative `PocsagResult` code.
///
/// # Safety
/// - `handle` must be a valid handle from `pocsag_create`.
#[no_mangle]
pub unsafe extern "C" fn pocsag_finish(handle: PocsagHandle) -> c_int {
    with_session(handle, |inner| inner.session.finish() as c_int)
        .unwrap_or_else(|code| code as c_int)
}

/// Drop partial pages and synchronisation; counters are kept.
///
/// # Safety
/// - `handle` must be a valid handle from `pocsag_create`.
#[no_mangle]
pub unsafe extern "C" fn pocsag_reset(handle: PocsagHandle) -> PocsagResult {
    match with_session(handle, |inner| inner.session.reset()) {
        Ok(()) => PocsagResult::Ok,
        Err(code) => code,
    }
}

/// Get session statistics.
///
/// # Safety
/// - `handle` must be a valid handle from `pocsag_create`.
/// - `stats` must point to writable `PocsagStats`.
#[no_mangle]
pub unsafe extern "C" fn pocsag_get_stats(
    handle: PocsagHandle,
    stats: *mut PocsagStats,
) -> PocsagResult {
    if stats.is_null() {
        return PocsagResult::InvalidParam;
    }
    match with_session(handle, |inner| PocsagStats::from(&inner.session.stats())) {
        Ok(s) => {
            *stats = s;
            PocsagResult::Ok
        }
        Err(code) => code,
    }
}

fn device_names() -> &'static [CString] {
    static NAMES: OnceLock<Vec<CString>> = OnceLock::new();
    NAMES.get_or_init(|| {
        KNOWN_DEVICES
            .iter()
            .filter_map(|d| CString::new(d.name).ok())
            .collect()
    })
}

/// Name of a known SDR receiver.
///
/// # Returns
/// Static null-terminated name, or NULL for unknown devices.
#[no_mangle]
pub extern "C" fn pocsag_identify_device(vendor_id: u16, product_id: u16) -> *const c_char {
    KNOWN_DEVICES
        .iter()
        .position(|d| d.vendor_id == vendor_id && d.product_id == product_id)
        .and_then(|i| device_names().get(i))
        .map_or(std::ptr::null(), |name| name.as_ptr())
}

/// Get library version.
///
/// # Returns
/// Version string (null-terminated UTF-8).
#[no_mangle]
pub extern "C" fn pocsag_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}
