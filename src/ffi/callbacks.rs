//! FFI callbacks for event notifications.
//!
//! Host applications register callbacks to receive status lines, decoded
//! pages and log messages from a session.

use std::ffi::{c_char, c_void, CString};

use super::types::PocsagPage;
use crate::pocsag::PocsagMessage;
use crate::session::SessionSink;

/// Callback for the per-block status line.
///
/// # Parameters
/// - `context`: User-provided context pointer.
/// - `status`: Null-terminated UTF-8, e.g. `Received 16384 bytes`.
pub type StatusCallback = Option<extern "C" fn(context: *mut c_void, status: *const c_char)>;

/// Callback for a decoded page.
///
/// The page and its text are only valid during the call; copy what you keep.
pub type MessageCallback = Option<extern "C" fn(context: *mut c_void, page: *const PocsagPage)>;

/// Callback for log messages.
///
/// # Parameters
/// - `context`: User-provided context pointer.
/// - `level`: Log level (0=debug, 1=info, 2=warn, 3=error).
/// - `message`: Null-terminated UTF-8 log message.
pub type LogCallback =
    Option<extern "C" fn(context: *mut c_void, level: i32, message: *const c_char)>;

/// Collection of all callbacks.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PocsagCallbacks {
    /// User context pointer passed to all callbacks.
    pub context: *mut c_void,
    pub on_status: StatusCallback,
    pub on_message: MessageCallback,
    pub on_log: LogCallback,
}

impl Default for PocsagCallbacks {
    fn default() -> Self {
        Self {
            context: std::ptr::null_mut(),
            on_status: None,
            on_message: None,
            on_log: None,
        }
    }
}

// Safety: the host owns `context` and promises it may be used from the
// thread that drives the session; calls on a handle are serialised.
unsafe impl Send for PocsagCallbacks {}
unsafe impl Sync for PocsagCallbacks {}

impl PocsagCallbacks {
    /// Log a message through the registered callback.
    #[inline]
    pub fn log(&self, level: i32, msg: &str) {
        if let Some(cb) = self.on_log {
            if let Ok(cstr) = CString::new(msg) {
                cb(self.context, level, cstr.as_ptr());
            }
        }
    }

    #[inline]
    pub fn log_debug(&self, msg: &str) {
        self.log(0, msg);
    }

    #[inline]
    pub fn log_info(&self, msg: &str) {
        self.log(1, msg);
    }

    #[inline]
    pub fn log_warn(&self, msg: &str) {
        self.log(2, msg);
    }

    #[inline]
    pub fn log_error(&self, msg: &str) {
        self.log(3, msg);
    }
}

/// Interior NUL bytes cannot cross the boundary; they are dropped.
fn to_cstring(s: &str) -> CString {
    CString::new(s).unwrap_or_else(|_| {
        let cleaned: Vec<u8> = s.bytes().filter(|&b| b != 0).collect();
        CString::new(cleaned).unwrap_or_default()
    })
}

impl SessionSink for PocsagCallbacks {
    fn on_status(&self, status: &str) {
        if let Some(cb) = self.on_status {
            let cstr = to_cstring(status);
            cb(self.context, cstr.as_ptr());
        }
    }

    fn on_message(&self, message: &PocsagMessage) {
        if let Some(cb) = self.on_message {
            let text = to_cstring(&message.content);
            let page = PocsagPage {
                address: message.address,
                function: message.function as u32,
                kind: message.kind.into(),
                text: text.as_ptr(),
                received_at: message.received_at,
                corrected_bits: message.corrected_bits,
            };
            cb(self.context, &page);
        }
    }
}
