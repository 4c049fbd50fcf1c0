//! FFI types for C interoperability.
//!
//! These types are designed to be safe across the C ABI boundary.

use std::ffi::{c_char, c_uint, c_void};

use crate::error::Error;
use crate::pocsag::MessageKind;
use crate::session::SessionStats;

/// Result codes for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PocsagResult {
    /// Operation succeeded.
    Ok = 0,
    /// Invalid parameter (null pointer, bad UTF-8, ...).
    InvalidParam = -1,
    /// Length negative or larger than the buffer.
    InvalidLength = -2,
    /// Configuration rejected.
    InvalidConfig = -3,
    /// Internal error.
    InternalError = -99,
}

impl From<&Error> for PocsagResult {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidParam(_) => PocsagResult::InvalidParam,
            Error::InvalidLength { .. } => PocsagResult::InvalidLength,
            Error::InvalidConfig(_) | Error::UnsupportedBaudRate(_) | Error::Json(_) => {
                PocsagResult::InvalidConfig
            }
            Error::Io(_) | Error::Internal(_) => PocsagResult::InternalError,
        }
    }
}

/// Payload interpretation of a page.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PocsagPageKind {
    Numeric = 0,
    Alpha1 = 1,
    Alpha2 = 2,
    Alpha3 = 3,
    Tone = 4,
}

impl From<MessageKind> for PocsagPageKind {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Numeric => PocsagPageKind::Numeric,
            MessageKind::Alpha1 => PocsagPageKind::Alpha1,
            MessageKind::Alpha2 => PocsagPageKind::Alpha2,
            MessageKind::Alpha3 => PocsagPageKind::Alpha3,
            MessageKind::Tone => PocsagPageKind::Tone,
        }
    }
}

/// A decoded page handed to `on_message`.
///
/// `text` is only valid for the duration of the callback.
#[repr(C)]
#[derive(Debug)]
pub struct PocsagPage {
    /// 21-bit receiver identity code.
    pub address: u32,
    /// Function bits (0-3).
    pub function: c_uint,
    pub kind: PocsagPageKind,
    /// Message text (null-terminated UTF-8, empty for tone-only pages).
    pub text: *const c_char,
    /// Seconds since the Unix epoch.
    pub received_at: u64,
    /// Bit errors corrected while decoding.
    pub corrected_bits: u32,
}

/// Statistics about a session.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PocsagStats {
    pub bytes_received: u64,
    pub blocks: u64,
    pub samples: u64,
    pub bits: u64,
    pub preambles: u64,
    pub syncs: u64,
    pub inverted_syncs: u64,
    pub batches: u64,
    pub codewords_clean: u64,
    pub codewords_corrected: u64,
    pub codewords_uncorrectable: u64,
    pub messages: u64,
}

impl From<&SessionStats> for PocsagStats {
    fn from(stats: &SessionStats) -> Self {
        Self {
            bytes_received: stats.bytes_received,
            blocks: stats.blocks,
            samples: stats.decoder.samples,
            bits: stats.decoder.bits,
            preambles: stats.decoder.preambles,
            syncs: stats.decoder.syncs,
            inverted_syncs: stats.decoder.inverted_syncs,
            batches: stats.decoder.batches,
            codewords_clean: stats.decoder.codewords_clean,
            codewords_corrected: stats.decoder.codewords_corrected,
            codewords_uncorrectable: stats.decoder.codewords_uncorrectable,
            messages: stats.decoder.messages,
        }
    }
}

impl PocsagStats {
    /// Values in field order, for bindings that only pass arrays.
    pub fn to_array(&self) -> [u64; 12] {
        [
            self.bytes_received,
            self.blocks,
            self.samples,
            self.bits,
            self.preambles,
            self.syncs,
            self.inverted_syncs,
            self.batches,
            self.codewords_clean,
            self.codewords_corrected,
            self.codewords_uncorrectable,
            self.messages,
        ]
    }
}

/// Opaque handle to a decode session.
pub type PocsagHandle = *mut c_void;

/// Null handle constant.
pub const POCSAG_HANDLE_NULL: PocsagHandle = std::ptr::null_mut();
