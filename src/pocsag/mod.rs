//! POCSAG protocol: codeword coding, bit synchronisation and message decoding.
//!
//! This module contains:
//! - BCH(31,21) + parity encoding, syndrome checks and error correction
//! - Codeword classification (address, message, idle)
//! - Numeric and alphanumeric message codecs
//! - Bit slicer with adaptive threshold and bit clock recovery
//! - Preamble / sync / batch state machine
//! - Transmission builder for synthetic captures
//!
//! ```text
//! preamble (576 bits 1010...) | SYNC | 8 frames x 2 codewords | SYNC | 8 frames ...
//! ```

pub mod assembler;
pub mod bch;
pub mod codeword;
pub mod decoder;
pub mod encoder;
pub mod message;
pub mod slicer;

pub use assembler::{AssemblerEvent, MessageAssembler};
pub use codeword::{Codeword, IDLE_WORD, SYNC_WORD};
pub use decoder::{DecoderState, DecoderStats, PocsagDecoder};
pub use encoder::{Page, Transmission};
pub use message::{MessageKind, PocsagMessage};
pub use slicer::BitSlicer;

/// Preamble length in bits (alternating 1010...).
pub const PREAMBLE_LENGTH: usize = 576;

/// Codewords per batch, excluding the sync word.
pub const BATCH_SIZE: usize = 16;

/// Frames per batch.
pub const FRAMES_PER_BATCH: usize = 8;

/// Bits per codeword.
pub const CODEWORD_SIZE: usize = 32;

/// Bits in a batch including its sync word.
pub const BATCH_BITS: usize = CODEWORD_SIZE * (BATCH_SIZE + 1);
