//! Collects address and message codewords into pages.
//!
//! A page starts with an address codeword and runs until the next address
//! codeword, an idle codeword or loss of synchronisation. Message codewords
//! may continue across batch boundaries.

use tracing::debug;

use super::bch;
use super::codeword::Codeword;
use super::message::{decode_alpha, decode_numeric, MessageKind, PocsagMessage};

/// What happened to a codeword handed to the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerEvent {
    /// Codeword accepted without repair.
    Clean,
    /// Codeword accepted after flipping `errors` bits.
    Corrected { errors: u32 },
    /// Codeword could not be repaired and was dropped.
    Uncorrectable,
    /// Message codeword with no page to attach to.
    Orphan,
}

#[derive(Debug)]
struct PendingPage {
    address: u32,
    function: u8,
    words: Vec<u32>,
    corrected_bits: u32,
}

/// Page assembler.
#[derive(Debug)]
pub struct MessageAssembler {
    max_bit_errors: u32,
    emit_tone_only: bool,
    pending: Option<PendingPage>,
}

impl MessageAssembler {
    pub fn new(max_bit_errors: u8, emit_tone_only: bool) -> Self {
        Self {
            max_bit_errors: max_bit_errors as u32,
            emit_tone_only,
            pending: None,
        }
    }

    /// Whether a page is being collected.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed one raw codeword at position `index` (0..16) of its batch.
    ///
    /// Completed pages are appended to `out`.
    pub fn push(&mut self, raw: u32, index: usize, out: &mut Vec<PocsagMessage>) -> AssemblerEvent {
        let Some(fixed) = bch::correct(raw, self.max_bit_errors) else {
            debug!("Uncorrectable codeword {:#010x} at index {}", raw, index);
            return AssemblerEvent::Uncorrectable;
        };

        let event = if fixed.errors == 0 {
            AssemblerEvent::Clean
        } else {
            AssemblerEvent::Corrected {
                errors: fixed.errors,
            }
        };

        match Codeword::classify(fixed.codeword, (index / 2) as u8) {
            Codeword::Idle => self.flush(out),
            Codeword::Address { address, function } => {
                self.flush(out);
                self.pending = Some(PendingPage {
                    address,
                    function,
                    words: Vec::new(),
                    corrected_bits: fixed.errors,
                });
            }
            Codeword::Message { data } => match self.pending.as_mut() {
                Some(page) => {
                    page.words.push(data);
                    page.corrected_bits += fixed.errors;
                }
                None => return AssemblerEvent::Orphan,
            },
        }
        event
    }

    /// Finish the pending page, if any.
    pub fn flush(&mut self, out: &mut Vec<PocsagMessage>) {
        let Some(page) = self.pending.take() else {
            return;
        };

        if page.words.is_empty() {
            if self.emit_tone_only {
                let mut msg =
                    PocsagMessage::new(page.address, page.function, MessageKind::Tone, String::new());
                msg.corrected_bits = page.corrected_bits;
                out.push(msg);
            }
            return;
        }

        let kind = MessageKind::from_function(page.function);
        let content = if kind.is_alpha() {
            decode_alpha(&page.words)
        } else {
            decode_numeric(&page.words)
        };
        if content.is_empty() {
            debug!("Dropping empty page for address {}", page.address);
            return;
        }

        let mut msg = PocsagMessage::new(page.address, page.function, kind, content);
        msg.corrected_bits = page.corrected_bits;
        out.push(msg);
    }

    /// Drop the pending page without delivering it.
    pub fn reset(&mut self) {
        self.pending = None;
    }
}
