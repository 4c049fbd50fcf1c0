//! POCSAG receive state machine.
//!
//! ```text
//!   SearchingPreamble --(alternating bits)--> SearchingSync
//!   SearchingSync --(sync word)--> ReceivingBatch --(16 codewords)--> SearchingSync
//!   SearchingSync --(timeout)--> SearchingPreamble
//! ```

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info};

use super::assembler::{AssemblerEvent, MessageAssembler};
use super::codeword::SYNC_WORD;
use super::message::PocsagMessage;
use super::slicer::BitSlicer;
use super::{BATCH_SIZE, CODEWORD_SIZE};
use crate::config::DecoderConfig;

/// Receiver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecoderState {
    SearchingPreamble,
    SearchingSync,
    ReceivingBatch,
}

/// Counters maintained by the decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecoderStats {
    pub samples: u64,
    pub bits: u64,
    pub preambles: u64,
    pub syncs: u64,
    pub inverted_syncs: u64,
    pub sync_timeouts: u64,
    pub batches: u64,
    pub codewords_clean: u64,
    pub codewords_corrected: u64,
    pub codewords_uncorrectable: u64,
    pub codewords_orphaned: u64,
    pub messages: u64,
}

/// Sliding window counting transitions between neighbouring bits.
#[derive(Debug)]
struct PreambleWindow {
    bits: VecDeque<bool>,
    capacity: usize,
    alternations: usize,
}

impl PreambleWindow {
    fn new(capacity: usize) -> Self {
        Self {
            bits: VecDeque::with_capacity(capacity),
            capacity,
            alternations: 0,
        }
    }

    fn push(&mut self, bit: bool) {
        if let Some(&last) = self.bits.back() {
            if last != bit {
                self.alternations += 1;
            }
        }
        self.bits.push_back(bit);
        if self.bits.len() > self.capacity {
            if let Some(first) = self.bits.pop_front() {
                if self.bits.front().is_some_and(|&next| next != first) {
                    self.alternations -= 1;
                }
            }
        }
    }

    fn clear(&mut self) {
        self.bits.clear();
        self.alternations = 0;
    }
}

/// Samples-in, pages-out POCSAG decoder.
#[derive(Debug)]
pub struct PocsagDecoder {
    slicer: BitSlicer,
    assembler: MessageAssembler,
    state: DecoderState,

    preamble: PreambleWindow,
    preamble_threshold: f32,

    /// Last 32 bits, newest in bit 0.
    shift: u32,
    shift_len: usize,
    inverted: bool,
    /// The next 32 bits are where the following batch's sync word belongs.
    sync_expected: bool,
    max_sync_errors: u32,
    bits_since_sync: usize,
    sync_timeout_bits: usize,
    batch_index: usize,

    stats: DecoderStats,
}

impl PocsagDecoder {
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            slicer: BitSlicer::new(config),
            assembler: MessageAssembler::new(config.max_bit_errors, config.emit_tone_only),
            state: DecoderState::SearchingPreamble,
            preamble: PreambleWindow::new(config.preamble_bits),
            preamble_threshold: config.preamble_bits as f32 * config.preamble_ratio,
            shift: 0,
            shift_len: 0,
            inverted: false,
            sync_expected: false,
            max_sync_errors: config.max_bit_errors as u32,
            bits_since_sync: 0,
            sync_timeout_bits: config.sync_timeout_bits,
            batch_index: 0,
            stats: DecoderStats::default(),
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    /// Whether the current transmission was received with inverted polarity.
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Feed demodulated samples; returns the pages completed by them.
    pub fn process_samples(&mut self, samples: &[f32]) -> Vec<PocsagMessage> {
        let mut out = Vec::new();
        self.stats.samples += samples.len() as u64;
        for &sample in samples {
            if let Some(bit) = self.slicer.push(sample) {
                self.process_bit(bit, &mut out);
            }
        }
        out
    }

    /// Feed already sliced bits; returns the pages completed by them.
    pub fn process_bits(&mut self, bits: &[bool]) -> Vec<PocsagMessage> {
        let mut out = Vec::new();
        for &bit in bits {
            self.process_bit(bit, &mut out);
        }
        out
    }

    /// Deliver any page still being collected (end of stream).
    pub fn finish(&mut self) -> Vec<PocsagMessage> {
        let mut out = Vec::new();
        self.assembler.flush(&mut out);
        self.stats.messages += out.len() as u64;
        out
    }

    /// Return to preamble search, dropping partial pages and timing state.
    pub fn reset(&mut self) {
        self.slicer.reset();
        self.assembler.reset();
        self.enter_preamble_search();
    }

    fn process_bit(&mut self, bit: bool, out: &mut Vec<PocsagMessage>) {
        self.stats.bits += 1;
        let delivered = out.len();

        match self.state {
            DecoderState::SearchingPreamble => self.search_preamble(bit),
            DecoderState::SearchingSync => self.search_sync(bit, out),
            DecoderState::ReceivingBatch => self.receive_batch(bit, out),
        }

        self.stats.messages += (out.len() - delivered) as u64;
    }

    fn search_preamble(&mut self, bit: bool) {
        self.preamble.push(bit);
        if self.preamble.alternations as f32 > self.preamble_threshold {
            debug!(
                "Preamble detected ({} alternations in {} bits)",
                self.preamble.alternations, self.preamble.capacity
            );
            self.stats.preambles += 1;
            self.preamble.clear();
            self.enter_sync_search();
        }
    }

    fn search_sync(&mut self, bit: bool, out: &mut Vec<PocsagMessage>) {
        self.shift = (self.shift << 1) | bit as u32;
        self.shift_len = (self.shift_len + 1).min(CODEWORD_SIZE);
        self.bits_since_sync += 1;

        if self.shift_len == CODEWORD_SIZE && self.sync_expected {
            self.sync_expected = false;
            let errors = (self.shift ^ SYNC_WORD).count_ones();
            if errors <= self.max_sync_errors {
                if errors > 0 {
                    debug!("Sync word accepted with {} bit error(s)", errors);
                }
                self.start_batch(false);
                return;
            }
            if 32 - errors <= self.max_sync_errors {
                self.start_batch(true);
                return;
            }
            // A page never continues across a lost batch
            debug!("Sync word missing after batch, flushing pending page");
            self.assembler.flush(out);
        }

        if self.shift_len == CODEWORD_SIZE {
            if self.shift == SYNC_WORD {
                self.start_batch(false);
                return;
            }
            if !self.shift == SYNC_WORD {
                self.start_batch(true);
                return;
            }
        }

        if self.bits_since_sync > self.sync_timeout_bits {
            debug!("No sync word within {} bits", self.sync_timeout_bits);
            self.stats.sync_timeouts += 1;
            self.assembler.flush(out);
            self.enter_preamble_search();
        }
    }

    fn receive_batch(&mut self, bit: bool, out: &mut Vec<PocsagMessage>) {
        let bit = bit ^ self.inverted;
        self.shift = (self.shift << 1) | bit as u32;
        self.shift_len += 1;
        if self.shift_len < CODEWORD_SIZE {
            return;
        }

        let word = self.shift;
        self.shift = 0;
        self.shift_len = 0;

        match self.assembler.push(word, self.batch_index, out) {
            AssemblerEvent::Clean => self.stats.codewords_clean += 1,
            AssemblerEvent::Corrected { .. } => self.stats.codewords_corrected += 1,
            AssemblerEvent::Uncorrectable => self.stats.codewords_uncorrectable += 1,
            AssemblerEvent::Orphan => self.stats.codewords_orphaned += 1,
        }

        self.batch_index += 1;
        if self.batch_index >= BATCH_SIZE {
            self.stats.batches += 1;
            self.enter_sync_search();
            self.sync_expected = true;
        }
    }

    fn start_batch(&mut self, inverted: bool) {
        if inverted {
            self.stats.inverted_syncs += 1;
        } else {
            self.stats.syncs += 1;
        }
        if inverted != self.inverted {
            info!(
                "Sync word found with {} polarity",
                if inverted { "inverted" } else { "normal" }
            );
        }
        self.inverted = inverted;
        self.state = DecoderState::ReceivingBatch;
        self.shift = 0;
        self.shift_len = 0;
        self.batch_index = 0;
    }

    fn enter_sync_search(&mut self) {
        self.state = DecoderState::SearchingSync;
        self.sync_expected = false;
        self.shift = 0;
        self.shift_len = 0;
        self.bits_since_sync = 0;
    }

    fn enter_preamble_search(&mut self) {
        self.state = DecoderState::SearchingPreamble;
        self.sync_expected = false;
        self.preamble.clear();
        self.shift = 0;
        self.shift_len = 0;
        self.bits_since_sync = 0;
        self.batch_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SampleFormat;
    use crate::pocsag::encoder::Transmission;
    use crate::pocsag::message::MessageKind;
    use crate::pocsag::{BATCH_BITS, PREAMBLE_LENGTH};

    fn config() -> DecoderConfig {
        DecoderConfig::pcm(SampleFormat::PcmF32le, 24_000)
    }

    #[test]
    fn test_preamble_window_counts_alternations() {
        let mut window = PreambleWindow::new(8);
        for i in 0..8 {
            window.push(i % 2 == 0);
        }
        assert_eq!(window.alternations, 7);
        // Oldest bit falls out, new bit repeats the last one
        window.push(false);
        assert_eq!(window.alternations, 6);
        assert_eq!(window.bits.len(), 8);
    }

    #[test]
    fn test_decodes_numeric_page_from_bits() {
        let bits = Transmission::new().numeric(1_234_567, "5551234").to_bits();
        let mut decoder = PocsagDecoder::new(&config());
        let mut out = decoder.process_bits(&bits);
        out.extend(decoder.finish());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].address, 1_234_567);
        assert_eq!(out[0].kind, MessageKind::Numeric);
        assert_eq!(out[0].content, "5551234");
        assert_eq!(decoder.stats().preambles, 1);
        // Frame 7 pushes the payload into a second batch
        assert_eq!(decoder.stats().syncs, 2);
        assert_eq!(decoder.stats().batches, 2);
        assert_eq!(decoder.stats().codewords_uncorrectable, 0);
    }

    #[test]
    fn test_inverted_polarity() {
        let bits: Vec<bool> = Transmission::new()
            .alpha(42, 3, "inverted")
            .to_bits()
            .into_iter()
            .map(|b| !b)
            .collect();
        let mut decoder = PocsagDecoder::new(&config());
        let out = decoder.process_bits(&bits);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content, "inverted");
        assert!(decoder.is_inverted());
        assert_eq!(decoder.stats().inverted_syncs, 1);
    }

    #[test]
    fn test_sync_timeout_returns_to_preamble() {
        let mut bits: Vec<bool> = (0..PREAMBLE_LENGTH).map(|i| i % 2 == 0).collect();
        bits.extend(std::iter::repeat(false).take(2 * BATCH_BITS + 1));
        let mut decoder = PocsagDecoder::new(&config());
        decoder.process_bits(&bits);
        assert_eq!(decoder.state(), DecoderState::SearchingPreamble);
        assert_eq!(decoder.stats().sync_timeouts, 1);
    }

    #[test]
    fn test_noise_produces_nothing() {
        let bits: Vec<bool> = (0..5000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 7) & 1 == 1).collect();
        let mut decoder = PocsagDecoder::new(&config());
        assert!(decoder.process_bits(&bits).is_empty());
        assert_eq!(decoder.stats().syncs, 0);
    }

    const LONG_TEXT: &str =
        "0123456789 abcdefghij ABCDEFGHIJ 0123456789 klmnopqrst KLMNOPQRST 0123456789 uvwxyz UVWXYZ 9876543210";

    /// Three-batch page with `errors` bits flipped in the second sync word.
    fn damaged_second_sync(errors: usize) -> Vec<bool> {
        let mut bits = Transmission::new().alpha(8, 3, LONG_TEXT).to_bits();
        assert!(bits.len() >= PREAMBLE_LENGTH + 3 * BATCH_BITS);
        let sync = PREAMBLE_LENGTH + BATCH_BITS;
        for i in 0..errors {
            bits[sync + 3 + 7 * i] = !bits[sync + 3 + 7 * i];
        }
        bits
    }

    #[test]
    fn test_damaged_sync_between_batches_is_tolerated() {
        let mut decoder = PocsagDecoder::new(&config());
        let mut out = decoder.process_bits(&damaged_second_sync(1));
        out.extend(decoder.finish());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content, LONG_TEXT);
        assert_eq!(decoder.stats().syncs, 3);
        assert_eq!(decoder.stats().batches, 3);
    }

    #[test]
    fn test_lost_sync_flushes_instead_of_splicing() {
        let config = DecoderConfig {
            max_bit_errors: 0,
            ..config()
        };
        let mut decoder = PocsagDecoder::new(&config);
        let mut out = decoder.process_bits(&damaged_second_sync(1));
        out.extend(decoder.finish());

        // Only the first batch's fifteen message codewords are kept
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].address, 8);
        assert!(LONG_TEXT.starts_with(out[0].content.as_str()), "{}", out[0].content);
        assert_eq!(out[0].content.len(), 42);
    }

    #[test]
    fn test_sync_beyond_tolerance_is_not_accepted() {
        let mut decoder = PocsagDecoder::new(&config());
        let mut out = decoder.process_bits(&damaged_second_sync(2));
        out.extend(decoder.finish());

        assert!(!out.is_empty());
        for page in &out {
            assert!(LONG_TEXT.starts_with(page.content.as_str()), "{}", page.content);
            assert!(page.content.len() < LONG_TEXT.len());
        }
    }

    #[test]
    fn test_reset_drops_partial_page() {
        let bits = Transmission::new().alpha(8, 3, "partial").to_bits();
        let mut decoder = PocsagDecoder::new(&config());
        // Sync, two idles, then the frame 1 address codeword
        decoder.process_bits(&bits[..PREAMBLE_LENGTH + 32 * 4]);
        decoder.reset();
        assert_eq!(decoder.state(), DecoderState::SearchingPreamble);
        assert!(decoder.finish().is_empty());
    }
}
