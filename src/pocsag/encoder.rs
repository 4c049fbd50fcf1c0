//! Transmission builder, used by the `synth` command and in tests.

use super::codeword::{Codeword, IDLE_WORD, SYNC_WORD};
use super::message::{encode_alpha, encode_numeric, MessageKind};
use super::{BATCH_SIZE, CODEWORD_SIZE, PREAMBLE_LENGTH};

/// One page to transmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub address: u32,
    pub function: u8,
    pub content: String,
}

impl Page {
    fn payload(&self) -> Vec<u32> {
        if self.content.is_empty() {
            return Vec::new();
        }
        match MessageKind::from_function(self.function) {
            MessageKind::Numeric => encode_numeric(&self.content),
            _ => encode_alpha(&self.content),
        }
    }
}

/// A preamble followed by batches carrying one or more pages.
#[derive(Debug, Clone, Default)]
pub struct Transmission {
    pages: Vec<Page>,
}

impl Transmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    /// Add a numeric page (function 0).
    pub fn numeric(self, address: u32, digits: &str) -> Self {
        self.page(Page {
            address,
            function: 0,
            content: digits.to_string(),
        })
    }

    /// Add an alphanumeric page with the given function bits.
    pub fn alpha(self, address: u32, function: u8, text: &str) -> Self {
        self.page(Page {
            address,
            function,
            content: text.to_string(),
        })
    }

    /// Codewords after the preamble, sync words included.
    pub fn codewords(&self) -> Vec<u32> {
        // Slots inside batches, excluding sync words
        let mut slots: Vec<u32> = Vec::new();
        for page in &self.pages {
            let frame = (page.address & 0x7) as usize;
            // Each address must start in its own frame
            while slots.len() % BATCH_SIZE != frame * 2 {
                slots.push(IDLE_WORD);
            }
            slots.push(Codeword::address_word(page.address, page.function));
            slots.extend(page.payload().into_iter().map(Codeword::message_word));
        }
        // Terminate the last page, then fill the batch
        slots.push(IDLE_WORD);
        while slots.len() % BATCH_SIZE != 0 {
            slots.push(IDLE_WORD);
        }

        let mut words = Vec::with_capacity(slots.len() + slots.len() / BATCH_SIZE);
        for batch in slots.chunks(BATCH_SIZE) {
            words.push(SYNC_WORD);
            words.extend_from_slice(batch);
        }
        words
    }

    /// Full bit stream, most significant bit of each codeword first.
    pub fn to_bits(&self) -> Vec<bool> {
        let words = self.codewords();
        let mut bits = Vec::with_capacity(PREAMBLE_LENGTH + words.len() * CODEWORD_SIZE);
        bits.extend((0..PREAMBLE_LENGTH).map(|i| i % 2 == 0));
        for word in words {
            bits.extend((0..CODEWORD_SIZE).rev().map(|i| (word >> i) & 1 == 1));
        }
        bits
    }
}
