//! Codeword layout and classification.
//!
//! ```text
//! address: 0 | address[17:0] (30..13) | function (12..11) | BCH (10..1) | P
//! message: 1 | data[19:0]    (30..11)                      | BCH (10..1) | P
//! ```

use super::bch;

/// Frame synchronisation codeword, first codeword of every batch.
pub const SYNC_WORD: u32 = 0x7CD2_15D8;

/// Idle codeword, fills unused frame slots.
pub const IDLE_WORD: u32 = 0x7A89_C197;

/// Flag bit distinguishing message (1) from address (0) codewords.
pub const MESSAGE_FLAG: u32 = 0x8000_0000;

/// Mask of the 20 message data bits once shifted down.
pub const DATA_MASK: u32 = 0xF_FFFF;

/// A codeword after error correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codeword {
    /// Idle filler.
    Idle,
    /// Address codeword; `address` is the full 21-bit RIC including the frame.
    Address { address: u32, function: u8 },
    /// Message codeword carrying 20 data bits.
    Message { data: u32 },
}

impl Codeword {
    /// Classify a codeword received in frame `frame` (0..8).
    pub fn classify(word: u32, frame: u8) -> Self {
        if word == IDLE_WORD {
            return Codeword::Idle;
        }
        if word & MESSAGE_FLAG != 0 {
            Codeword::Message {
                data: (word >> 11) & DATA_MASK,
            }
        } else {
            let high = (word >> 13) & 0x3FFFF;
            Codeword::Address {
                address: (high << 3) | (frame as u32 & 0x7),
                function: ((word >> 11) & 0x3) as u8,
            }
        }
    }

    /// Build a valid address codeword. Only the top 18 bits of `address` are sent.
    pub fn address_word(address: u32, function: u8) -> u32 {
        let high = (address >> 3) & 0x3FFFF;
        bch::encode((high << 13) | ((function as u32 & 0x3) << 11))
    }

    /// Build a valid message codeword from 20 data bits.
    pub fn message_word(data: u32) -> u32 {
        bch::encode(MESSAGE_FLAG | ((data & DATA_MASK) << 11))
    }

    pub fn is_address(&self) -> bool {
        matches!(self, Codeword::Address { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_is_not_an_address() {
        assert_eq!(Codeword::classify(IDLE_WORD, 3), Codeword::Idle);
    }

    #[test]
    fn test_address_layout() {
        let word = Codeword::address_word(1_234_567, 2);
        assert!(bch::is_valid(word));
        assert_eq!(word & MESSAGE_FLAG, 0);
        // 1234567 = 0b100101101011010000111, frame = 0b111
        assert_eq!(
            Codeword::classify(word, 7),
            Codeword::Address {
                address: 1_234_567,
                function: 2
            }
        );
    }

    #[test]
    fn test_frame_supplies_low_address_bits() {
        let word = Codeword::address_word(0x1F_FFF8, 0);
        match Codeword::classify(word, 5) {
            Codeword::Address { address, .. } => assert_eq!(address, 0x1F_FFFD),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_message_layout() {
        let word = Codeword::message_word(0xABCDE);
        assert!(bch::is_valid(word));
        assert_eq!(Codeword::classify(word, 0), Codeword::Message { data: 0xABCDE });
    }
}
