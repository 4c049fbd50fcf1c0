//! BCH(31,21) with an even parity bit.
//!
//! Bits 31..1 of a codeword form a BCH(31,21) code word with generator
//! `x^10 + x^9 + x^8 + x^6 + x^5 + x^3 + 1`; bit 0 makes the popcount of all
//! 32 bits even. The code corrects up to two bit errors; with the parity bit,
//! a third error in the parity position is detected.

use std::sync::OnceLock;

/// Generator polynomial, x^10 at bit 10.
const GENERATOR: u32 = 0x769;

/// Check bits occupy the low 10 bits of the 31-bit BCH word.
const CHECK_MASK: u32 = 0x3FF;

/// Outcome of a successful correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corrected {
    /// The repaired codeword.
    pub codeword: u32,
    /// Number of bits that were flipped (0 if the input was clean).
    pub errors: u32,
}

/// Polynomial remainder of a 31-bit value modulo the generator.
fn remainder(mut value: u32) -> u32 {
    for bit in (10..31).rev() {
        if value & (1 << bit) != 0 {
            value ^= GENERATOR << (bit - 10);
        }
    }
    value & CHECK_MASK
}

/// BCH syndrome of a 32-bit codeword (parity bit excluded).
#[inline]
pub fn syndrome(codeword: u32) -> u32 {
    remainder(codeword >> 1)
}

/// Whether the popcount of all 32 bits is even.
#[inline]
pub fn parity_ok(codeword: u32) -> bool {
    codeword.count_ones() % 2 == 0
}

/// Whether a codeword is error free.
#[inline]
pub fn is_valid(codeword: u32) -> bool {
    syndrome(codeword) == 0 && parity_ok(codeword)
}

/// Fill in check bits and parity for the 21 information bits (31..11).
pub fn encode(codeword: u32) -> u32 {
    let info = (codeword >> 1) & !CHECK_MASK;
    let word = (info | remainder(info)) << 1;
    if parity_ok(word) {
        word
    } else {
        word | 1
    }
}

/// Syndrome -> error pattern (over the 31-bit BCH word) for every 1- and 2-bit error.
fn error_table() -> &'static [u32; 1024] {
    static TABLE: OnceLock<[u32; 1024]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u32; 1024];
        for i in 0..31 {
            let single = 1u32 << i;
            table[remainder(single) as usize] = single;
            for j in (i + 1)..31 {
                let double = single | (1u32 << j);
                table[remainder(double) as usize] = double;
            }
        }
        table
    })
}

/// Try to repair a codeword flipping at most `max_errors` bits (0..=2).
///
/// Returns `None` when the codeword cannot be repaired within the bound.
pub fn correct(codeword: u32, max_errors: u32) -> Option<Corrected> {
    let syn = syndrome(codeword);
    let (repaired, mut errors) = if syn == 0 {
        (codeword, 0)
    } else {
        let pattern = error_table()[syn as usize];
        if pattern == 0 {
            return None;
        }
        (codeword ^ (pattern << 1), pattern.count_ones())
    };

    let repaired = if parity_ok(repaired) {
        repaired
    } else {
        errors += 1;
        repaired ^ 1
    };

    if errors > max_errors {
        return None;
    }
    Some(Corrected {
        codeword: repaired,
        errors,
    })
}
