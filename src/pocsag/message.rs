//! Decoded pages and the numeric / alphanumeric payload codecs.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use super::codeword::DATA_MASK;

/// Numeric character set, indexed by the (bit-reversed) BCD nibble.
const NUMERIC_CHARSET: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '*', 'U', ' ', '-', ')', '(',
];

/// Alphanumeric control characters ending a message.
const NUL: u8 = 0x00;
const ETX: u8 = 0x03;
const EOT: u8 = 0x04;

/// How a page's payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Numeric,
    Alpha1,
    Alpha2,
    Alpha3,
    /// Address only, no payload.
    Tone,
}

impl MessageKind {
    /// Payload interpretation for a function code (0 numeric, 1..=3 alphanumeric).
    pub fn from_function(function: u8) -> Self {
        match function & 0x3 {
            0 => MessageKind::Numeric,
            1 => MessageKind::Alpha1,
            2 => MessageKind::Alpha2,
            _ => MessageKind::Alpha3,
        }
    }

    /// Short label shown next to each message.
    pub fn label(self) -> &'static str {
        match self {
            MessageKind::Numeric => "NUM",
            MessageKind::Alpha1 => "TXT1",
            MessageKind::Alpha2 => "TXT2",
            MessageKind::Alpha3 => "TXT3",
            MessageKind::Tone => "TONE",
        }
    }

    pub fn is_alpha(self) -> bool {
        matches!(
            self,
            MessageKind::Alpha1 | MessageKind::Alpha2 | MessageKind::Alpha3
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A decoded page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PocsagMessage {
    /// 21-bit receiver identity code.
    pub address: u32,
    /// Function bits of the address codeword.
    pub function: u8,
    pub kind: MessageKind,
    pub content: String,
    /// Seconds since the Unix epoch at delivery.
    pub received_at: u64,
    /// Bit errors repaired across the page's codewords.
    pub corrected_bits: u32,
}

impl PocsagMessage {
    pub fn new(address: u32, function: u8, kind: MessageKind, content: String) -> Self {
        let received_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            address,
            function,
            kind,
            content,
            received_at,
            corrected_bits: 0,
        }
    }

    /// Address as seven zero-padded decimal digits.
    pub fn address_label(&self) -> String {
        format!("{:07}", self.address & 0x1F_FFFF)
    }

    /// Receive time as `HH:MM:SS` in the local time zone.
    pub fn time_label(&self) -> String {
        self.time_label_in(&Local)
    }

    /// Receive time as `HH:MM:SS` in `tz`.
    pub fn time_label_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: fmt::Display,
    {
        match DateTime::<Utc>::from_timestamp(self.received_at as i64, 0) {
            Some(utc) => utc.with_timezone(tz).format("%H:%M:%S").to_string(),
            None => "--:--:--".to_string(),
        }
    }
}

impl fmt::Display for PocsagMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}: {}",
            self.time_label(),
            self.address_label(),
            self.kind,
            self.content
        )
    }
}

/// Reverse the low `width` bits of `value`.
#[inline]
fn reverse_bits(value: u32, width: u32) -> u32 {
    value.reverse_bits() >> (32 - width)
}

/// Decode the 20-bit payloads of a numeric page.
pub fn decode_numeric(words: &[u32]) -> String {
    let mut text = String::with_capacity(words.len() * 5);
    for &data in words {
        for i in 0..5 {
            let nibble = (data >> (16 - i * 4)) & 0xF;
            text.push(NUMERIC_CHARSET[reverse_bits(nibble, 4) as usize]);
        }
    }
    text.trim().to_string()
}

/// Decode the 20-bit payloads of an alphanumeric page.
pub fn decode_alpha(words: &[u32]) -> String {
    let mut text = String::new();
    let mut acc: u64 = 0;
    let mut bits = 0u32;

    'words: for &data in words {
        acc = (acc << 20) | (data & DATA_MASK) as u64;
        bits += 20;
        while bits >= 7 {
            let raw = ((acc >> (bits - 7)) & 0x7F) as u32;
            bits -= 7;
            let ch = reverse_bits(raw, 7) as u8;
            match ch {
                NUL | ETX | EOT => break 'words,
                32..=126 => text.push(ch as char),
                _ => {}
            }
        }
        acc &= (1u64 << bits) - 1;
    }
    text.trim().to_string()
}

/// Encode digits and the numeric symbols into 20-bit payloads, space padded.
///
/// Characters outside the numeric set are sent as spaces.
pub fn encode_numeric(text: &str) -> Vec<u32> {
    let mut nibbles: Vec<u32> = text
        .chars()
        .map(|c| NUMERIC_CHARSET.iter().position(|&n| n == c).unwrap_or(0xC) as u32)
        .collect();
    while nibbles.len() % 5 != 0 {
        nibbles.push(0xC);
    }
    nibbles
        .chunks(5)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u32, |acc, &n| (acc << 4) | reverse_bits(n, 4))
        })
        .collect()
}

/// Encode ASCII text into 20-bit payloads, terminated by EOT and zero padded.
pub fn encode_alpha(text: &str) -> Vec<u32> {
    let mut bits: Vec<bool> = Vec::with_capacity((text.len() + 1) * 7);
    for byte in text.bytes().chain(std::iter::once(EOT)) {
        for i in 0..7 {
            bits.push(byte >> i & 1 == 1);
        }
    }
    while bits.len() % 20 != 0 {
        bits.push(false);
    }
    bits.chunks(20)
        .map(|chunk| chunk.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32))
        .collect()
}
