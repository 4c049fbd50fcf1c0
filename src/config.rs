//! Decoder configuration.
//!
//! Every field has a default, so an empty JSON object (`{}`) is a complete
//! configuration for an RTL-SDR streaming unsigned 8-bit I/Q at 240 kS/s.

use crate::error::{Error, Result};
use crate::{DEFAULT_BAUD_RATE, DEFAULT_HISTORY_CAPACITY, DEFAULT_INPUT_RATE, DEFAULT_SAMPLE_RATE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Baud rates defined by POCSAG.
pub const SUPPORTED_BAUD_RATES: [u32; 3] = [512, 1200, 2400];

/// Layout of the raw bytes handed to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    /// Interleaved unsigned 8-bit I/Q, as streamed by RTL2832U dongles.
    IqU8,
    /// Unsigned 8-bit PCM of an already FM-demodulated signal.
    PcmU8,
    /// Signed 16-bit little-endian PCM.
    PcmS16le,
    /// 32-bit little-endian float PCM.
    PcmF32le,
}

impl SampleFormat {
    /// Number of bytes forming one input frame.
    pub fn frame_size(self) -> usize {
        match self {
            SampleFormat::IqU8 => 2,
            SampleFormat::PcmU8 => 1,
            SampleFormat::PcmS16le => 2,
            SampleFormat::PcmF32le => 4,
        }
    }

    /// Whether the bytes still need FM demodulation.
    pub fn is_iq(self) -> bool {
        matches!(self, SampleFormat::IqU8)
    }
}

impl std::str::FromStr for SampleFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "iq_u8" | "cu8" => Ok(SampleFormat::IqU8),
            "pcm_u8" | "u8" => Ok(SampleFormat::PcmU8),
            "pcm_s16le" | "s16le" | "s16" => Ok(SampleFormat::PcmS16le),
            "pcm_f32le" | "f32le" | "f32" => Ok(SampleFormat::PcmF32le),
            other => Err(Error::config(format!("unknown sample format '{other}'"))),
        }
    }
}

/// Receiver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Sample rate after demodulation and decimation (Hz)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// POCSAG bit rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Raw input layout
    #[serde(default = "default_input_format")]
    pub input_format: SampleFormat,

    /// Raw input rate (Hz). Only used for I/Q input.
    #[serde(default = "default_input_rate")]
    pub input_rate: u32,

    /// Length of the preamble search window in bits
    #[serde(default = "default_preamble_bits")]
    pub preamble_bits: usize,

    /// Fraction of alternating bits the window must exceed
    #[serde(default = "default_preamble_ratio")]
    pub preamble_ratio: f32,

    /// Smoothing factor of the running |x| average
    #[serde(default = "default_average_alpha")]
    pub average_alpha: f32,

    /// Slicing threshold relative to the running average
    #[serde(default = "default_threshold_factor")]
    pub threshold_factor: f32,

    /// Bit clock loop gain; 0 keeps a free-running clock
    #[serde(default = "default_clock_recovery_gain")]
    pub clock_recovery_gain: f32,

    /// Bits searched for a sync word before the transmission is considered over
    #[serde(default = "default_sync_timeout_bits")]
    pub sync_timeout_bits: usize,

    /// Bit errors corrected per codeword (0..=2)
    #[serde(default = "default_max_bit_errors")]
    pub max_bit_errors: u8,

    /// Deliver pages carrying no message codewords
    #[serde(default)]
    pub emit_tone_only: bool,

    /// Number of messages kept in the session history
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}
fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}
fn default_input_format() -> SampleFormat {
    SampleFormat::IqU8
}
fn default_input_rate() -> u32 {
    DEFAULT_INPUT_RATE
}
fn default_preamble_bits() -> usize {
    crate::pocsag::PREAMBLE_LENGTH
}
fn default_preamble_ratio() -> f32 {
    0.9
}
fn default_average_alpha() -> f32 {
    0.01
}
fn default_threshold_factor() -> f32 {
    0.5
}
fn default_clock_recovery_gain() -> f32 {
    0.05
}
fn default_sync_timeout_bits() -> usize {
    // Two full batches
    2 * crate::pocsag::BATCH_BITS
}
fn default_max_bit_errors() -> u8 {
    1
}
fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            baud_rate: default_baud_rate(),
            input_format: default_input_format(),
            input_rate: default_input_rate(),
            preamble_bits: default_preamble_bits(),
            preamble_ratio: default_preamble_ratio(),
            average_alpha: default_average_alpha(),
            threshold_factor: default_threshold_factor(),
            clock_recovery_gain: default_clock_recovery_gain(),
            sync_timeout_bits: default_sync_timeout_bits(),
            max_bit_errors: default_max_bit_errors(),
            emit_tone_only: false,
            history_capacity: default_history_capacity(),
        }
    }
}

impl DecoderConfig {
    /// Configuration for already demodulated PCM at `sample_rate`.
    pub fn pcm(format: SampleFormat, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            input_format: format,
            input_rate: sample_rate,
            ..Default::default()
        }
    }

    /// Parse and validate a JSON document. An empty string yields the defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DecoderConfig = if json.trim().is_empty() {
            DecoderConfig::default()
        } else {
            serde_json::from_str(json)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Write the configuration as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Samples per POCSAG bit at the decoder rate.
    pub fn samples_per_bit(&self) -> f32 {
        self.sample_rate as f32 / self.baud_rate as f32
    }

    /// Effective rate of the raw input.
    pub fn effective_input_rate(&self) -> u32 {
        if self.input_format.is_iq() {
            self.input_rate
        } else {
            self.sample_rate
        }
    }

    /// Input samples averaged into one decoder sample.
    pub fn decimation(&self) -> usize {
        (self.effective_input_rate() / self.sample_rate).max(1) as usize
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_BAUD_RATES.contains(&self.baud_rate) {
            return Err(Error::UnsupportedBaudRate(self.baud_rate));
        }
        if self.sample_rate == 0 {
            return Err(Error::config("sample_rate must be positive"));
        }
        if self.samples_per_bit() < 2.0 {
            return Err(Error::config(format!(
                "sample_rate {} is too low for {} baud (need at least 2 samples per bit)",
                self.sample_rate, self.baud_rate
            )));
        }
        if self.input_format.is_iq()
            && (self.input_rate < self.sample_rate || self.input_rate % self.sample_rate != 0)
        {
            return Err(Error::config(format!(
                "input_rate {} must be a multiple of sample_rate {}",
                self.input_rate, self.sample_rate
            )));
        }
        if self.preamble_bits < 32 {
            return Err(Error::config("preamble_bits must be at least 32"));
        }
        if !(0.5..1.0).contains(&self.preamble_ratio) {
            return Err(Error::config("preamble_ratio must be within [0.5, 1.0)"));
        }
        if !(self.average_alpha > 0.0 && self.average_alpha <= 1.0) {
            return Err(Error::config("average_alpha must be within (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.clock_recovery_gain) {
            return Err(Error::config("clock_recovery_gain must be within [0, 1]"));
        }
        if self.sync_timeout_bits < 32 {
            return Err(Error::config("sync_timeout_bits must be at least 32"));
        }
        if self.max_bit_errors > 2 {
            return Err(Error::config("max_bit_errors must be 0, 1 or 2"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = DecoderConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DecoderConfig::default());
        assert_eq!(DecoderConfig::from_json_str("  ").unwrap(), config);
    }

    #[test]
    fn test_defaults_match_reference_receiver() {
        let config = DecoderConfig::default();
        assert_eq!(config.sample_rate, 24_000);
        assert_eq!(config.baud_rate, 1200);
        assert_eq!(config.samples_per_bit(), 20.0);
        assert_eq!(config.preamble_bits, 576);
        assert_eq!(config.decimation(), 10);
        assert_eq!(config.history_capacity, 100);
    }

    #[test]
    fn test_partial_json() {
        let config = DecoderConfig::from_json_str(
            r#"{"baud_rate": 512, "input_format": "pcm_s16le", "max_bit_errors": 2}"#,
        )
        .unwrap();
        assert_eq!(config.baud_rate, 512);
        assert_eq!(config.input_format, SampleFormat::PcmS16le);
        assert_eq!(config.max_bit_errors, 2);
        // PCM ignores input_rate
        assert_eq!(config.decimation(), 1);
    }

    #[test]
    fn test_rejects_unknown_baud() {
        let err = DecoderConfig::from_json_str(r#"{"baud_rate": 9600}"#).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBaudRate(9600)));
    }

    #[test]
    fn test_rejects_non_multiple_input_rate() {
        let err = DecoderConfig::from_json_str(r#"{"input_rate": 250000}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_low_sample_rate() {
        let config = DecoderConfig {
            sample_rate: 2400,
            baud_rate: 2400,
            input_format: SampleFormat::PcmF32le,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = DecoderConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_sample_format_from_str() {
        assert_eq!("iq-u8".parse::<SampleFormat>().unwrap(), SampleFormat::IqU8);
        assert_eq!("S16LE".parse::<SampleFormat>().unwrap(), SampleFormat::PcmS16le);
        assert_eq!("f32".parse::<SampleFormat>().unwrap(), SampleFormat::PcmF32le);
        assert!("wav".parse::<SampleFormat>().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decoder.json");
        let config = DecoderConfig {
            emit_tone_only: true,
            ..DecoderConfig::pcm(SampleFormat::PcmS16le, 48_000)
        };
        config.save(&path).unwrap();
        assert_eq!(DecoderConfig::load(&path).unwrap(), config);
    }
}
