//! Raw byte formats to `f32` samples.

use super::fm::{Decimator, FmDiscriminator};
use crate::config::{DecoderConfig, SampleFormat};

/// Stateful byte-to-sample converter.
///
/// Bytes that do not complete a frame are kept until the next call, so the
/// way a stream is split into blocks never changes the output.
#[derive(Debug, Clone)]
pub struct SampleConverter {
    format: SampleFormat,
    carry: Vec<u8>,
    discriminator: FmDiscriminator,
    decimator: Decimator,
}

impl SampleConverter {
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            format: config.input_format,
            carry: Vec::with_capacity(4),
            discriminator: FmDiscriminator::new(),
            decimator: Decimator::new(config.decimation()),
        }
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Bytes held back from the previous call.
    pub fn pending_bytes(&self) -> usize {
        self.carry.len()
    }

    /// Convert `bytes`, appending decoder-rate samples to `out`.
    pub fn convert(&mut self, bytes: &[u8], out: &mut Vec<f32>) {
        let frame = self.format.frame_size();
        let mut input = bytes;

        if !self.carry.is_empty() {
            let take = (frame - self.carry.len()).min(input.len());
            self.carry.extend_from_slice(&input[..take]);
            input = &input[take..];
            if self.carry.len() < frame {
                return;
            }
            let carried = std::mem::take(&mut self.carry);
            self.push_frame(&carried, out);
        }

        let mut frames = input.chunks_exact(frame);
        for f in &mut frames {
            self.push_frame(f, out);
        }
        self.carry.extend_from_slice(frames.remainder());
    }

    #[inline]
    fn push_frame(&mut self, frame: &[u8], out: &mut Vec<f32>) {
        let sample = match self.format {
            SampleFormat::IqU8 => {
                let i = (frame[0] as f32 - 127.5) / 127.5;
                let q = (frame[1] as f32 - 127.5) / 127.5;
                self.discriminator.push(i, q)
            }
            SampleFormat::PcmU8 => (frame[0] as f32 - 128.0) / 128.0,
            SampleFormat::PcmS16le => i16::from_le_bytes([frame[0], frame[1]]) as f32 / 32768.0,
            SampleFormat::PcmF32le => f32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]),
        };
        if let Some(s) = self.decimator.push(sample) {
            out.push(s);
        }
    }

    /// Drop carried bytes and filter state.
    pub fn reset(&mut self) {
        self.carry.clear();
        self.discriminator.reset();
        self.decimator.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter(format: SampleFormat) -> SampleConverter {
        SampleConverter::new(&DecoderConfig::pcm(format, 24_000))
    }

    #[test]
    fn test_pcm_u8() {
        let mut conv = converter(SampleFormat::PcmU8);
        let mut out = Vec::new();
        conv.convert(&[0, 128, 192], &mut out);
        assert_eq!(out, vec![-1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_pcm_s16le_carries_odd_byte() {
        let bytes: Vec<u8> = [16384i16, -32768, 1]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();

        let mut conv = converter(SampleFormat::PcmS16le);
        let mut out = Vec::new();
        conv.convert(&bytes[..3], &mut out);
        assert_eq!(out, vec![0.5]);
        assert_eq!(conv.pending_bytes(), 1);
        conv.convert(&bytes[3..], &mut out);
        assert_eq!(out, vec![0.5, -1.0, 1.0 / 32768.0]);
        assert_eq!(conv.pending_bytes(), 0);
    }

    #[test]
    fn test_f32_split_one_byte_at_a_time() {
        let bytes: Vec<u8> = [0.25f32, -0.75].iter().flat_map(|s| s.to_le_bytes()).collect();
        let mut conv = converter(SampleFormat::PcmF32le);
        let mut out = Vec::new();
        for b in &bytes {
            conv.convert(std::slice::from_ref(b), &mut out);
        }
        assert_eq!(out, vec![0.25, -0.75]);
    }

    #[test]
    fn test_iq_is_demodulated_and_decimated() {
        let config = DecoderConfig::default();
        let mut conv = SampleConverter::new(&config);
        // Constant carrier: discriminator output stays near zero
        let bytes: Vec<u8> = (0..config.decimation() * 8).flat_map(|_| [255u8, 128]).collect();
        let mut out = Vec::new();
        conv.convert(&bytes, &mut out);
        assert_eq!(out.len(), 8);
        assert!(out.iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn test_reset_drops_carry() {
        let mut conv = converter(SampleFormat::PcmS16le);
        let mut out = Vec::new();
        conv.convert(&[1], &mut out);
        conv.reset();
        conv.convert(&[0, 0x40], &mut out);
        assert_eq!(out, vec![0.5]);
    }
}
