//! Baseband and I/Q synthesis, the inverse of [`super::convert`].

use std::f32::consts::PI;

/// NRZ waveform: `1` bits at `+amplitude`, `0` bits at `-amplitude`.
///
/// `samples_per_bit` may be fractional; each sample takes the bit covering
/// its centre.
pub fn nrz(bits: &[bool], samples_per_bit: f32, amplitude: f32) -> Vec<f32> {
    if bits.is_empty() {
        return Vec::new();
    }
    let total = (bits.len() as f32 * samples_per_bit).round() as usize;
    (0..total)
        .map(|n| {
            let index = (((n as f32 + 0.5) / samples_per_bit) as usize).min(bits.len() - 1);
            if bits[index] {
                amplitude
            } else {
                -amplitude
            }
        })
        .collect()
}

/// Samples as unsigned 8-bit PCM.
pub fn to_pcm_u8(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 127.0 + 128.0).round() as u8)
        .collect()
}

/// Samples as signed 16-bit little-endian PCM.
pub fn to_pcm_s16le(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&s| ((s.clamp(-1.0, 1.0) * 32767.0).round() as i16).to_le_bytes())
        .collect()
}

/// Samples as 32-bit little-endian float PCM.
pub fn to_pcm_f32le(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Frequency modulate baseband samples into interleaved unsigned 8-bit I/Q.
///
/// A sample of `1.0` shifts the carrier by `deviation_hz`.
pub fn fm_iq_u8(samples: &[f32], deviation_hz: f32, sample_rate: u32) -> Vec<u8> {
    let step = 2.0 * PI * deviation_hz / sample_rate as f32;
    let mut phase = 0.0f32;
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        phase = (phase + step * s) % (2.0 * PI);
        out.push((127.5 + 120.0 * phase.cos()).round() as u8);
        out.push((127.5 + 120.0 * phase.sin()).round() as u8);
    }
    out
}
