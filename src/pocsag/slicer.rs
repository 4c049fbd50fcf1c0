//! Sample-to-bit slicer.
//!
//! The slicing threshold follows a running average of `|x|`, so the slicer
//! adapts to the receiver gain. Samples are integrated over one bit period;
//! level transitions pull the bit boundary towards them (first-order DPLL).

use crate::config::DecoderConfig;

/// Bit slicer state.
#[derive(Debug, Clone)]
pub struct BitSlicer {
    samples_per_bit: f32,
    average_alpha: f32,
    threshold_factor: f32,
    gain: f32,

    running_average: f32,
    threshold: f32,
    /// Samples elapsed since the last bit boundary.
    phase: f32,
    sum: f32,
    count: u32,
    last_level: bool,
}

impl BitSlicer {
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            samples_per_bit: config.samples_per_bit(),
            average_alpha: config.average_alpha,
            threshold_factor: config.threshold_factor,
            gain: config.clock_recovery_gain,
            running_average: 0.0,
            threshold: 0.0,
            phase: 0.0,
            sum: 0.0,
            count: 0,
            last_level: false,
        }
    }

    /// Current slicing threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Feed one sample; returns a bit when a bit period completes.
    #[inline]
    pub fn push(&mut self, sample: f32) -> Option<bool> {
        self.running_average =
            self.running_average * (1.0 - self.average_alpha) + sample.abs() * self.average_alpha;
        self.threshold = self.running_average * self.threshold_factor;

        let level = sample > self.threshold;
        if level != self.last_level && self.gain > 0.0 {
            // Transitions belong on the boundary (phase 0)
            let half = self.samples_per_bit / 2.0;
            let error = if self.phase < half {
                self.phase
            } else {
                self.phase - self.samples_per_bit
            };
            self.phase -= self.gain * error;
        }
        self.last_level = level;

        self.sum += sample;
        self.count += 1;
        self.phase += 1.0;

        if self.phase >= self.samples_per_bit {
            self.phase -= self.samples_per_bit;
            let mean = self.sum / self.count as f32;
            self.sum = 0.0;
            self.count = 0;
            Some(mean > self.threshold)
        } else {
            None
        }
    }

    /// Feed a block of samples, appending completed bits.
    pub fn push_all(&mut self, samples: &[f32], bits: &mut Vec<bool>) {
        for &s in samples {
            if let Some(bit) = self.push(s) {
                bits.push(bit);
            }
        }
    }

    /// Forget averaging and timing state.
    pub fn reset(&mut self) {
        self.running_average = 0.0;
        self.threshold = 0.0;
        self.phase = 0.0;
        self.sum = 0.0;
        self.count = 0;
        self.last_level = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SampleFormat;
    use crate::dsp::synth::nrz;

    fn config(gain: f32) -> DecoderConfig {
        DecoderConfig {
            clock_recovery_gain: gain,
            ..DecoderConfig::pcm(SampleFormat::PcmF32le, 24_000)
        }
    }

    fn alternating(n: usize) -> Vec<bool> {
        (0..n).map(|i| i % 2 == 0).collect()
    }

    #[test]
    fn test_aligned_nrz_recovers_bits() {
        let sent: Vec<bool> = alternating(200)
            .into_iter()
            .chain([true, true, false, true, false, false, false, true])
            .collect();
        let mut slicer = BitSlicer::new(&config(0.0));
        let mut bits = Vec::new();
        slicer.push_all(&nrz(&sent, 20.0, 0.8), &mut bits);
        assert_eq!(bits.len(), sent.len());
        // Let the running average settle before comparing
        assert_eq!(&bits[100..], &sent[100..]);
    }

    #[test]
    fn test_clock_recovery_pulls_in_offset() {
        let sent: Vec<bool> = alternating(400)
            .into_iter()
            .chain((0..64).map(|i| (i * 7) % 3 == 0))
            .collect();
        let mut samples = vec![0.0f32; 9];
        samples.extend(nrz(&sent, 20.0, 1.0));

        let mut slicer = BitSlicer::new(&config(0.1));
        let mut bits = Vec::new();
        slicer.push_all(&samples, &mut bits);

        let tail = &sent[sent.len() - 64..];
        assert!(
            bits.windows(64).any(|w| w == tail),
            "payload not found after clock recovery"
        );
    }

    #[test]
    fn test_reset_clears_threshold() {
        let mut slicer = BitSlicer::new(&config(0.05));
        for _ in 0..100 {
            slicer.push(1.0);
        }
        assert!(slicer.threshold() > 0.0);
        slicer.reset();
        assert_eq!(slicer.threshold(), 0.0);
    }
}
