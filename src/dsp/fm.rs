//! FM demodulation and decimation.

use std::f32::consts::PI;

/// Quadrature FM discriminator.
///
/// Output is `arg(z[n] * conj(z[n-1])) / pi`, the instantaneous frequency
/// normalised to `[-1, 1]` of the Nyquist range.
#[derive(Debug, Clone, Default)]
pub struct FmDiscriminator {
    previous: Option<(f32, f32)>,
}

impl FmDiscriminator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, i: f32, q: f32) -> f32 {
        let out = match self.previous {
            Some((pi, pq)) => {
                let re = i * pi + q * pq;
                let im = q * pi - i * pq;
                if re == 0.0 && im == 0.0 {
                    0.0
                } else {
                    im.atan2(re) / PI
                }
            }
            None => 0.0,
        };
        self.previous = Some((i, q));
        out
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

/// Boxcar (moving average) decimator.
#[derive(Debug, Clone)]
pub struct Decimator {
    factor: usize,
    sum: f32,
    count: usize,
}

impl Decimator {
    pub fn new(factor: usize) -> Self {
        Self {
            factor: factor.max(1),
            sum: 0.0,
            count: 0,
        }
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Add one input sample; returns the average once `factor` samples are in.
    #[inline]
    pub fn push(&mut self, sample: f32) -> Option<f32> {
        if self.factor == 1 {
            return Some(sample);
        }
        self.sum += sample;
        self.count += 1;
        if self.count == self.factor {
            let out = self.sum / self.factor as f32;
            self.sum = 0.0;
            self.count = 0;
            Some(out)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminator_measures_rotation() {
        let mut disc = FmDiscriminator::new();
        let step = PI / 8.0;
        let mut last = 0.0;
        for n in 0..32 {
            let phase = step * n as f32;
            last = disc.push(phase.cos(), phase.sin());
        }
        assert!((last - 0.125).abs() < 1e-4);

        // Negative rotation gives a negative frequency
        let mut disc = FmDiscriminator::new();
        disc.push(1.0, 0.0);
        let out = disc.push(step.cos(), -step.sin());
        assert!((out + 0.125).abs() < 1e-4);
    }

    #[test]
    fn test_discriminator_first_sample_is_zero() {
        let mut disc = FmDiscriminator::new();
        assert_eq!(disc.push(0.3, -0.7), 0.0);
        assert_eq!(disc.push(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_decimator_averages() {
        let mut dec = Decimator::new(4);
        let out: Vec<f32> = [1.0, 2.0, 3.0, 4.0, 8.0, 8.0, 8.0]
            .iter()
            .filter_map(|&s| dec.push(s))
            .collect();
        assert_eq!(out, vec![2.5]);
        assert_eq!(dec.push(8.0), Some(8.0));
    }

    #[test]
    fn test_unit_decimator_passes_through() {
        let mut dec = Decimator::new(0);
        assert_eq!(dec.factor(), 1);
        assert_eq!(dec.push(-0.5), Some(-0.5));
    }
}
