//! Shared filter primitives for the waveform demodulators.
//!
//! Mirrors the teacher's filter-module shape (coefficients precomputed once,
//! convolution/recursion applied explicitly) but trades the FIR pulse-shaping
//! filter for the biquad IIR band-pass the heavy-duty DSSS sub-mode needs.

use std::f64::consts::PI;

/// Direct-form-I transposed biquad band-pass filter.
///
/// State `(x1, x2, y1, y2)` must be freshly zeroed per window: each decode
/// attempt is independent and filter state must never persist across
/// windows (spec.md §9 Numeric stability).
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// Design a band-pass biquad centered at `center_hz` with the given
    /// bandwidth, per spec.md §4.1.4's coefficient formulas.
    pub fn band_pass(sample_rate: f64, center_hz: f64, bandwidth_hz: f64) -> Self {
        let q = center_hz / bandwidth_hz;
        let omega0 = 2.0 * PI * center_hz / sample_rate;
        let alpha = omega0.sin() / (2.0 * q);

        let b0 = alpha;
        let b1 = 0.0;
        let b2 = -alpha;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * omega0.cos();
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Filter a whole window with fresh zero state.
    pub fn apply(&self, samples: &[f32]) -> Vec<f32> {
        let mut x1 = 0.0f64;
        let mut x2 = 0.0f64;
        let mut y1 = 0.0f64;
        let mut y2 = 0.0f64;

        let mut out = Vec::with_capacity(samples.len());
        for &sample in samples {
            let x0 = sample as f64;
            let y0 = self.b0 * x0 + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
            x2 = x1;
            x1 = x0;
            y2 = y1;
            y1 = y0;
            out.push(y0 as f32);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_center_frequency_with_little_attenuation() {
        let sample_rate = 44_100.0;
        let center = 14_500.0;
        let filter = Biquad::band_pass(sample_rate, center, 2_000.0);

        let n = 2_000;
        let tone: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * center * i as f64 / sample_rate).sin() as f32)
            .collect();

        let filtered = filter.apply(&tone);
        let in_energy: f32 = tone[500..].iter().map(|x| x * x).sum();
        let out_energy: f32 = filtered[500..].iter().map(|x| x * x).sum();

        assert!(out_energy > in_energy * 0.3, "in-band tone over-attenuated");
    }

    #[test]
    fn attenuates_far_off_band_tone() {
        let sample_rate = 44_100.0;
        let filter = Biquad::band_pass(sample_rate, 14_500.0, 2_000.0);

        let n = 2_000;
        let off_band: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * 2_000.0 * i as f64 / sample_rate).sin() as f32)
            .collect();

        let filtered = filter.apply(&off_band);
        let in_energy: f32 = off_band[500..].iter().map(|x| x * x).sum();
        let out_energy: f32 = filtered[500..].iter().map(|x| x * x).sum();

        assert!(out_energy < in_energy * 0.3, "out-of-band tone not attenuated");
    }

    #[test]
    fn state_does_not_leak_between_calls() {
        let filter = Biquad::band_pass(44_100.0, 14_500.0, 2_000.0);
        let a = filter.apply(&[1.0, 0.0, 0.0, 0.0]);
        let b = filter.apply(&[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(a, b, "filter state leaked across windows");
    }
}
