//! 2-FSK demodulator ("Screecher", spec.md §4.1.2).

use std::f64::consts::TAU;

use super::{Bit, RawBitStream, WaveformVariant};
use crate::config::{
    WaveformKind, WaveformProfile, FSK_DOMINANCE_RATIO, FSK_MARK_HZ, FSK_SPACE_HZ, FSK_SYMBOL_MS,
    SEARCH_DEPTH_FSK,
};

/// Goertzel single-bin magnitude-squared over a window of fixed length.
///
/// The recursion coefficient depends only on the window length and target
/// frequency, so it is computed once at construction time and reused for
/// every stride (spec.md §9 Numeric stability).
struct GoertzelBin {
    coeff: f64,
}

impl GoertzelBin {
    fn new(window_len: usize, target_hz: f64, sample_rate: f64) -> Self {
        let n = window_len as f64;
        let k = (0.5 + n * target_hz / sample_rate).floor();
        let omega = TAU * k / n;
        Self {
            coeff: 2.0 * omega.cos(),
        }
    }

    fn magnitude_sq(&self, window: &[f32]) -> f64 {
        let (mut s1, mut s2) = (0.0f64, 0.0f64);
        for &sample in window {
            let s0 = sample as f64 + self.coeff * s1 - s2;
            s2 = s1;
            s1 = s0;
        }
        s1 * s1 + s2 * s2 - self.coeff * s1 * s2
    }
}

pub struct Fsk2 {
    sample_rate: usize,
    symbol_samples: usize,
    stride_samples: usize,
    mark: GoertzelBin,
    space: GoertzelBin,
}

impl Fsk2 {
    pub fn new(sample_rate: usize) -> Self {
        let symbol_samples = (sample_rate as f64 * FSK_SYMBOL_MS / 1000.0).round() as usize;
        let stride_samples = symbol_samples / 2;
        Self {
            sample_rate,
            symbol_samples,
            stride_samples,
            mark: GoertzelBin::new(stride_samples, FSK_MARK_HZ, sample_rate as f64),
            space: GoertzelBin::new(stride_samples, FSK_SPACE_HZ, sample_rate as f64),
        }
    }
}

impl WaveformVariant for Fsk2 {
    fn profile(&self) -> WaveformProfile {
        WaveformProfile {
            kind: WaveformKind::Fsk2,
            samples_per_symbol: self.symbol_samples,
            sync_bits: 16,
            sync_tolerance: 4,
            search_depth_cap: SEARCH_DEPTH_FSK,
        }
    }

    fn demodulate(&self, window: &[f32]) -> RawBitStream {
        if window.is_empty() || self.stride_samples == 0 {
            return Vec::new();
        }

        let _ = self.sample_rate;
        // Every symbol boundary is anchored to `i * symbol_samples` (the
        // sender's exact per-symbol sample count) rather than compounding
        // a separately-rounded half-stride, so there is no cumulative
        // drift across a long frame. Each half-stride is an independent
        // Goertzel window summed into one decision per symbol -- 2x
        // oversampling for decision robustness, not extra bit rate.
        let num_symbols = window.len() / self.symbol_samples;
        let mut bits = Vec::with_capacity(num_symbols);

        for i in 0..num_symbols {
            let base = i * self.symbol_samples;
            let mut mark_power = 0.0;
            let mut space_power = 0.0;
            for half in 0..2 {
                let start = base + half * self.stride_samples;
                let end = start + self.stride_samples;
                let slice = &window[start..end];
                mark_power += self.mark.magnitude_sq(slice);
                space_power += self.space.magnitude_sq(slice);
            }
            let total = mark_power + space_power;

            let bit = if total <= 0.0 {
                Bit::Indeterminate
            } else if mark_power / total > FSK_DOMINANCE_RATIO {
                Bit::One
            } else if space_power / total > FSK_DOMINANCE_RATIO {
                Bit::Zero
            } else {
                Bit::Indeterminate
            };
            bits.push(bit);
        }

        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq_hz: f64, sample_rate: usize, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| (TAU * freq_hz * n as f64 / sample_rate as f64).sin() as f32)
            .collect()
    }

    #[test]
    fn mark_tone_decodes_as_one() {
        let demod = Fsk2::new(44_100);
        let audio = tone(FSK_MARK_HZ, 44_100, demod.symbol_samples * 4);
        let bits = demod.demodulate(&audio);
        assert_eq!(bits.len(), 4);
        assert!(bits.iter().all(|&b| b == Bit::One), "{bits:?}");
    }

    #[test]
    fn space_tone_decodes_as_zero() {
        let demod = Fsk2::new(44_100);
        let audio = tone(FSK_SPACE_HZ, 44_100, demod.symbol_samples * 4);
        let bits = demod.demodulate(&audio);
        assert_eq!(bits.len(), 4);
        assert!(bits.iter().all(|&b| b == Bit::Zero), "{bits:?}");
    }

    #[test]
    fn silence_is_indeterminate() {
        let demod = Fsk2::new(44_100);
        let audio = vec![0.0f32; demod.symbol_samples * 3];
        let bits = demod.demodulate(&audio);
        assert!(bits.iter().all(|&b| b == Bit::Indeterminate));
    }

    #[test]
    fn empty_window_yields_empty_bitstream() {
        let demod = Fsk2::new(44_100);
        assert!(demod.demodulate(&[]).is_empty());
    }
}
