//! DSSS/BPSK demodulator (spec.md §4.1.1, §4.1.4) — the "covert" default,
//! its unspread BURST sub-mode, and the heavy-duty variant.

use std::f64::consts::TAU;

use super::filters::Biquad;
use super::{Bit, RawBitStream, WaveformVariant};
use crate::config::{
    WaveformKind, WaveformProfile, BARKER31, DSSS_SAMPLES_PER_CHIP_HEAVY,
    DSSS_SAMPLES_PER_CHIP_STANDARD, HEAVY_DUTY_BANDWIDTH_HZ, HEAVY_DUTY_CARRIER_HZ,
    SEARCH_DEPTH_DSSS,
};

/// DSSS/BPSK demodulator. Covers the covert default, the unspread BURST
/// sub-mode, and the heavy-duty sub-mode (biquad-prefiltered, 20
/// samples/chip, fixed carrier) — all three share the same carrier-mix +
/// integrate-and-dump decision rule, differing only in spreading and
/// pre-filtering.
pub struct DsssBpsk {
    sample_rate: usize,
    carrier_hz: f64,
    burst: bool,
    /// Replicated-chip template in {-1.0, +1.0}, one entry per sample of a
    /// symbol. Empty when `burst` is true (no spreading).
    template: Vec<f32>,
    prefilter: Option<Biquad>,
}

impl DsssBpsk {
    /// Covert default: Barker-31 spreading, `samples_per_chip = 4`.
    pub fn covert(sample_rate: usize, carrier_hz: f64) -> Self {
        Self {
            sample_rate,
            carrier_hz,
            burst: false,
            template: spread_template(DSSS_SAMPLES_PER_CHIP_STANDARD),
            prefilter: None,
        }
    }

    /// BURST sub-mode: no spreading, 8 samples/symbol.
    pub fn burst(sample_rate: usize, carrier_hz: f64) -> Self {
        Self {
            sample_rate,
            carrier_hz,
            burst: true,
            template: Vec::new(),
            prefilter: None,
        }
    }

    /// Heavy-duty: Barker-31 spreading, `samples_per_chip = 20`, fixed
    /// 14.5kHz carrier, biquad band-pass pre-filter.
    pub fn heavy_duty(sample_rate: usize) -> Self {
        Self {
            sample_rate,
            carrier_hz: HEAVY_DUTY_CARRIER_HZ,
            burst: false,
            template: spread_template(DSSS_SAMPLES_PER_CHIP_HEAVY),
            prefilter: Some(Biquad::band_pass(
                sample_rate as f64,
                HEAVY_DUTY_CARRIER_HZ,
                HEAVY_DUTY_BANDWIDTH_HZ,
            )),
        }
    }

    fn samples_per_symbol(&self) -> usize {
        if self.burst {
            crate::config::BURST_SAMPLES_PER_SYMBOL
        } else {
            self.template.len()
        }
    }

    fn is_heavy_duty(&self) -> bool {
        self.prefilter.is_some()
    }
}

/// Replicate each Barker-31 chip `samples_per_chip` times into a flat
/// template of length `31 * samples_per_chip`.
fn spread_template(samples_per_chip: usize) -> Vec<f32> {
    BARKER31
        .iter()
        .flat_map(|&chip| std::iter::repeat(chip as f32).take(samples_per_chip))
        .collect()
}

impl WaveformVariant for DsssBpsk {
    fn profile(&self) -> WaveformProfile {
        let kind = if self.burst {
            WaveformKind::DsssBurst
        } else if self.is_heavy_duty() {
            WaveformKind::DsssHeavyDuty
        } else {
            WaveformKind::DsssCovert
        };
        WaveformProfile {
            kind,
            samples_per_symbol: self.samples_per_symbol(),
            sync_bits: 32,
            sync_tolerance: if self.is_heavy_duty() { 2 } else { 0 },
            search_depth_cap: SEARCH_DEPTH_DSSS,
        }
    }

    fn demodulate(&self, window: &[f32]) -> RawBitStream {
        if window.is_empty() {
            return Vec::new();
        }

        let filtered;
        let source = if let Some(prefilter) = &self.prefilter {
            filtered = prefilter.apply(window);
            &filtered[..]
        } else {
            window
        };

        let sps = self.samples_per_symbol();
        let dt = 1.0 / self.sample_rate as f64;
        let num_symbols = source.len() / sps;
        let mut bits = Vec::with_capacity(num_symbols);

        for sym_idx in 0..num_symbols {
            let start = sym_idx * sps;
            let end = start + sps;

            let mut acc = 0.0f64;
            for (offset, &sample) in source[start..end].iter().enumerate() {
                let n = start + offset;
                let angle = TAU * self.carrier_hz * (n as f64) * dt;
                let baseband = sample as f64 * angle.cos();
                let weight = if self.burst {
                    1.0
                } else {
                    self.template[offset] as f64
                };
                acc += baseband * weight;
            }

            bits.push(if acc > 0.0 { Bit::One } else { Bit::Zero });
        }

        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modulate_bits(bits: &[u8], sps: usize, sample_rate: usize, carrier_hz: f64, template: Option<&[f32]>) -> Vec<f32> {
        let dt = 1.0 / sample_rate as f64;
        let mut out = Vec::with_capacity(bits.len() * sps);
        for (sym_idx, &bit) in bits.iter().enumerate() {
            let polarity = if bit == 1 { 1.0 } else { -1.0 };
            for offset in 0..sps {
                let n = sym_idx * sps + offset;
                let angle = TAU * carrier_hz * (n as f64) * dt;
                let chip = template.map(|t| t[offset] as f64).unwrap_or(1.0);
                out.push((polarity * chip * angle.cos()) as f32);
            }
        }
        out
    }

    #[test]
    fn covert_recovers_known_bits() {
        let demod = DsssBpsk::covert(44_100, 12_000.0);
        let template = spread_template(DSSS_SAMPLES_PER_CHIP_STANDARD);
        let bits_in = [1, 0, 1, 1, 0];
        let audio = modulate_bits(&bits_in, template.len(), 44_100, 12_000.0, Some(&template));

        let recovered = demod.demodulate(&audio);
        assert_eq!(recovered.len(), bits_in.len());
        for (expected, actual) in bits_in.iter().zip(recovered.iter()) {
            let expected_bit = if *expected == 1 { Bit::One } else { Bit::Zero };
            assert_eq!(*actual, expected_bit);
        }
    }

    #[test]
    fn burst_recovers_known_bits() {
        let demod = DsssBpsk::burst(44_100, 12_000.0);
        let bits_in = [0, 1, 1, 0];
        let audio = modulate_bits(&bits_in, crate::config::BURST_SAMPLES_PER_SYMBOL, 44_100, 12_000.0, None);

        let recovered = demod.demodulate(&audio);
        assert_eq!(recovered.len(), bits_in.len());
        assert_eq!(recovered[0], Bit::Zero);
        assert_eq!(recovered[1], Bit::One);
    }

    #[test]
    fn carrier_inversion_flips_every_bit() {
        let demod = DsssBpsk::covert(44_100, 12_000.0);
        let template = spread_template(DSSS_SAMPLES_PER_CHIP_STANDARD);
        let bits_in = [1, 0, 1, 1];
        let audio = modulate_bits(&bits_in, template.len(), 44_100, 12_000.0, Some(&template));
        let inverted: Vec<f32> = audio.iter().map(|s| -s).collect();

        let normal = demod.demodulate(&audio);
        let flipped = demod.demodulate(&inverted);

        for (n, f) in normal.iter().zip(flipped.iter()) {
            assert_ne!(n, f);
        }
    }

    #[test]
    fn empty_window_yields_empty_bitstream() {
        let demod = DsssBpsk::covert(44_100, 12_000.0);
        assert!(demod.demodulate(&[]).is_empty());
    }

    #[test]
    fn heavy_duty_recovers_known_bits_through_prefilter() {
        let demod = DsssBpsk::heavy_duty(44_100);
        let template = spread_template(DSSS_SAMPLES_PER_CHIP_HEAVY);
        let bits_in = [1, 0, 1];
        let audio = modulate_bits(&bits_in, template.len(), 44_100, HEAVY_DUTY_CARRIER_HZ, Some(&template));

        let recovered = demod.demodulate(&audio);
        assert_eq!(recovered.len(), bits_in.len());
    }
}
