//! Linear chirp demodulator ("Dolphin", spec.md §4.1.3).
//!
//! Synchronization and payload extraction for this variant run in the
//! correlator/peak domain rather than over a generic bitstream (spec.md
//! §4.2 point 4, §4.3 "Chirp-variant symbol acquisition"), so this module
//! also exposes `find_preamble`/`read_symbols`, used directly by the
//! orchestrator instead of the generic `sync`/`payload` modules.

use std::f64::consts::TAU;

use super::{Bit, RawBitStream, WaveformVariant};
use crate::config::{
    WaveformKind, WaveformProfile, CHIRP_CORR_STEP, CHIRP_HIGH_HZ, CHIRP_LOW_HZ,
    CHIRP_PEAK_THRESHOLD, CHIRP_PEAK_TOLERANCE, CHIRP_SYMBOL_MS, SEARCH_DEPTH_FSK,
};

fn chirp_template(sample_rate: usize, f_start: f64, f_end: f64, duration_ms: f64) -> Vec<f32> {
    let duration_s = duration_ms / 1000.0;
    let n = (sample_rate as f64 * duration_s).round() as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let phase = TAU * (f_start * t + (f_end - f_start) * t * t / (2.0 * duration_s));
            phase.sin() as f32
        })
        .collect()
}

pub struct LinearChirp {
    samples_per_symbol: usize,
    up_template: Vec<f32>,
    down_template: Vec<f32>,
}

impl LinearChirp {
    pub fn new(sample_rate: usize) -> Self {
        let up_template = chirp_template(sample_rate, CHIRP_LOW_HZ, CHIRP_HIGH_HZ, CHIRP_SYMBOL_MS);
        let down_template = chirp_template(sample_rate, CHIRP_HIGH_HZ, CHIRP_LOW_HZ, CHIRP_SYMBOL_MS);
        let samples_per_symbol = up_template.len();
        Self {
            samples_per_symbol,
            up_template,
            down_template,
        }
    }

    pub fn samples_per_symbol(&self) -> usize {
        self.samples_per_symbol
    }

    /// Render the fixed `Up, Up, Down, Down` preamble that `find_preamble`
    /// searches for.
    pub fn preamble_audio(&self) -> Vec<f32> {
        self.up_template
            .iter()
            .chain(self.up_template.iter())
            .chain(self.down_template.iter())
            .chain(self.down_template.iter())
            .copied()
            .collect()
    }

    /// Render a bitstream as back-to-back up/down chirp symbols (1 = up,
    /// 0/indeterminate = down). Used by reference-sender fixtures; the
    /// receive path never calls this.
    pub fn render_bits(&self, bits: &[Bit]) -> Vec<f32> {
        bits.iter()
            .flat_map(|bit| {
                if *bit == Bit::One {
                    self.up_template.iter()
                } else {
                    self.down_template.iter()
                }
            })
            .copied()
            .collect()
    }

    /// Correlate the window starting at `pos` against the up (or down)
    /// chirp template. Returns `None` if the window doesn't have enough
    /// trailing samples.
    fn correlate_at(&self, window: &[f32], pos: usize, up: bool) -> Option<f32> {
        let template = if up { &self.up_template } else { &self.down_template };
        if pos + template.len() > window.len() {
            return None;
        }
        let sum: f32 = window[pos..pos + template.len()]
            .iter()
            .zip(template.iter())
            .map(|(&s, &t)| s * t)
            .sum();
        Some(sum)
    }

    /// Search the whole window (bounded by the search cap) for the fixed
    /// `Up, Up, Down, Down` preamble (spec.md §4.2 point 4). Returns the
    /// sample index of the symbol immediately following the fourth peak.
    pub fn find_preamble(&self, window: &[f32]) -> Option<usize> {
        let sps = self.samples_per_symbol;
        let tol = CHIRP_PEAK_TOLERANCE;
        let step = CHIRP_CORR_STEP;
        let threshold = CHIRP_PEAK_THRESHOLD;
        let search_cap = (SEARCH_DEPTH_FSK * sps).min(window.len());

        let first = {
            let mut pos = 0usize;
            let mut found = None;
            while pos < search_cap {
                if let Some(mag) = self.correlate_at(window, pos, true) {
                    if mag.abs() > threshold {
                        found = Some(pos);
                        break;
                    }
                }
                pos += step;
            }
            found?
        };

        let pattern_is_up = [true, false, false];
        let mut cursor = first;
        for &is_up in pattern_is_up.iter() {
            let target = cursor + sps;
            let lo = target.saturating_sub(tol);
            let hi = target + tol;

            let mut best_pos = None;
            let mut best_mag = 0.0f32;
            let mut p = lo;
            while p <= hi {
                if let Some(mag) = self.correlate_at(window, p, is_up) {
                    if mag.abs() > best_mag {
                        best_mag = mag.abs();
                        best_pos = Some(p);
                    }
                }
                p += step;
            }

            if best_mag < threshold {
                return None;
            }
            cursor = best_pos?;
        }

        Some(cursor + sps)
    }

    /// Read `count` symbols starting at `cursor`, re-centering per symbol
    /// within `+/- tolerance` to tolerate clock drift (spec.md §4.3).
    /// Stops early (returning fewer than `count` bits) if the window runs
    /// out of samples.
    pub fn read_symbols(&self, window: &[f32], start: usize, count: usize) -> RawBitStream {
        let sps = self.samples_per_symbol;
        let tol = CHIRP_PEAK_TOLERANCE;
        let step = CHIRP_CORR_STEP;
        let mut cursor = start;
        let mut bits = Vec::with_capacity(count);

        for _ in 0..count {
            let lo = cursor.saturating_sub(tol);
            let hi = cursor + tol;

            let mut best_pos = None;
            let mut best_mag = f32::MIN;
            let mut best_is_up = true;
            let mut p = lo;
            while p <= hi {
                if let Some(up_mag) = self.correlate_at(window, p, true) {
                    if up_mag.abs() > best_mag {
                        best_mag = up_mag.abs();
                        best_pos = Some(p);
                        best_is_up = true;
                    }
                }
                if let Some(down_mag) = self.correlate_at(window, p, false) {
                    if down_mag.abs() > best_mag {
                        best_mag = down_mag.abs();
                        best_pos = Some(p);
                        best_is_up = false;
                    }
                }
                p += step;
            }

            let Some(peak_pos) = best_pos else { break };
            bits.push(if best_is_up { Bit::One } else { Bit::Zero });
            cursor = peak_pos + sps;
        }

        bits
    }
}

impl WaveformVariant for LinearChirp {
    fn profile(&self) -> WaveformProfile {
        WaveformProfile {
            kind: WaveformKind::Chirp,
            samples_per_symbol: self.samples_per_symbol,
            sync_bits: 16,
            sync_tolerance: 0,
            search_depth_cap: SEARCH_DEPTH_FSK,
        }
    }

    /// Naive fixed-slot fallback, used when a caller wants a flat
    /// bitstream without the adaptive preamble search (e.g. generic
    /// tests exercising the shared `WaveformVariant` contract). The real
    /// decode path uses `find_preamble`/`read_symbols` directly.
    fn demodulate(&self, window: &[f32]) -> RawBitStream {
        if window.is_empty() {
            return Vec::new();
        }
        let sps = self.samples_per_symbol;
        let num_symbols = window.len() / sps;
        let mut bits = Vec::with_capacity(num_symbols);
        for i in 0..num_symbols {
            let pos = i * sps;
            let up = self.correlate_at(window, pos, true).unwrap_or(0.0);
            let down = self.correlate_at(window, pos, false).unwrap_or(0.0);
            bits.push(if up.abs() >= down.abs() { Bit::One } else { Bit::Zero });
        }
        bits
    }
}
