//! Configuration types and process-lifetime constants for the receiver.

use serde::{Deserialize, Serialize};

/// Audio sample rate the whole pipeline is specified against.
pub const SAMPLE_RATE: usize = 44_100;

/// Approximate capture duration per decode attempt, in seconds.
pub const WINDOW_SECS: f64 = 2.0;

/// Hard cap on the link-layer payload length field (bytes).
pub const MAX_PAYLOAD_BYTES: u16 = 1024;

/// 32-bit sync word used by the DSSS/BPSK variants (`0x1ACFFF1D`-equivalent).
pub const SYNC_WORD_32: u32 = 0b0001_1010_1100_1111_1111_1111_0001_1101;

/// 16-bit sync word used by the FSK/Chirp variants (`0xAACC`).
pub const SYNC_WORD_16: u16 = 0b1010_1010_1100_1100;

/// 31-chip Barker-like spreading sequence shared by every DSSS sub-mode.
pub const BARKER31: [i8; 31] = [
    1, 1, 1, 1, 1, -1, -1, 1, 1, -1, 1, -1, -1, 1, 1, 1, 1, 1, -1, -1, 1, 1, -1, 1, -1, 1, -1, -1,
    -1, -1, -1,
];

/// Carrier pool scanned, in order, when auto-scan is enabled.
pub const DSSS_CARRIER_POOL_HZ: [f64; 11] = [
    8_000.0, 9_000.0, 10_000.0, 11_000.0, 12_000.0, 13_000.0, 14_000.0, 15_000.0, 16_000.0,
    17_000.0, 18_000.0,
];

/// Default carrier used when auto-scan is disabled.
pub const DEFAULT_DSSS_CARRIER_HZ: f64 = 12_000.0;

/// Fixed carrier for the heavy-duty DSSS sub-mode.
pub const HEAVY_DUTY_CARRIER_HZ: f64 = 14_500.0;

/// Heavy-duty band-pass bandwidth (Hz), used to derive the biquad Q factor.
pub const HEAVY_DUTY_BANDWIDTH_HZ: f64 = 2_000.0;

pub const FSK_MARK_HZ: f64 = 14_000.0;
pub const FSK_SPACE_HZ: f64 = 14_200.0;
pub const FSK_SYMBOL_MS: f64 = 50.0;
/// Goertzel stride: half a symbol, i.e. the stream is 2x oversampled.
pub const FSK_STRIDE_MS: f64 = 25.0;
/// Fraction of local tonal power a tone must exceed to be called mark/space.
pub const FSK_DOMINANCE_RATIO: f64 = 0.6;

pub const CHIRP_LOW_HZ: f64 = 14_000.0;
pub const CHIRP_HIGH_HZ: f64 = 17_000.0;
pub const CHIRP_SYMBOL_MS: f64 = 50.0;
/// Correlator slide step, in samples.
pub const CHIRP_CORR_STEP: usize = 20;
/// +/- tolerance (samples) used both for preamble spacing and per-symbol re-centering.
pub const CHIRP_PEAK_TOLERANCE: usize = 400;
/// Minimum correlation magnitude counted as a preamble/symbol peak.
pub const CHIRP_PEAK_THRESHOLD: f32 = 50.0;

/// Samples per chip for the standard-duty DSSS sub-modes.
pub const DSSS_SAMPLES_PER_CHIP_STANDARD: usize = 4;
/// Samples per chip for the heavy-duty DSSS sub-mode.
pub const DSSS_SAMPLES_PER_CHIP_HEAVY: usize = 20;
/// Samples per symbol for the BURST sub-mode (no spreading).
pub const BURST_SAMPLES_PER_SYMBOL: usize = 8;

/// Default ASCII preshared symmetric key.
///
/// Explicitly insecure; retained only to reproduce reference-compatible
/// decryption, exactly as spec.md §4.4/§9 require.
pub const DEFAULT_KEY: &[u8; 32] = b"01234567890123456789012345678901";

/// Hamming-distance search caps from spec.md §4.2.
pub const SEARCH_DEPTH_DSSS: usize = 2_000;
pub const SEARCH_DEPTH_FSK: usize = 5_000;

/// Physical-layer variant selectable at `ReceiverConfig` construction time.
///
/// Picked once per session (spec.md §9: "avoid runtime monkey-patching").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveformKind {
    /// DSSS/BPSK with Barker-31 spreading (the "covert" mode).
    DsssCovert,
    /// Plain BPSK, no spreading, 8 samples/symbol (the "burst" mode).
    DsssBurst,
    /// DSSS/BPSK, 20 samples/chip, fixed 14.5kHz carrier, biquad pre-filter.
    DsssHeavyDuty,
    /// 2-FSK ("Screecher").
    Fsk2,
    /// Linear up/down chirp ("Dolphin").
    Chirp,
}

/// User-facing coarse mode selector (spec.md §6 `set_mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Covert,
    Burst,
}

/// Metadata describing one waveform variant's timing and sync contract.
///
/// This is the `WaveformProfile` entity of spec.md §3: process-lifetime
/// constant once a variant is selected, read-only thereafter.
#[derive(Debug, Clone)]
pub struct WaveformProfile {
    pub kind: WaveformKind,
    pub samples_per_symbol: usize,
    pub sync_bits: usize,
    pub sync_tolerance: u32,
    pub search_depth_cap: usize,
}

/// Top-level receiver configuration (spec.md §6 control surface).
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    pub sample_rate: usize,
    pub waveform: WaveformKind,
    pub auto_scan: bool,
    pub key: [u8; 32],
    pub verify_key: Option<[u8; 32]>,
    pub chunk_size: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            waveform: WaveformKind::DsssCovert,
            auto_scan: false,
            key: *DEFAULT_KEY,
            verify_key: None,
            chunk_size: 4_096,
        }
    }
}

impl ReceiverConfig {
    pub fn set_mode(&mut self, mode: Mode) {
        self.waveform = crate::waveform::mode_to_waveform(mode);
    }

    pub fn set_auto_scan(&mut self, enabled: bool) {
        self.auto_scan = enabled;
    }

    pub fn set_key(&mut self, key: [u8; 32]) {
        self.key = key;
    }

    /// Window length, in samples, for one decode attempt.
    pub fn window_len(&self) -> usize {
        (self.sample_rate as f64 * WINDOW_SECS).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_covert_dsss_and_default_key() {
        let config = ReceiverConfig::default();
        assert_eq!(config.waveform, WaveformKind::DsssCovert);
        assert_eq!(&config.key, DEFAULT_KEY);
        assert!(!config.auto_scan);
    }

    #[test]
    fn set_mode_switches_waveform_kind() {
        let mut config = ReceiverConfig::default();
        config.set_mode(Mode::Burst);
        assert_eq!(config.waveform, WaveformKind::DsssBurst);
        config.set_mode(Mode::Covert);
        assert_eq!(config.waveform, WaveformKind::DsssCovert);
    }

    #[test]
    fn window_len_matches_two_seconds_at_sample_rate() {
        let config = ReceiverConfig::default();
        assert_eq!(config.window_len(), 88_200);
    }

    #[test]
    fn barker_sequence_has_31_chips_and_is_bipolar() {
        assert_eq!(BARKER31.len(), 31);
        assert!(BARKER31.iter().all(|&c| c == 1 || c == -1));
    }
}
