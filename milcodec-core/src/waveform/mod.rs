//! Waveform demodulators (spec.md §4.1): DSSS/BPSK, FSK2, and linear chirp.
//!
//! All variants share one downstream contract — `AudioWindow -> RawBitStream`
//! — selected once at construction and never swapped at runtime (spec.md §9).

mod chirp;
mod dsss;
mod filters;
mod fsk;

pub use chirp::LinearChirp;
pub use dsss::DsssBpsk;
pub use fsk::Fsk2;

use crate::config::{Mode, ReceiverConfig, WaveformKind, WaveformProfile, DEFAULT_DSSS_CARRIER_HZ};

/// A single demodulated bit. FSK2 can additionally report `Indeterminate`
/// when neither tone dominates a stride; DSSS and chirp never emit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bit {
    Zero,
    One,
    Indeterminate,
}

pub type RawBitStream = Vec<Bit>;

/// Shared demodulator contract. Implementations own their own correlation
/// templates/filter coefficients, built once at construction.
pub trait WaveformVariant {
    fn profile(&self) -> WaveformProfile;
    fn demodulate(&self, window: &[f32]) -> RawBitStream;
}

/// Build the demodulator named by `config.waveform`, at `config.sample_rate`,
/// using the default carrier. Used by the orchestrator when auto-scan is
/// disabled.
pub fn build_variant(config: &ReceiverConfig) -> Box<dyn WaveformVariant + Send + Sync> {
    build_variant_with_carrier(config, DEFAULT_DSSS_CARRIER_HZ)
}

/// Build the demodulator named by `config.waveform`, overriding the DSSS
/// carrier. Only meaningful for `DsssCovert`/`DsssBurst`; ignored by the
/// fixed-carrier variants. Used by auto-scan to probe each carrier in
/// `DSSS_CARRIER_POOL_HZ` in turn.
pub fn build_variant_with_carrier(
    config: &ReceiverConfig,
    carrier_hz: f64,
) -> Box<dyn WaveformVariant + Send + Sync> {
    match config.waveform {
        WaveformKind::DsssCovert => Box::new(DsssBpsk::covert(config.sample_rate, carrier_hz)),
        WaveformKind::DsssBurst => Box::new(DsssBpsk::burst(config.sample_rate, carrier_hz)),
        WaveformKind::DsssHeavyDuty => Box::new(DsssBpsk::heavy_duty(config.sample_rate)),
        WaveformKind::Fsk2 => Box::new(Fsk2::new(config.sample_rate)),
        WaveformKind::Chirp => Box::new(LinearChirp::new(config.sample_rate)),
    }
}

/// Whether `kind` carries a sweepable DSSS carrier (relevant to auto-scan).
pub fn is_carrier_sweepable(kind: WaveformKind) -> bool {
    matches!(kind, WaveformKind::DsssCovert | WaveformKind::DsssBurst)
}

pub fn mode_to_waveform(mode: Mode) -> WaveformKind {
    match mode {
        Mode::Covert => WaveformKind::DsssCovert,
        Mode::Burst => WaveformKind::DsssBurst,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaveformKind;

    #[test]
    fn build_variant_matches_configured_kind() {
        let mut config = ReceiverConfig::default();
        config.waveform = WaveformKind::Fsk2;
        let variant = build_variant(&config);
        assert_eq!(variant.profile().kind, WaveformKind::Fsk2);
    }

    #[test]
    fn only_dsss_kinds_are_carrier_sweepable() {
        assert!(is_carrier_sweepable(WaveformKind::DsssCovert));
        assert!(is_carrier_sweepable(WaveformKind::DsssBurst));
        assert!(!is_carrier_sweepable(WaveformKind::DsssHeavyDuty));
        assert!(!is_carrier_sweepable(WaveformKind::Fsk2));
        assert!(!is_carrier_sweepable(WaveformKind::Chirp));
    }
}
