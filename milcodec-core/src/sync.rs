//! Frame synchronizer (spec.md §4.2): locates the fixed sync word in a
//! demodulated bitstream, tolerating both bit errors (Hamming-distance
//! search) and whole-stream carrier polarity inversion.

use crate::config::{WaveformProfile, SYNC_WORD_16, SYNC_WORD_32};
use crate::utils::int_to_bits;
use crate::waveform::{Bit, RawBitStream};

/// A located sync word. `offset` is the index of the first payload bit,
/// i.e. immediately after the matched sync word. `inverted` is set when the
/// match was found against the bitwise-complemented sync pattern, meaning
/// every bit in the stream from this point on must be flipped back before
/// use (spec.md §8 invariant: carrier inversion flips every bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncMatch {
    pub offset: usize,
    pub inverted: bool,
}

fn sync_pattern(sync_bits: usize) -> Vec<u8> {
    if sync_bits >= 32 {
        int_to_bits(SYNC_WORD_32 as u64, 32)
    } else {
        int_to_bits(SYNC_WORD_16 as u64, sync_bits)
    }
}

fn hamming_distance(window: &[Bit], pattern: &[u8]) -> u32 {
    window
        .iter()
        .zip(pattern.iter())
        .map(|(bit, &want)| match bit {
            Bit::Zero if want == 0 => 0,
            Bit::One if want == 1 => 0,
            Bit::Zero | Bit::One => 1,
            Bit::Indeterminate => 1,
        })
        .sum()
}

/// Search `bits` for the sync word described by `profile`, bounded by
/// `profile.search_depth_cap` bit positions.
pub fn find_sync(bits: &RawBitStream, profile: &WaveformProfile) -> Option<SyncMatch> {
    let sync_bits = profile.sync_bits;
    if bits.len() < sync_bits {
        return None;
    }

    let pattern = sync_pattern(sync_bits);
    let inverted_pattern: Vec<u8> = pattern.iter().map(|&b| 1 - b).collect();

    let max_offset = (bits.len() - sync_bits).min(profile.search_depth_cap);
    for offset in 0..=max_offset {
        let window = &bits[offset..offset + sync_bits];

        if hamming_distance(window, &pattern) <= profile.sync_tolerance {
            return Some(SyncMatch {
                offset: offset + sync_bits,
                inverted: false,
            });
        }
        if hamming_distance(window, &inverted_pattern) <= profile.sync_tolerance {
            return Some(SyncMatch {
                offset: offset + sync_bits,
                inverted: true,
            });
        }
    }

    None
}

/// Flip every bit in `bits`, preserving `Indeterminate` markers.
pub fn invert_bits(bits: &[Bit]) -> RawBitStream {
    bits.iter()
        .map(|b| match b {
            Bit::Zero => Bit::One,
            Bit::One => Bit::Zero,
            Bit::Indeterminate => Bit::Indeterminate,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaveformKind;

    fn profile(sync_bits: usize, tolerance: u32) -> WaveformProfile {
        WaveformProfile {
            kind: WaveformKind::DsssCovert,
            samples_per_symbol: 1,
            sync_bits,
            sync_tolerance: tolerance,
            search_depth_cap: 2_000,
        }
    }

    fn bits_from_u8(pattern: &[u8]) -> RawBitStream {
        pattern
            .iter()
            .map(|&b| if b == 1 { Bit::One } else { Bit::Zero })
            .collect()
    }

    #[test]
    fn finds_exact_sync_word_at_start() {
        let pattern = sync_pattern(32);
        let mut stream = bits_from_u8(&pattern);
        stream.extend(vec![Bit::One, Bit::Zero, Bit::One]);

        let found = find_sync(&stream, &profile(32, 0)).unwrap();
        assert_eq!(found.offset, 32);
        assert!(!found.inverted);
    }

    #[test]
    fn finds_sync_word_after_noise_prefix() {
        let pattern = sync_pattern(32);
        let mut stream = vec![Bit::Zero, Bit::One, Bit::One];
        stream.extend(bits_from_u8(&pattern));
        stream.extend(vec![Bit::One, Bit::One]);

        let found = find_sync(&stream, &profile(32, 0)).unwrap();
        assert_eq!(found.offset, 3 + 32);
    }

    #[test]
    fn detects_inverted_sync_word() {
        let pattern = sync_pattern(32);
        let inverted: Vec<u8> = pattern.iter().map(|&b| 1 - b).collect();
        let stream = bits_from_u8(&inverted);

        let found = find_sync(&stream, &profile(32, 0)).unwrap();
        assert!(found.inverted);
    }

    #[test]
    fn tolerates_bit_errors_within_tolerance() {
        let pattern = sync_pattern(32);
        let mut corrupted = pattern.clone();
        corrupted[0] = 1 - corrupted[0];
        corrupted[5] = 1 - corrupted[5];
        let stream = bits_from_u8(&corrupted);

        assert!(find_sync(&stream, &profile(32, 2)).is_some());
        assert!(find_sync(&stream, &profile(32, 1)).is_none());
    }

    #[test]
    fn returns_none_when_stream_shorter_than_sync_word() {
        let stream = bits_from_u8(&[1, 0, 1]);
        assert!(find_sync(&stream, &profile(32, 0)).is_none());
    }

    #[test]
    fn invert_bits_preserves_indeterminate() {
        let stream = vec![Bit::Zero, Bit::One, Bit::Indeterminate];
        let inverted = invert_bits(&stream);
        assert_eq!(inverted, vec![Bit::One, Bit::Zero, Bit::Indeterminate]);
    }
}
