//! Top-level decode orchestration (spec.md §4.6 minus the state machine,
//! which lives in `session`): wires demodulator -> synchronizer -> payload
//! extractor -> cryptographic unsealer -> packet unwrapper for one
//! `AudioWindow`.

use crate::config::{ReceiverConfig, WaveformKind, DSSS_CARRIER_POOL_HZ};
use crate::crypto::{self, SymmetricKey};
use crate::logging::ReceiverLogger;
use crate::packet::{self, MessageRecord};
use crate::payload;
use crate::sync::{self, SyncMatch};
use crate::waveform::{self, Bit, LinearChirp, RawBitStream, WaveformVariant};

/// Run one full decode attempt over `window`. Returns `None` for a silent
/// failure (`NoSignal`/`MalformedFrame`, per spec.md §7); returns
/// `Some(MessageRecord)` for both successful decodes and the recovered
/// `status = ERROR` records (`CorruptData`/`AuthFailure`/`MalformedPlaintext`).
pub fn decode_window(
    window: &[f32],
    config: &ReceiverConfig,
    logger: &mut ReceiverLogger,
) -> Option<MessageRecord> {
    if window.is_empty() {
        logger.trace("DEMOD", "empty window, nothing to decode");
        return None;
    }

    if config.waveform == WaveformKind::Chirp {
        return decode_chirp_window(window, config, logger);
    }

    let carriers: &[f64] = if config.auto_scan && waveform::is_carrier_sweepable(config.waveform) {
        &DSSS_CARRIER_POOL_HZ
    } else {
        &[crate::config::DEFAULT_DSSS_CARRIER_HZ]
    };

    for &carrier_hz in carriers {
        let variant = waveform::build_variant_with_carrier(config, carrier_hz);
        if let Some(record) = try_decode_with_variant(variant.as_ref(), window, config, logger) {
            return Some(record);
        }
    }

    None
}

fn try_decode_with_variant(
    variant: &dyn WaveformVariant,
    window: &[f32],
    config: &ReceiverConfig,
    logger: &mut ReceiverLogger,
) -> Option<MessageRecord> {
    let profile = variant.profile();
    let bits = variant.demodulate(window);

    let sync_match = sync::find_sync(&bits, &profile)?;
    logger.debug("SYNC", format!("sync found at bit offset {}", sync_match.offset));

    let remainder = oriented_remainder(&bits, sync_match);
    frame_to_record(&remainder, config, logger)
}

/// Slice the bitstream at the payload offset, flipping every bit back if
/// the sync word matched in its inverted (carrier-flipped) form.
fn oriented_remainder(bits: &RawBitStream, sync_match: SyncMatch) -> RawBitStream {
    let tail = &bits[sync_match.offset..];
    if sync_match.inverted {
        sync::invert_bits(tail)
    } else {
        tail.to_vec()
    }
}

/// From a payload-aligned, polarity-corrected bitstream: extract the
/// length-prefixed triple-redundant payload, unseal it, and unwrap the
/// packet. Malformed-frame failures are silent (`None`); crypto/packet
/// failures recover into an `ERROR`-status record.
fn frame_to_record(
    remainder: &[Bit],
    config: &ReceiverConfig,
    logger: &mut ReceiverLogger,
) -> Option<MessageRecord> {
    let sealed_blob = match payload::extract_payload(remainder) {
        Ok(bytes) => bytes,
        Err(e) => {
            logger.trace("PAYLOAD", format!("no frame: {e}"));
            return None;
        }
    };

    let key = SymmetricKey::new(config.key);
    let plaintext = match crypto::unseal(&sealed_blob, &key) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            logger.warn("CRYPTO", format!("unseal failed: {e}"));
            return Some(MessageRecord::error(crypto_error_message(&e)));
        }
    };

    match packet::unwrap_packet(&plaintext, config.verify_key.as_ref()) {
        Ok(record) => Some(record),
        Err(e) => {
            logger.warn("PACKET", format!("unwrap failed: {e}"));
            Some(MessageRecord::error("JSON parse failed"))
        }
    }
}

fn crypto_error_message(err: &crate::errors::CryptoError) -> &'static str {
    use crate::errors::CryptoError;
    match err {
        CryptoError::CorruptData => "Corrupt Data",
        CryptoError::AuthFailure => "Decryption failed",
        CryptoError::UnsupportedCipher => "ChaCha20 not supported",
    }
}

/// Chirp-variant decode path: synchronization and payload extraction run
/// in the correlator/peak domain (spec.md §4.2 point 4, §4.3), so this
/// bypasses the generic `sync`/`payload` modules entirely rather than
/// going through a flat `RawBitStream`.
fn decode_chirp_window(
    window: &[f32],
    config: &ReceiverConfig,
    logger: &mut ReceiverLogger,
) -> Option<MessageRecord> {
    let chirp = LinearChirp::new(config.sample_rate);
    let payload_start = chirp.find_preamble(window)?;
    logger.debug("SYNC", format!("chirp preamble found, payload starts at sample {payload_start}"));

    // Read the 16-bit length field first to learn how many more symbols
    // are needed, then read the full triple-redundant frame.
    let header_bits = chirp.read_symbols(window, payload_start, 16);
    let (length, _) = payload::extract_length(&header_bits).ok()?;

    let total_symbols = 16 + length as usize * 8 * 3;
    let all_bits = chirp.read_symbols(window, payload_start, total_symbols);
    if all_bits.len() < total_symbols {
        logger.trace("PAYLOAD", "chirp frame truncated before majority vote");
        return None;
    }

    frame_to_record(&all_bits, config, logger)
}
