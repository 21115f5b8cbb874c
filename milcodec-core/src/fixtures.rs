//! Reference-sender fixtures: build a synthetic `AudioWindow` carrying a
//! given JSON message through the full framing and crypto stack, the way
//! a compliant sender would. Used by tests and the CLI `demo` subcommand
//! — there is no original reference sender in this corpus to adapt.

use std::f64::consts::TAU;

use crate::config::{
    ReceiverConfig, WaveformKind, BARKER31, BURST_SAMPLES_PER_SYMBOL, DEFAULT_DSSS_CARRIER_HZ,
    DSSS_SAMPLES_PER_CHIP_HEAVY, DSSS_SAMPLES_PER_CHIP_STANDARD, FSK_MARK_HZ, FSK_SPACE_HZ,
    FSK_SYMBOL_MS, HEAVY_DUTY_CARRIER_HZ, SYNC_WORD_16, SYNC_WORD_32,
};
use crate::utils::{bytes_to_bits, int_to_bits};
use crate::waveform::{Bit, LinearChirp};

/// Build a complete frame (sync/preamble, length-prefixed triple-redundant
/// payload, ChaCha20-Poly1305-sealed) carrying `json_body`, modulated onto
/// a synthetic `AudioWindow` according to `config.waveform`.
pub fn synthesize_frame(
    config: &ReceiverConfig,
    json_body: &str,
    type_byte: u8,
    signature: [u8; 64],
) -> Vec<f32> {
    let plaintext = build_plaintext(type_byte, signature, json_body);
    let sealed = seal(&plaintext, &config.key);
    synthesize_frame_from_sealed(config, &sealed)
}

/// Like `synthesize_frame`, but skips straight to modulating an
/// already-sealed blob. Used to build fixtures that deliberately fail
/// decryption (e.g. a tampered ciphertext byte).
fn synthesize_frame_from_sealed(config: &ReceiverConfig, sealed: &[u8]) -> Vec<f32> {
    let length = sealed.len() as u16;
    let mut frame_bits = int_to_bits(length as u64, 16);
    let payload_bits = bytes_to_bits(sealed);
    frame_bits.extend(payload_bits.iter());
    frame_bits.extend(payload_bits.iter());
    frame_bits.extend(payload_bits.iter());

    match config.waveform {
        WaveformKind::Chirp => {
            let chirp = LinearChirp::new(config.sample_rate);
            let mut audio = chirp.preamble_audio();
            audio.extend(chirp.render_bits(&as_bits(&frame_bits)));
            audio
        }
        WaveformKind::Fsk2 => {
            let mut bits = int_to_bits(SYNC_WORD_16 as u64, 16);
            bits.extend(frame_bits);
            modulate_fsk(&bits, config.sample_rate)
        }
        _ => {
            let mut bits = int_to_bits(SYNC_WORD_32 as u64, 32);
            bits.extend(frame_bits);
            modulate_dsss(&bits, config)
        }
    }
}

/// Corrupt the final ciphertext byte of a just-synthesized frame in place,
/// by reconstructing the sealed blob, flipping its last byte, and
/// re-modulating. Exercises spec.md §8's AEAD law (test scenario (e)).
pub fn corrupt_final_ciphertext_bit(audio: &mut Vec<f32>, config: &ReceiverConfig) {
    let plaintext = build_plaintext(0x01, [0u8; 64], r#"{"m":"tamper"}"#);
    let mut sealed = seal(&plaintext, &config.key);
    let last = sealed.len() - 1;
    sealed[last] ^= 0x01;
    *audio = synthesize_frame_from_sealed(config, &sealed);
}

fn as_bits(raw: &[u8]) -> Vec<Bit> {
    raw.iter().map(|&b| if b == 1 { Bit::One } else { Bit::Zero }).collect()
}

fn build_plaintext(type_byte: u8, signature: [u8; 64], json_body: &str) -> Vec<u8> {
    let mut out = vec![type_byte];
    out.extend_from_slice(&signature);
    out.extend_from_slice(json_body.as_bytes());
    out
}

fn seal(plaintext: &[u8], key: &[u8; 32]) -> Vec<u8> {
    use chacha20poly1305::aead::{Aead, KeyInit};
    use chacha20poly1305::{ChaCha20Poly1305, Nonce};

    let cipher = ChaCha20Poly1305::new_from_slice(key).expect("32-byte key");
    let nonce_bytes = [0x42u8; 12];
    let nonce = Nonce::from_slice(&nonce_bytes);
    let mut blob = nonce_bytes.to_vec();
    blob.extend(cipher.encrypt(nonce, plaintext).expect("encryption cannot fail here"));
    blob
}

fn spread_template(samples_per_chip: usize) -> Vec<f32> {
    BARKER31
        .iter()
        .flat_map(|&chip| std::iter::repeat(chip as f32).take(samples_per_chip))
        .collect()
}

fn modulate_with_template(bits: &[u8], sample_rate: usize, carrier_hz: f64, template: &[f32]) -> Vec<f32> {
    let sps = template.len();
    let dt = 1.0 / sample_rate as f64;
    let mut out = Vec::with_capacity(bits.len() * sps);
    for (sym_idx, &bit) in bits.iter().enumerate() {
        let polarity = if bit == 1 { 1.0 } else { -1.0 };
        for (offset, &chip) in template.iter().enumerate() {
            let n = sym_idx * sps + offset;
            let angle = TAU * carrier_hz * (n as f64) * dt;
            out.push((polarity * chip as f64 * angle.cos()) as f32);
        }
    }
    out
}

fn modulate_dsss(bits: &[u8], config: &ReceiverConfig) -> Vec<f32> {
    match config.waveform {
        WaveformKind::DsssBurst => {
            let template = vec![1.0f32; BURST_SAMPLES_PER_SYMBOL];
            modulate_with_template(bits, config.sample_rate, DEFAULT_DSSS_CARRIER_HZ, &template)
        }
        WaveformKind::DsssHeavyDuty => {
            let template = spread_template(DSSS_SAMPLES_PER_CHIP_HEAVY);
            modulate_with_template(bits, config.sample_rate, HEAVY_DUTY_CARRIER_HZ, &template)
        }
        _ => {
            let template = spread_template(DSSS_SAMPLES_PER_CHIP_STANDARD);
            modulate_with_template(bits, config.sample_rate, DEFAULT_DSSS_CARRIER_HZ, &template)
        }
    }
}

fn modulate_fsk(bits: &[u8], sample_rate: usize) -> Vec<f32> {
    let symbol_len = (sample_rate as f64 * FSK_SYMBOL_MS / 1000.0).round() as usize;
    let dt = 1.0 / sample_rate as f64;
    let mut out = Vec::with_capacity(bits.len() * symbol_len);
    let mut n0 = 0usize;
    for &bit in bits {
        let freq = if bit == 1 { FSK_MARK_HZ } else { FSK_SPACE_HZ };
        for i in 0..symbol_len {
            let n = n0 + i;
            out.push((TAU * freq * (n as f64) * dt).sin() as f32);
        }
        n0 += symbol_len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::decode::decode_window;
    use crate::logging::{LogConfig, ReceiverLogger};

    #[test]
    fn synthesized_dsss_frame_decodes_through_the_full_pipeline() {
        let config = ReceiverConfig::default();
        let audio = synthesize_frame(&config, r#"{"p":"ROUTINE","m":"HELLO"}"#, 0x01, [0u8; 64]);
        let mut logger = ReceiverLogger::new(LogConfig::default());
        let record = decode_window(&audio, &config, &mut logger).expect("fixture should decode");
        assert_eq!(record.content, "HELLO");
    }

    #[test]
    fn synthesized_fsk_frame_decodes() {
        let mut config = ReceiverConfig::default();
        config.waveform = WaveformKind::Fsk2;
        let audio = synthesize_frame(&config, r#"{"m":"tone"}"#, 0x01, [0u8; 64]);
        let mut logger = ReceiverLogger::new(LogConfig::default());
        let record = decode_window(&audio, &config, &mut logger).expect("fixture should decode");
        assert_eq!(record.content, "tone");
    }

    #[test]
    fn synthesized_chirp_frame_decodes() {
        let mut config = ReceiverConfig::default();
        config.waveform = WaveformKind::Chirp;
        let audio = synthesize_frame(&config, r#"{"m":"sweep"}"#, 0x01, [0u8; 64]);
        let mut logger = ReceiverLogger::new(LogConfig::default());
        let record = decode_window(&audio, &config, &mut logger).expect("fixture should decode");
        assert_eq!(record.content, "sweep");
    }

    #[test]
    fn burst_mode_fixture_decodes() {
        let mut config = ReceiverConfig::default();
        config.set_mode(Mode::Burst);
        let audio = synthesize_frame(&config, r#"{"m":"burst"}"#, 0x01, [0u8; 64]);
        let mut logger = ReceiverLogger::new(LogConfig::default());
        let record = decode_window(&audio, &config, &mut logger).expect("fixture should decode");
        assert_eq!(record.content, "burst");
    }
}
