//! Arbitrary audio file loading for the CLI's `decode`/`demo`
//! subcommands: decode via symphonia, mix down to mono, resample to the
//! receiver's sample rate via rubato.

use std::fs::File;
use std::path::Path;

use rubato::{FastFixedIn, Resampler};
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::errors::AudioError;

/// Load an audio file and resample it to `target_sample_rate`, mixed
/// down to a single monaural channel.
pub fn load_audio_file(path: &Path, target_sample_rate: usize) -> Result<Vec<f32>, AudioError> {
    let path_str = || path.to_string_lossy().into_owned();

    let file = File::open(path).map_err(|e| AudioError::LoadFailed {
        path: path_str(),
        reason: format!("failed to open file: {e}"),
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();
    let decoder_opts = DecoderOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| AudioError::LoadFailed {
            path: path_str(),
            reason: format!("failed to probe format: {e}"),
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::LoadFailed {
            path: path_str(),
            reason: "no audio track found".to_string(),
        })?;

    let track_id = track.id;
    let source_sample_rate = track.codec_params.sample_rate.ok_or_else(|| AudioError::LoadFailed {
        path: path_str(),
        reason: "unknown sample rate".to_string(),
    })?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|e| AudioError::LoadFailed {
            path: path_str(),
            reason: format!("failed to create decoder: {e}"),
        })?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(_) => break,
        };
        if packet.track_id() != track_id {
            continue;
        }
        if let Ok(decoded) = decoder.decode(&packet) {
            samples.extend_from_slice(&convert_to_mono_f32(&decoded));
        }
    }

    if samples.is_empty() {
        return Err(AudioError::LoadFailed {
            path: path_str(),
            reason: "no audio samples decoded".to_string(),
        });
    }

    if source_sample_rate as usize == target_sample_rate {
        Ok(samples)
    } else {
        resample_audio(&samples, source_sample_rate as usize, target_sample_rate, &path_str())
    }
}

fn convert_to_mono_f32(buffer: &AudioBufferRef) -> Vec<f32> {
    macro_rules! mixdown {
        ($buf:expr, $to_f32:expr) => {{
            let channels = $buf.spec().channels.count();
            let frames = $buf.frames();
            let mut mono = Vec::with_capacity(frames);
            for i in 0..frames {
                let mut sum = 0.0f32;
                for ch in 0..channels {
                    sum += $to_f32($buf.chan(ch)[i]);
                }
                mono.push(sum / channels as f32);
            }
            mono
        }};
    }

    match buffer {
        AudioBufferRef::F32(buf) => mixdown!(buf, |s: f32| s),
        AudioBufferRef::F64(buf) => mixdown!(buf, |s: f64| s as f32),
        AudioBufferRef::U8(buf) => mixdown!(buf, |s: u8| (s as f32 - 128.0) / 128.0),
        AudioBufferRef::U16(buf) => mixdown!(buf, |s: u16| (s as f32 - 32_768.0) / 32_768.0),
        AudioBufferRef::U24(buf) => {
            mixdown!(buf, |s: symphonia::core::sample::u24| (s.inner() as i32 - 8_388_608) as f32 / 8_388_608.0)
        }
        AudioBufferRef::U32(buf) => mixdown!(buf, |s: u32| (s as f32 - 2_147_483_648.0) / 2_147_483_648.0),
        AudioBufferRef::S8(buf) => mixdown!(buf, |s: i8| s as f32 / 128.0),
        AudioBufferRef::S16(buf) => mixdown!(buf, |s: i16| s as f32 / 32_768.0),
        AudioBufferRef::S24(buf) => mixdown!(buf, |s: symphonia::core::sample::i24| s.inner() as f32 / 8_388_608.0),
        AudioBufferRef::S32(buf) => mixdown!(buf, |s: i32| s as f32 / 2_147_483_648.0),
    }
}

fn resample_audio(
    samples: &[f32],
    source_rate: usize,
    target_rate: usize,
    path: &str,
) -> Result<Vec<f32>, AudioError> {
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let fail = |reason: String| AudioError::ResampleFailed {
        path: path.to_string(),
        source_rate,
        target_rate,
        reason,
    };

    let chunk_size = source_rate;
    let mut resampler = FastFixedIn::<f32>::new(
        target_rate as f64 / source_rate as f64,
        1.0,
        rubato::PolynomialDegree::Linear,
        chunk_size,
        1,
    )
    .map_err(|e| fail(format!("failed to create resampler: {e}")))?;

    let mut output = Vec::new();
    let mut input_buf = vec![Vec::new(); 1];

    for chunk in samples.chunks(chunk_size) {
        input_buf[0].clear();
        input_buf[0].extend_from_slice(chunk);
        if input_buf[0].len() < chunk_size {
            input_buf[0].resize(chunk_size, 0.0);
        }

        let out = resampler
            .process(&input_buf, None)
            .map_err(|e| fail(format!("resampling failed: {e}")))?;
        output.extend_from_slice(&out[0]);
    }

    Ok(output)
}

/// Pad or truncate decoded file audio to exactly one decode window.
pub fn fit_to_window(audio: &[f32], window_len: usize) -> Vec<f32> {
    if audio.len() >= window_len {
        audio[..window_len].to_vec()
    } else {
        let mut out = audio.to_vec();
        out.resize(window_len, 0.0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_to_window_truncates_long_audio() {
        let audio = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(fit_to_window(&audio, 3), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn fit_to_window_pads_short_audio_with_zeros() {
        let audio = vec![1.0, 2.0];
        assert_eq!(fit_to_window(&audio, 5), vec![1.0, 2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn fit_to_window_exact_length_is_unchanged() {
        let audio = vec![1.0, 2.0, 3.0];
        assert_eq!(fit_to_window(&audio, 3), audio);
    }
}
