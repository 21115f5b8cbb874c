//! AWGN injection for property tests (spec.md §8 invariant 3: majority
//! vote recovers the payload under a bounded bit-error rate).

use rand::Rng;
use rand_distr::StandardNormal;

/// Add zero-mean Gaussian noise to audio samples. `noise_std` is relative
/// to full scale and scaled down by a factor of 10 so callers can reason
/// about it as a coarse SNR knob rather than a raw standard deviation.
pub fn apply_audio_noise<R: Rng>(audio: &[f32], noise_std: f64, rng: &mut R) -> Vec<f32> {
    audio
        .iter()
        .map(|&sample| {
            let noise: f64 = rng.sample::<f64, _>(StandardNormal) * (noise_std * 0.1);
            sample + noise as f32
        })
        .collect()
}
