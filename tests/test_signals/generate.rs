use std::f32::consts::PI;
use std::path::Path;

/// Sine of `amplitude` at `freq_hz`, phase zero at the first sample
pub fn generate_sine(
    freq_hz: f32,
    sample_rate: u32,
    num_samples: usize,
    amplitude: f32,
) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * PI * freq_hz * t).sin()
        })
        .collect()
}

#[allow(dead_code)]
pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Write mono 16-bit PCM
#[allow(dead_code)]
pub fn save_mono_wav<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    use hound::{WavSpec, WavWriter};

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sine_length_and_range() {
        let signal = generate_sine(440.0, 8000, 8000, 0.5);
        assert_eq!(signal.len(), 8000);
        assert!(signal.iter().all(|s| s.abs() <= 0.5 + 1e-6));
        assert_eq!(signal[0], 0.0);
    }
}
