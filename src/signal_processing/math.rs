use crate::constants::MAGNITUDE_EPSILON;

/// Root-mean-square level of a block of samples
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Largest absolute sample value
pub fn peak_abs(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}

/// Convert a linear amplitude to dB, floored at `MAGNITUDE_EPSILON`
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    20.0 * (amplitude.abs() + MAGNITUDE_EPSILON).log10()
}
