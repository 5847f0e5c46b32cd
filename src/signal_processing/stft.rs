//! Short-time Fourier transform over a fixed window of samples.
//!
//! The window is cut into overlapping segments, each tapered and transformed
//! with a forward FFT. Only the non-negative frequency half of each spectrum is
//! kept. Defaults follow the usual spectral-analysis conventions:
//!
//! - periodic Hann taper, 50% overlap
//! - half a segment of zeros added at both ends so the first segment is
//!   centred on the first sample
//! - zero padding at the tail so the last segment is complete
//! - coefficients scaled by `1 / sum(window)`, so a sinusoid of amplitude `A`
//!   centred on a bin shows a magnitude of `A / 2`

use num_complex::Complex;
use rustfft::FftPlanner;

use crate::config::{AnalysisConfig, WindowFunction};
use crate::constants::{MAGNITUDE_EPSILON, SEGMENTS_PER_SECOND};
use crate::error::{Result, VttError};
use crate::signal_processing::window::window_coefficients;

/// Segmentation and tapering parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StftOptions {
    pub window_function: WindowFunction,
    /// Samples shared by consecutive segments; `segment_length / 2` if `None`
    pub overlap: Option<usize>,
    /// Extend the input by `segment_length / 2` zeros on both ends
    pub boundary: bool,
    /// Zero-pad the tail so the input splits into whole segments
    pub padded: bool,
}

impl Default for StftOptions {
    fn default() -> Self {
        Self {
            window_function: WindowFunction::Hann,
            overlap: None,
            boundary: true,
            padded: true,
        }
    }
}

impl From<&AnalysisConfig> for StftOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            window_function: config.window_function,
            overlap: config.overlap,
            boundary: config.boundary,
            padded: config.padded,
        }
    }
}

/// One STFT result: complex coefficients indexed by (segment, bin)
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralFrame {
    /// Bin centre frequencies in Hz, ascending from 0 to Nyquist
    pub frequencies: Vec<f32>,
    /// Segment centre times in seconds relative to the first input sample
    pub times: Vec<f32>,
    /// Row-major `[segment][bin]`
    coefficients: Vec<Complex<f32>>,
    segment_length: usize,
    sample_rate: u32,
}

impl SpectralFrame {
    pub fn num_segments(&self) -> usize {
        self.times.len()
    }

    pub fn num_bins(&self) -> usize {
        self.frequencies.len()
    }

    pub fn segment_length(&self) -> usize {
        self.segment_length
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Complex spectrum of one segment
    pub fn segment(&self, segment: usize) -> Option<&[Complex<f32>]> {
        let bins = self.num_bins();
        let start = segment.checked_mul(bins)?;
        let end = start.checked_add(bins)?;
        self.coefficients.get(start..end)
    }

    pub fn coefficient(&self, segment: usize, bin: usize) -> Option<Complex<f32>> {
        if bin >= self.num_bins() {
            return None;
        }
        let index = segment.checked_mul(self.num_bins())?.checked_add(bin)?;
        self.coefficients.get(index).copied()
    }

    pub fn magnitude(&self, segment: usize, bin: usize) -> Option<f32> {
        self.coefficient(segment, bin).map(|c| c.norm())
    }

    /// Magnitude in dB, floored at `MAGNITUDE_EPSILON`
    pub fn magnitude_db(&self, segment: usize, bin: usize) -> Option<f32> {
        self.magnitude(segment, bin)
            .map(|m| 20.0 * (m + MAGNITUDE_EPSILON).log10())
    }

    /// Magnitude matrix, one row per segment
    pub fn magnitudes(&self) -> Vec<Vec<f32>> {
        self.coefficients
            .chunks(self.num_bins().max(1))
            .map(|row| row.iter().map(|c| c.norm()).collect())
            .collect()
    }

    /// Bin with the largest magnitude in `segment`
    pub fn peak_bin(&self, segment: usize) -> Option<usize> {
        let row = self.segment(segment)?;
        row.iter()
            .map(|c| c.norm())
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, m)| match best {
                Some((_, best_m)) if best_m >= m => best,
                _ => Some((i, m)),
            })
            .map(|(i, _)| i)
    }

    /// Bin whose centre frequency is closest to `frequency_hz`
    pub fn nearest_bin(&self, frequency_hz: f32) -> usize {
        let spacing = self.sample_rate as f32 / self.segment_length as f32;
        let bin = (frequency_hz / spacing).round().max(0.0) as usize;
        bin.min(self.num_bins().saturating_sub(1))
    }
}

/// Compute the STFT of `window` with explicit segment length
pub fn stft(
    window: &[f32],
    sample_rate: u32,
    segment_length: usize,
    options: &StftOptions,
) -> Result<SpectralFrame> {
    if sample_rate == 0 {
        return Err(VttError::Config("sample rate must be positive".into()));
    }
    if segment_length == 0 {
        return Err(VttError::Config(format!(
            "segment length is zero at {} Hz",
            sample_rate
        )));
    }
    if window.is_empty() || window.len() < segment_length {
        return Err(VttError::InsufficientSamples {
            needed: segment_length,
            available: window.len(),
        });
    }

    let overlap = options.overlap.unwrap_or(segment_length / 2);
    if overlap >= segment_length {
        return Err(VttError::Config(format!(
            "overlap {} must be smaller than segment length {}",
            overlap, segment_length
        )));
    }
    let hop = segment_length - overlap;

    let signal = extend_signal(window, segment_length, hop, options);
    let num_segments = (signal.len() - segment_length) / hop + 1;
    let num_bins = segment_length / 2 + 1;

    let taper = window_coefficients(options.window_function, segment_length);
    let scale = 1.0 / taper.iter().map(|&w| w as f64).sum::<f64>() as f32;

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(segment_length);
    let mut scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];
    let mut buf = vec![Complex::default(); segment_length];
    let mut coefficients = Vec::with_capacity(num_segments * num_bins);

    for segment in signal.windows(segment_length).step_by(hop) {
        for ((slot, &x), &w) in buf.iter_mut().zip(segment).zip(&taper) {
            *slot = Complex::new(x * w, 0.0);
        }
        fft.process_with_scratch(&mut buf, &mut scratch);
        coefficients.extend(buf[..num_bins].iter().map(|&c| c * scale));
    }
    debug_assert_eq!(coefficients.len(), num_segments * num_bins);

    let rate = sample_rate as f32;
    let frequencies = (0..num_bins)
        .map(|k| k as f32 * rate / segment_length as f32)
        .collect();

    let first_centre = if options.boundary {
        0.0
    } else {
        segment_length as f32 / 2.0
    };
    let times = (0..num_segments)
        .map(|k| (first_centre + (k * hop) as f32) / rate)
        .collect();

    Ok(SpectralFrame {
        frequencies,
        times,
        coefficients,
        segment_length,
        sample_rate,
    })
}

/// Apply boundary extension and tail padding
fn extend_signal(
    window: &[f32],
    segment_length: usize,
    hop: usize,
    options: &StftOptions,
) -> Vec<f32> {
    let edge = if options.boundary { segment_length / 2 } else { 0 };
    let mut signal = Vec::with_capacity(window.len() + 2 * edge + hop);
    signal.resize(edge, 0.0);
    signal.extend_from_slice(window);
    signal.resize(signal.len() + edge, 0.0);

    if options.padded {
        let remainder = (signal.len() - segment_length) % hop;
        if remainder != 0 {
            signal.resize(signal.len() + hop - remainder, 0.0);
        }
    }
    signal
}

/// Stateless magnitude STFT with a segment length tied to the sample rate
///
/// Holds only immutable parameters; every call plans its own FFT, so one
/// analyzer can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    options: StftOptions,
    segments_per_second: u32,
}

impl SpectralAnalyzer {
    pub fn new() -> Self {
        Self::with_options(StftOptions::default())
    }

    pub fn with_options(options: StftOptions) -> Self {
        Self {
            options,
            segments_per_second: SEGMENTS_PER_SECOND,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            options: StftOptions::from(config),
            segments_per_second: config.segments_per_second.max(1),
        }
    }

    pub fn options(&self) -> &StftOptions {
        &self.options
    }

    /// `round(sample_rate / segments_per_second)`
    pub fn segment_length(&self, sample_rate: u32) -> usize {
        (sample_rate as f64 / self.segments_per_second as f64).round() as usize
    }

    pub fn transform(&self, window: &[f32], sample_rate: u32) -> Result<SpectralFrame> {
        if sample_rate == 0 {
            return Err(VttError::Config("sample rate must be positive".into()));
        }
        self.transform_with(window, sample_rate, self.segment_length(sample_rate))
    }

    pub fn transform_with(
        &self,
        window: &[f32],
        sample_rate: u32,
        segment_length: usize,
    ) -> Result<SpectralFrame> {
        stft(window, sample_rate, segment_length, &self.options)
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sample_rate: u32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_shape_default_window() {
        let frame = SpectralAnalyzer::new()
            .transform(&vec![0.0; 24000], 8000)
            .unwrap();

        assert_eq!(frame.segment_length(), 400);
        assert_eq!(frame.num_bins(), 201);
        // 24000 + 2*200 boundary samples, hop 200
        assert_eq!(frame.num_segments(), 121);
        assert!((frame.frequencies[1] - 20.0).abs() < 1e-4);
        assert!((frame.frequencies[200] - 4000.0).abs() < 1e-3);
        assert_eq!(frame.times[0], 0.0);
        assert!((frame.times[120] - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_silence_has_no_energy() {
        let frame = SpectralAnalyzer::new()
            .transform(&vec![0.0; 8000], 8000)
            .unwrap();
        for row in frame.magnitudes() {
            assert!(row.iter().all(|&m| m == 0.0));
        }
    }

    #[test]
    fn test_sine_peak_at_nearest_bin() {
        let samples = sine(440.0, 8000, 8000, 1.0);
        let frame = SpectralAnalyzer::new().transform(&samples, 8000).unwrap();
        let expected = frame.nearest_bin(440.0);
        assert_eq!(expected, 22);

        // Interior segments only see the sine
        for seg in 2..frame.num_segments() - 2 {
            assert_eq!(frame.peak_bin(seg), Some(expected), "segment {}", seg);
            let peak = frame.magnitude(seg, expected).unwrap();
            assert!((peak - 0.5).abs() < 1e-3, "segment {} peak {}", seg, peak);
        }
    }

    #[test]
    fn test_off_bin_sine_peaks_nearby() {
        let samples = sine(1234.0, 16000, 16000, 0.3);
        let frame = SpectralAnalyzer::new().transform(&samples, 16000).unwrap();
        // 800-sample segments, 20 Hz bins: 1234 Hz sits nearest bin 62 (1240 Hz)
        assert_eq!(frame.nearest_bin(1234.0), 62);
        assert_eq!(frame.peak_bin(10), Some(62));
    }

    #[test]
    fn test_constant_signal_dc_scaling() {
        let options = StftOptions {
            window_function: WindowFunction::Rectangular,
            overlap: Some(0),
            boundary: false,
            padded: false,
        };
        let frame = stft(&vec![0.25; 100], 100, 10, &options).unwrap();
        assert_eq!(frame.num_segments(), 10);
        for seg in 0..frame.num_segments() {
            assert!((frame.magnitude(seg, 0).unwrap() - 0.25).abs() < 1e-6);
            assert!(frame.magnitude(seg, 1).unwrap() < 1e-6);
        }
        // Centres of non-extended segments
        assert!((frame.times[0] - 0.05).abs() < 1e-6);
        assert!((frame.times[1] - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_tail_padding_completes_last_segment() {
        let options = StftOptions {
            boundary: false,
            ..StftOptions::default()
        };
        // 10-sample segments, hop 5: 23 samples pad to 25 -> 4 segments
        let frame = stft(&vec![1.0; 23], 200, 10, &options).unwrap();
        assert_eq!(frame.num_segments(), 4);

        let unpadded = StftOptions {
            padded: false,
            ..options
        };
        let frame = stft(&vec![1.0; 23], 200, 10, &unpadded).unwrap();
        assert_eq!(frame.num_segments(), 3);
    }

    #[test]
    fn test_insufficient_samples() {
        let analyzer = SpectralAnalyzer::new();
        assert_eq!(
            analyzer.transform(&vec![0.0; 399], 8000),
            Err(VttError::InsufficientSamples {
                needed: 400,
                available: 399
            })
        );
        assert_eq!(
            analyzer.transform(&[], 8000),
            Err(VttError::InsufficientSamples {
                needed: 400,
                available: 0
            })
        );
    }

    #[test]
    fn test_invalid_parameters() {
        let analyzer = SpectralAnalyzer::new();
        assert!(matches!(
            analyzer.transform(&[0.0; 16], 0),
            Err(VttError::Config(_))
        ));
        // 5 Hz rounds to a zero-length segment
        assert!(matches!(
            analyzer.transform(&[0.0; 16], 5),
            Err(VttError::Config(_))
        ));

        let options = StftOptions {
            overlap: Some(8),
            ..StftOptions::default()
        };
        assert!(matches!(
            stft(&[0.0; 16], 100, 8, &options),
            Err(VttError::Config(_))
        ));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let samples: Vec<f32> = sine(300.0, 8000, 4000, 0.7)
            .iter()
            .zip(sine(2100.0, 8000, 4000, 0.2))
            .map(|(a, b)| a + b)
            .collect();
        let analyzer = SpectralAnalyzer::new();
        let a = analyzer.transform(&samples, 8000).unwrap();
        let b = analyzer.transform(&samples, 8000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_segment_accessors() {
        let frame = SpectralAnalyzer::new()
            .transform(&sine(440.0, 8000, 800, 1.0), 8000)
            .unwrap();
        assert_eq!(frame.segment(0).unwrap().len(), frame.num_bins());
        assert!(frame.segment(frame.num_segments()).is_none());
        assert!(frame.magnitude(0, frame.num_bins()).is_none());
        assert!(frame.peak_bin(frame.num_segments()).is_none());
        assert_eq!(frame.nearest_bin(1e9), frame.num_bins() - 1);
        assert_eq!(frame.nearest_bin(-50.0), 0);

        let db = frame.magnitude_db(2, 22).unwrap();
        assert!((db - 20.0 * 0.5f32.log10()).abs() < 0.05);
    }

    #[test]
    fn test_huge_segment_index_is_none() {
        let frame = SpectralAnalyzer::new()
            .transform(&vec![0.1; 800], 8000)
            .unwrap();
        assert!(frame.segment(usize::MAX).is_none());
        assert!(frame.peak_bin(usize::MAX).is_none());
        assert!(frame.magnitude(usize::MAX, 0).is_none());
        assert!(frame.magnitude_db(usize::MAX / 2, 3).is_none());
        assert!(frame.coefficient(0, usize::MAX).is_none());
    }

    #[test]
    fn test_from_config() {
        let config = AnalysisConfig {
            segments_per_second: 10,
            window_function: WindowFunction::Hamming,
            overlap: Some(100),
            boundary: false,
            padded: false,
        };
        let analyzer = SpectralAnalyzer::from_config(&config);
        assert_eq!(analyzer.segment_length(8000), 800);
        assert_eq!(analyzer.options().overlap, Some(100));

        let frame = analyzer.transform(&vec![0.0; 8000], 8000).unwrap();
        // (8000 - 800) / 700 + 1
        assert_eq!(frame.num_segments(), 11);
    }
}
