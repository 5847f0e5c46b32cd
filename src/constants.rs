//! Fixed processing parameters and numeric thresholds.
//!
//! The processing rate and window length describe the trailing audio window
//! the analysis runs over. Everything else in the pipeline is derived from
//! these two values.

/// Sample rate of the processing window in Hz.
pub const PROCESSING_SAMPLE_RATE: u32 = 8000;

/// Length of the trailing processing window in seconds.
pub const PROCESSING_WINDOW_SECONDS: u32 = 3;

/// Analysis segments per second of sample rate.
/// The segment length is `round(sample_rate / SEGMENTS_PER_SECOND)`.
pub const SEGMENTS_PER_SECOND: u32 = 20;

/// Capture block size requested from the audio device, in frames.
/// Smaller blocks underrun on some ALSA setups.
pub const CAPTURE_BLOCK_SIZE: usize = 3000;

/// Default redraw rate of the monitor loop in Hz.
pub const REDRAW_RATE_HZ: f32 = 30.0;

/// Floor added to magnitudes before converting to decibels.
pub const MAGNITUDE_EPSILON: f32 = 1e-10;

/// Minimum RMS treated as signal rather than silence.
pub const MIN_RMS_THRESHOLD: f32 = 1e-6;
