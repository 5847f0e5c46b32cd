//! Configuration for the capture window and its spectral analysis.
//!
//! All values are fixed at start-up. They come from `VttConfig::default()`,
//! optionally overridden by a TOML file and then by command-line arguments.
//!
//! ```toml
//! [audio]
//! sample_rate = 8000
//! window = "3s"          # or 3, 2.5, "2500ms"
//!
//! [analysis]
//! window_function = "hann"
//!
//! [display]
//! redraw_rate_hz = 30.0
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{
    CAPTURE_BLOCK_SIZE, PROCESSING_SAMPLE_RATE, PROCESSING_WINDOW_SECONDS, REDRAW_RATE_HZ,
    SEGMENTS_PER_SECOND,
};
use crate::error::{Result, VttError};

/// Length of the trailing capture window
///
/// # Parsing formats
/// - `3` - seconds (no suffix)
/// - `3s` or `2.5s` - seconds (explicit)
/// - `2500ms` - milliseconds
///
/// # Example
/// ```
/// use simple_vtt::config::WindowDuration;
///
/// let window: WindowDuration = "2500ms".parse().unwrap();
/// assert!((window.as_secs() - 2.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawWindowDuration")]
pub struct WindowDuration(f32);

impl WindowDuration {
    /// Create from a length in seconds
    pub fn from_secs(secs: f32) -> Self {
        Self(secs)
    }

    /// Create from a length in milliseconds
    pub fn from_millis(ms: f32) -> Self {
        Self(ms / 1000.0)
    }

    /// Get the length in seconds
    pub fn as_secs(&self) -> f32 {
        self.0
    }

    /// Number of samples this window spans at `sample_rate`
    pub fn samples(&self, sample_rate: u32) -> usize {
        (self.0 * sample_rate as f32).round() as usize
    }
}

impl Default for WindowDuration {
    fn default() -> Self {
        Self::from_secs(PROCESSING_WINDOW_SECONDS as f32)
    }
}

impl fmt::Display for WindowDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl FromStr for WindowDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(num) = s.strip_suffix("ms") {
            let ms: f32 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid window duration: {}", s))?;
            if !ms.is_finite() || ms <= 0.0 {
                return Err("window duration must be positive".to_string());
            }
            return Ok(Self::from_millis(ms));
        }

        let num = s.strip_suffix('s').unwrap_or(s);
        let secs: f32 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid window duration: {}", s))?;
        if !secs.is_finite() || secs <= 0.0 {
            return Err("window duration must be positive".to_string());
        }
        Ok(Self::from_secs(secs))
    }
}

/// TOML form of a window length: a bare number of seconds or a suffixed string
#[derive(Deserialize)]
#[serde(untagged)]
enum RawWindowDuration {
    Seconds(f64),
    Text(String),
}

impl TryFrom<RawWindowDuration> for WindowDuration {
    type Error = String;

    fn try_from(value: RawWindowDuration) -> std::result::Result<Self, Self::Error> {
        match value {
            RawWindowDuration::Seconds(secs) if secs.is_finite() && secs > 0.0 => {
                Ok(Self::from_secs(secs as f32))
            }
            RawWindowDuration::Seconds(_) => Err("window duration must be positive".to_string()),
            RawWindowDuration::Text(text) => text.parse(),
        }
    }
}

/// Analysis window applied to each STFT segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    /// Periodic Hann window
    #[default]
    Hann,
    /// Periodic Hamming window
    Hamming,
    /// No tapering
    Rectangular,
}

/// System-wide configuration
///
/// # Example
/// ```
/// use simple_vtt::config::VttConfig;
///
/// let config = VttConfig::default();
/// assert_eq!(config.audio.capacity(), 24000);
/// assert_eq!(config.analysis.segment_length(config.audio.sample_rate), 400);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VttConfig {
    /// Capture and ring buffer configuration
    pub audio: AudioConfig,
    /// STFT configuration
    pub analysis: AnalysisConfig,
    /// Monitor loop configuration
    pub display: DisplayConfig,
}

/// Capture and ring buffer configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Fixed sample rate in Hz; blocks at any other rate are rejected
    pub sample_rate: u32,
    /// Length of the trailing window held by the ring buffer
    pub window: WindowDuration,
    /// Block size requested from the capture device, in frames
    pub block_size: usize,
}

/// STFT configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Segments per second of sample rate; segment length is `rate / this`
    pub segments_per_second: u32,
    /// Taper applied to each segment
    pub window_function: WindowFunction,
    /// Overlap between consecutive segments in samples; half a segment if unset
    pub overlap: Option<usize>,
    /// Extend the signal by half a segment of zeros on both ends
    pub boundary: bool,
    /// Zero-pad the tail so the final segment is complete
    pub padded: bool,
}

/// Monitor loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Snapshot-and-transform rate in Hz, independent of the capture rate
    pub redraw_rate_hz: f32,
}

impl AudioConfig {
    /// Ring buffer capacity in samples (sample rate × window length)
    pub fn capacity(&self) -> usize {
        self.window.samples(self.sample_rate)
    }
}

impl AnalysisConfig {
    /// Segment length for `sample_rate`, `round(sample_rate / segments_per_second)`
    pub fn segment_length(&self, sample_rate: u32) -> usize {
        (sample_rate as f64 / self.segments_per_second.max(1) as f64).round() as usize
    }
}

impl DisplayConfig {
    /// Interval between monitor ticks
    pub fn redraw_interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.redraw_rate_hz)
    }
}

impl VttConfig {
    /// Parse a TOML document; missing tables and fields take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| VttError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| VttError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Check that every derived quantity is usable
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(VttError::Config("sample rate must be positive".into()));
        }
        if self.audio.block_size == 0 {
            return Err(VttError::Config("block size must be positive".into()));
        }
        if self.audio.capacity() == 0 {
            return Err(VttError::Config(format!(
                "window {} holds no samples at {} Hz",
                self.audio.window, self.audio.sample_rate
            )));
        }
        if self.analysis.segments_per_second == 0 {
            return Err(VttError::Config(
                "segments per second must be positive".into(),
            ));
        }

        let segment_length = self.analysis.segment_length(self.audio.sample_rate);
        if segment_length == 0 || segment_length > self.audio.capacity() {
            return Err(VttError::Config(format!(
                "segment length {} does not fit a window of {} samples",
                segment_length,
                self.audio.capacity()
            )));
        }
        if let Some(overlap) = self.analysis.overlap {
            if overlap >= segment_length {
                return Err(VttError::Config(format!(
                    "overlap {} must be smaller than segment length {}",
                    overlap, segment_length
                )));
            }
        }

        if !self.display.redraw_rate_hz.is_finite() || self.display.redraw_rate_hz <= 0.0 {
            return Err(VttError::Config("redraw rate must be positive".into()));
        }
        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: PROCESSING_SAMPLE_RATE,
            window: WindowDuration::default(),
            block_size: CAPTURE_BLOCK_SIZE,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            segments_per_second: SEGMENTS_PER_SECOND,
            window_function: WindowFunction::Hann,
            overlap: None,
            boundary: true,
            padded: true,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            redraw_rate_hz: REDRAW_RATE_HZ,
        }
    }
}
