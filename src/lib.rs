pub mod audio;
pub mod config;
pub mod constants;
pub mod error;
pub mod monitor;
pub mod output;
pub mod signal_processing;

pub use audio::{AudioRingBuffer, SampleBlock, SharedAudioBuffer};
pub use config::VttConfig;
pub use error::{Result, VttError};
pub use monitor::{FrameSummary, Monitor, MonitorFrame, MonitorHandle};
pub use signal_processing::{SpectralAnalyzer, SpectralFrame};
