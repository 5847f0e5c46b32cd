use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VttError {
    #[error("Unsupported sample rate: got {declared} Hz, buffer runs at {expected} Hz")]
    UnsupportedRate { declared: u32, expected: u32 },

    #[error("Unsupported discontinuity: only contiguous sample blocks can be ingested")]
    UnsupportedDiscontinuity,

    #[error("Insufficient samples: need {needed}, have {available}")]
    InsufficientSamples { needed: usize, available: usize },

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, VttError>;
