pub mod buffer;
pub mod capture;
pub mod source;

pub use buffer::{AudioRingBuffer, SampleBlock, SharedAudioBuffer};
pub use capture::{AudioCapture, list_input_devices};
pub use source::{AudioSource, ToneSource, WavFileSource, feed_source, spawn_feeder};
