mod generate;

pub use generate::{generate_silence, generate_sine, save_mono_wav};
