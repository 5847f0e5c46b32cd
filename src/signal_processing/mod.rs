pub mod math;
pub mod stft;
pub mod window;

pub use math::{amplitude_to_db, peak_abs, rms};
pub use stft::{SpectralAnalyzer, SpectralFrame, StftOptions, stft};
pub use window::window_coefficients;
