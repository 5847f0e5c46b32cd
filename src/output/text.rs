use super::Formatter;
use crate::monitor::FrameSummary;

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, summary: &FrameSummary) -> String {
        if self.verbose {
            format!(
                "[tick {}] Level: {:>6.1} dB (peak {:.3}) Dominant: {:>7.1} Hz at {:>6.1} dB",
                summary.tick,
                summary.rms_db,
                summary.peak,
                summary.dominant_hz,
                summary.dominant_db
            )
        } else {
            format!(
                "Level: {:>6.1} dB  Dominant: {:>7.1} Hz",
                summary.rms_db, summary.dominant_hz
            )
        }
    }
}
