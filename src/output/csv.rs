use super::{Formatter, iso8601_timestamp};
use crate::monitor::FrameSummary;

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, summary: &FrameSummary) -> String {
        format!(
            "{},{},{:.4},{:.1},{:.4},{:.1},{:.1}",
            iso8601_timestamp(),
            summary.tick,
            summary.rms,
            summary.rms_db,
            summary.peak,
            summary.dominant_hz,
            summary.dominant_db
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some("ts,tick,rms,rms_db,peak,dominant_hz,dominant_db")
    }
}
