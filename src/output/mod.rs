mod csv;
mod json;
mod text;

use chrono::Utc;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

use crate::monitor::FrameSummary;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

pub trait Formatter: Send {
    fn format(&self, summary: &FrameSummary) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> FrameSummary {
        FrameSummary {
            tick: 7,
            rms: 0.25,
            rms_db: -12.04,
            peak: 0.5,
            dominant_hz: 440.0,
            dominant_db: -6.02,
        }
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = iso8601_timestamp();
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
    }

    #[test]
    fn test_text_formatter() {
        let line = create_formatter(OutputFormat::Text, false).format(&sample_summary());
        assert!(line.contains("440.0 Hz"), "{}", line);
        assert!(line.contains("-12.0 dB"), "{}", line);

        let verbose = create_formatter(OutputFormat::Text, true).format(&sample_summary());
        assert!(verbose.contains("tick 7"), "{}", verbose);
    }

    #[test]
    fn test_json_formatter() {
        let line = JsonFormatter.format(&sample_summary());
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["tick"], 7);
        assert_eq!(value["dominant_hz"], 440.0);
        assert!(value["ts"].is_string());
    }

    #[test]
    fn test_csv_formatter() {
        let formatter = CsvFormatter;
        let header = formatter.header().unwrap();
        let line = formatter.format(&sample_summary());
        assert_eq!(header.split(',').count(), line.split(',').count());
        assert!(line.ends_with(",440.0,-6.0"), "{}", line);
    }
}
