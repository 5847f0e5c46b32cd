use serde::Serialize;

use super::{Formatter, iso8601_timestamp};
use crate::monitor::FrameSummary;

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonLine<'a> {
    ts: String,
    #[serde(flatten)]
    summary: &'a FrameSummary,
}

impl Formatter for JsonFormatter {
    fn format(&self, summary: &FrameSummary) -> String {
        let line = JsonLine {
            ts: iso8601_timestamp(),
            summary,
        };
        serde_json::to_string(&line).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
    }
}
