//! Leading-timestamp extraction for raw CI log lines.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use regex::Regex;
use wfs_core::WfsError;

const LINE_TIMESTAMP: &str =
    r"^(\d{4}-\d{2}-\d{2})T(\d{2}:\d{2}:\d{2})(?:\.(\d+))?Z?";

/// First and last instant found in a log stream.
pub type LogBounds = (Option<DateTime<Utc>>, Option<DateTime<Utc>>);

/// Scans log lines for a `YYYY-MM-DDTHH:MM:SS[.fff…][Z]` prefix.
///
/// Only this anchored format is recognised. Lines without it are skipped.
/// Fractions are right-padded or truncated to microseconds.
#[derive(Debug, Clone)]
pub struct TimestampParser {
    pattern: Regex,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampParser {
    /// Compiles the line pattern.
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(LINE_TIMESTAMP).expect("timestamp pattern is valid"),
        }
    }

    /// Parses the timestamp at the start of `line`, if any.
    pub fn parse_line(&self, line: &str) -> Option<DateTime<Utc>> {
        let line = line.strip_prefix('\u{feff}').unwrap_or(line);
        let captures = self.pattern.captures(line)?;
        let date = NaiveDate::parse_from_str(captures.get(1)?.as_str(), "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(captures.get(2)?.as_str(), "%H:%M:%S").ok()?;
        let time = match captures.get(3) {
            Some(fraction) => {
                let micros = normalize_micros(fraction.as_str())?;
                time.with_nanosecond(micros * 1_000)?
            }
            None => time,
        };
        Some(NaiveDateTime::new(date, time).and_utc())
    }

    /// Returns the first and last matching instants of an in-memory stream.
    pub fn scan_str(&self, text: &str) -> LogBounds {
        bounds(text.lines().filter_map(|line| self.parse_line(line)))
    }

    /// Returns the first and last matching instants of a buffered stream.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn scan_reader<R: BufRead>(&self, mut reader: R) -> std::io::Result<LogBounds> {
        let mut first = None;
        let mut last = None;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            if let Some(instant) = self.parse_line(&line) {
                first.get_or_insert(instant);
                last = Some(instant);
            }
        }
        Ok((first, last))
    }

    /// Scans a log file on disk.
    pub fn scan_file(&self, path: &Path) -> Result<LogBounds, WfsError> {
        let file = File::open(path).map_err(|err| WfsError::io("log-open", path, err))?;
        self.scan_reader(BufReader::new(file))
            .map_err(|err| WfsError::io("log-read", path, err))
    }
}

fn bounds(instants: impl Iterator<Item = DateTime<Utc>>) -> LogBounds {
    let mut first = None;
    let mut last = None;
    for instant in instants {
        first.get_or_insert(instant);
        last = Some(instant);
    }
    (first, last)
}

fn normalize_micros(fraction: &str) -> Option<u32> {
    let mut digits: String = fraction.chars().take(6).collect();
    while digits.len() < 6 {
        digits.push('0');
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_whole_seconds_without_suffix() {
        let parser = TimestampParser::new();
        let parsed = parser.parse_line("2025-03-04T05:06:07 plain").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap());
    }

    #[test]
    fn truncates_long_fractions() {
        let parser = TimestampParser::new();
        let parsed = parser
            .parse_line("2025-03-04T05:06:07.1234567891Z ##[group]Run")
            .unwrap();
        assert_eq!(parsed.nanosecond(), 123_456_000);
    }

    #[test]
    fn ignores_unanchored_timestamps() {
        let parser = TimestampParser::new();
        assert!(parser.parse_line("step 2025-03-04T05:06:07Z").is_none());
        assert!(parser.parse_line("2025-13-04T05:06:07Z").is_none());
    }

    #[test]
    fn strips_byte_order_mark() {
        let parser = TimestampParser::new();
        assert!(parser.parse_line("\u{feff}2025-03-04T05:06:07.5Z start").is_some());
    }
}
