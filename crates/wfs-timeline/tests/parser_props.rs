use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use wfs_timeline::TimestampParser;

proptest! {
    #[test]
    fn single_line_yields_same_first_and_last(
        secs in 0i64..4_000_000_000,
        micros in 0u32..1_000_000,
        tail in "[ a-zA-Z0-9#\\[\\]]{0,40}",
    ) {
        let instant = Utc.timestamp_opt(secs, micros * 1_000).unwrap();
        let line = format!("{}Z{}", instant.format("%Y-%m-%dT%H:%M:%S%.6f"), tail);
        let parser = TimestampParser::new();
        let (first, last) = parser.scan_str(&line);
        prop_assert_eq!(first, Some(instant));
        prop_assert_eq!(last, Some(instant));
    }

    #[test]
    fn lines_without_leading_timestamp_yield_nothing(lines in prop::collection::vec("[a-z ]{0,30}", 0..8)) {
        let parser = TimestampParser::new();
        prop_assert_eq!(parser.scan_str(&lines.join("\n")), (None, None));
    }
}

#[test]
fn fractional_seconds_normalize_to_micros() {
    let parser = TimestampParser::new();
    let short = parser.parse_line("2025-05-05T10:11:12.5Z x").unwrap();
    let long = parser.parse_line("2025-05-05T10:11:12.500000Z x").unwrap();
    let nanos = parser.parse_line("2025-05-05T10:11:12.5000009Z x").unwrap();
    assert_eq!(short, long);
    assert_eq!(short, nanos);
}

#[test]
fn first_and_last_come_from_matching_lines_only() {
    let log = "\
2025-05-05T10:00:00.1000000Z ##[group]Run actions/checkout
continuation without timestamp
2025-05-05T10:00:03.2Z done
trailing noise
";
    let parser = TimestampParser::new();
    let (first, last) = parser.scan_str(log);
    assert_eq!(
        first,
        Some(Utc.with_ymd_and_hms(2025, 5, 5, 10, 0, 0).unwrap() + chrono::Duration::milliseconds(100))
    );
    assert_eq!(
        last,
        Some(Utc.with_ymd_and_hms(2025, 5, 5, 10, 0, 3).unwrap() + chrono::Duration::milliseconds(200))
    );
}

#[test]
fn reader_tolerates_invalid_utf8() {
    let bytes: &[u8] = b"2025-05-05T10:00:00Z \xff\xfe start\n\xff\n2025-05-05T10:00:09Z end\n";
    let parser = TimestampParser::new();
    let (first, last) = parser.scan_reader(bytes).expect("scan");
    assert_eq!((last.unwrap() - first.unwrap()).num_seconds(), 9);
}
