//! Entry Decoder
//!
//! Turns JSONL session logs into [`LogEntry`] values. Decoding is line-oriented and
//! never fatal for a single line: malformed JSON, invalid UTF-8 and unparseable
//! timestamps only cause that line to be skipped. I/O errors while reading the file
//! do propagate, so the caller can skip the whole file.
//!
//! File reading is driven by a [`JsonlProcessor`], which receives each decoded entry
//! in file order. [`WindowCollector`] is the processor the aggregation pipeline uses:
//! it keeps entries with a valid timestamp at or after the lookback cutoff.

use crate::models::*;
use crate::timestamp_parser::TimestampParser;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Decode a single line. Returns `None` for blank or malformed input.
pub fn decode_line(line: &[u8]) -> Option<LogEntry> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }
    serde_json::from_slice(line).ok()
}

// Trait for custom JSONL processing
pub trait JsonlProcessor {
    type Output;

    fn process_entry(&mut self, entry: LogEntry, line_number: usize) -> Result<()>;

    /// Called for non-blank lines that failed to decode.
    fn skip_line(&mut self, _line_number: usize) {}

    fn finalize(self) -> Result<Self::Output>;
}

// ProcessedEntry is a decoded entry whose timestamp is known to be valid
#[derive(Debug, Clone)]
pub struct ProcessedEntry {
    pub entry: LogEntry,
    pub timestamp: DateTime<Local>,
    pub line_number: usize,
}

impl ProcessedEntry {
    pub fn new(entry: LogEntry, line_number: usize) -> Result<Self> {
        let timestamp = TimestampParser::parse(entry.timestamp.as_deref().unwrap_or_default())?;

        Ok(Self {
            entry,
            timestamp,
            line_number,
        })
    }
}

#[derive(Debug, Default)]
pub struct FileParser {}

impl FileParser {
    pub fn new() -> Self {
        Self {}
    }

    // Generic method that accepts any processor
    pub fn process_jsonl_file<P: JsonlProcessor>(
        &self,
        file_path: &Path,
        mut processor: P,
    ) -> Result<P::Output> {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open {}", file_path.display()))?;
        let reader = BufReader::new(file);

        for (index, line) in reader.split(b'\n').enumerate() {
            let line_number = index + 1;
            let line = line
                .with_context(|| format!("Failed to read {} at line {}", file_path.display(), line_number))?;
            if line.trim_ascii().is_empty() {
                continue;
            }

            match decode_line(&line) {
                Some(entry) => processor.process_entry(entry, line_number)?,
                None => processor.skip_line(line_number),
            }
        }

        processor.finalize()
    }

    /// Entries of one file with a valid timestamp no earlier than `cutoff`, in file order.
    pub fn read_window(&self, file_path: &Path, cutoff: DateTime<Local>) -> Result<Vec<ProcessedEntry>> {
        let window = self.process_jsonl_file(file_path, WindowCollector::new(cutoff))?;
        debug!(
            file = %file_path.display(),
            kept = window.entries.len(),
            skipped_lines = window.skipped_lines,
            before_cutoff = window.before_cutoff,
            "Read session file"
        );
        Ok(window.entries)
    }
}

#[derive(Debug, Default)]
pub struct Window {
    pub entries: Vec<ProcessedEntry>,
    /// Malformed JSON or unparseable timestamp.
    pub skipped_lines: usize,
    pub before_cutoff: usize,
}

// Processor that keeps entries inside the lookback window
pub struct WindowCollector {
    cutoff: DateTime<Local>,
    window: Window,
}

impl WindowCollector {
    pub fn new(cutoff: DateTime<Local>) -> Self {
        Self {
            cutoff,
            window: Window::default(),
        }
    }
}

impl JsonlProcessor for WindowCollector {
    type Output = Window;

    fn process_entry(&mut self, entry: LogEntry, line_number: usize) -> Result<()> {
        match ProcessedEntry::new(entry, line_number) {
            Ok(processed) if processed.timestamp < self.cutoff => self.window.before_cutoff += 1,
            Ok(processed) => self.window.entries.push(processed),
            Err(e) => {
                debug!(line = line_number, error = %e, "Skipping entry without a usable timestamp");
                self.window.skipped_lines += 1;
            }
        }
        Ok(())
    }

    fn skip_line(&mut self, line_number: usize) {
        debug!(line = line_number, "Skipping malformed line");
        self.window.skipped_lines += 1;
    }

    fn finalize(self) -> Result<Self::Output> {
        Ok(self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_lines(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn epoch() -> DateTime<Local> {
        Local.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_decode_line_skips_blank_and_malformed() {
        assert!(decode_line(b"").is_none());
        assert!(decode_line(b"   ").is_none());
        assert!(decode_line(b"{broken json").is_none());
        assert!(decode_line(b"42").is_none());
        assert!(decode_line(br#"{"type":"user"}"#).is_some());
    }

    #[test]
    fn test_decode_line_keeps_entry_with_null_token_count() {
        let line = br#"{"type":"assistant","timestamp":"2025-06-13T14:30:00Z","message":{"model":"claude-opus-4-20250514","usage":{"input_tokens":1000,"output_tokens":500,"cache_creation_input_tokens":null,"cache_read_input_tokens":0}}}"#;

        let entry = decode_line(line).expect("entry with a null token count decodes");
        let usage = entry.usage().unwrap();
        assert_eq!(usage.input_tokens, 1000);
        assert_eq!(usage.cache_write_tokens, 0);
        assert!((crate::pricing::PricingManager::entry_cost(&entry).usd - 0.0525).abs() < 1e-12);
    }

    #[test]
    fn test_read_window_skips_bad_lines() {
        let file = write_lines(&[
            r#"{"uuid":"u1","type":"user","timestamp":"2025-06-13T14:30:00Z"}"#,
            "{broken json line}",
            "",
            r#"{"uuid":"x","type":"assistant","timestamp":""}"#,
            r#"{"uuid":"y","type":"assistant","timestamp":"yesterday"}"#,
            r#"{"uuid":"a1","type":"assistant","timestamp":"2025-06-13T14:30:05+00:00"}"#,
        ]);

        let window = FileParser::new()
            .process_jsonl_file(file.path(), WindowCollector::new(epoch()))
            .unwrap();

        assert_eq!(window.entries.len(), 2);
        assert_eq!(window.skipped_lines, 3);
        assert_eq!(window.entries[0].entry.id(), Some("u1"));
        assert_eq!(window.entries[0].line_number, 1);
        assert_eq!(window.entries[1].entry.id(), Some("a1"));
        assert_eq!(window.entries[1].line_number, 6);
    }

    #[test]
    fn test_read_window_applies_cutoff() {
        let now = Local::now();
        let old = (now - Duration::days(40)).to_rfc3339();
        let recent = (now - Duration::days(1)).to_rfc3339();
        let old_line = format!(r#"{{"uuid":"old","type":"user","timestamp":"{}"}}"#, old);
        let recent_line = format!(r#"{{"uuid":"new","type":"user","timestamp":"{}"}}"#, recent);
        let file = write_lines(&[&old_line, &recent_line]);

        let window = FileParser::new()
            .process_jsonl_file(file.path(), WindowCollector::new(now - Duration::days(30)))
            .unwrap();

        assert_eq!(window.before_cutoff, 1);
        assert_eq!(window.entries.len(), 1);
        assert_eq!(window.entries[0].entry.id(), Some("new"));
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\xff\xfe{not utf8}\n").unwrap();
        file.write_all(br#"{"type":"user","timestamp":"2025-06-13T14:30:00Z"}"#).unwrap();
        file.flush().unwrap();

        let entries = FileParser::new().read_window(file.path(), epoch()).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = FileParser::new().read_window(Path::new("/nonexistent/file.jsonl"), epoch());
        assert!(result.is_err());
    }
}
