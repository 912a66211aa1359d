//! Line-by-line reading of change records.

use crate::envelope::parse_record;
use crate::error::{Result, SourceError};
use replay_core::ChangeRecord;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Default buffer size for reading input files (1 MiB).
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Iterator over the change records of a JSONL stream.
///
/// Blank lines are skipped. A malformed line yields an error and reading
/// continues with the next line, so callers can choose to skip it.
pub struct ChangeRecordReader<R> {
    lines: std::io::Lines<R>,
    line_count: usize,
}

impl<R: BufRead> ChangeRecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_count: 0,
        }
    }

    /// Number of lines consumed so far.
    pub fn line_count(&self) -> usize {
        self.line_count
    }
}

impl<R: BufRead> Iterator for ChangeRecordReader<R> {
    type Item = Result<ChangeRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_count += 1;
            let line_number = self.line_count;

            let line = match line {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(SourceError::ReadLine {
                        line: line_number,
                        source,
                    }))
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let parsed = serde_json::from_str::<Value>(&line)
                .map_err(|source| SourceError::InvalidJson {
                    line: line_number,
                    source,
                })
                .and_then(|value| parse_record(value, line_number));
            return Some(parsed);
        }
    }
}

/// Open `input` for reading; `-` reads standard input.
pub fn open_input(input: &str) -> Result<ChangeRecordReader<Box<dyn BufRead>>> {
    let reader: Box<dyn BufRead> = if input == "-" {
        tracing::info!("Reading change records from stdin");
        Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, std::io::stdin()))
    } else {
        tracing::info!("Reading change records from: {input}");
        let file = File::open(Path::new(input))?;
        Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file))
    };
    Ok(ChangeRecordReader::new(reader))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_skips_blank_lines_and_counts_them() {
        let input = "\n{\"table\":\"a\",\"after\":{\"id\":1}}\n   \n{\"table\":\"b\",\"before\":{\"id\":2}}\n";
        let mut reader = ChangeRecordReader::new(Cursor::new(input));

        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.table, "a");
        assert_eq!(reader.line_count(), 2);

        let second = reader.next().unwrap().unwrap();
        assert_eq!(second.table, "b");
        assert_eq!(reader.line_count(), 4);

        assert!(reader.next().is_none());
    }

    #[test]
    fn test_bad_line_does_not_stop_reading() {
        let input = "{not json}\n{\"table\":\"a\",\"after\":{\"id\":1}}\n";
        let results: Vec<_> = ChangeRecordReader::new(Cursor::new(input)).collect();

        assert_eq!(results.len(), 2);
        match &results[0] {
            Err(SourceError::InvalidJson { line, .. }) => assert_eq!(*line, 1),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(results[1].is_ok());
    }
}
