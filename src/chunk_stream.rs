use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::SortError;
use crate::row::Row;

/// A buffered forward cursor over one sorted run file.
///
/// Holds a single pre-read "current" Row. `has_data()` reports whether
/// `current()` is valid; once the file is exhausted the stream enters the
/// `end` state and `current()` returns `None` from then on.
pub(crate) struct ChunkStream {
    path: PathBuf,
    reader: BufReader<File>,
    current: Option<Row>,
}

impl ChunkStream {
    /// Opens `path` with the given read-buffer size and pre-reads the first
    /// parsable Row. A missing input file is fatal; a file with no parsable
    /// line is not - construction succeeds with the stream already in the
    /// `end` state.
    pub(crate) fn open(path: impl AsRef<Path>, buffer_size: usize) -> Result<ChunkStream, SortError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| SortError::io(format!("open {}", path.display()), e))?;
        let mut stream = ChunkStream {
            path,
            reader: BufReader::with_capacity(buffer_size, file),
            current: None,
        };
        stream.move_next()?;
        Ok(stream)
    }

    pub(crate) fn has_data(&self) -> bool {
        self.current.is_some()
    }

    pub(crate) fn current(&self) -> Option<&Row> {
        self.current.as_ref()
    }

    /// Reads lines until one parses successfully and becomes `current`, or
    /// EOF is reached, in which case `has_data()` becomes false.
    pub(crate) fn move_next(&mut self) -> Result<(), SortError> {
        loop {
            let mut line = String::new();
            let bytes = self
                .reader
                .read_line(&mut line)
                .map_err(|e| SortError::io(format!("read {}", self.path.display()), e))?;
            if bytes == 0 {
                self.current = None;
                return Ok(());
            }
            let trimmed = trim_newline(&line);
            if trimmed.is_empty() {
                continue;
            }
            let arc: Arc<str> = Arc::from(trimmed);
            if let Some(row) = Row::try_parse(&arc) {
                self.current = Some(row);
                return Ok(());
            }
        }
    }
}

pub(crate) fn trim_newline(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn empty_file_enters_end_state() {
        let f = write_file("");
        let stream = ChunkStream::open(f.path(), 4096).unwrap();
        assert!(!stream.has_data());
    }

    #[test]
    fn skips_blank_and_unparsable_lines() {
        let f = write_file("InvalidLine\n1. First\n\n123 NoDot\n2. Second\n");
        let mut stream = ChunkStream::open(f.path(), 4096).unwrap();
        assert!(stream.has_data());
        assert_eq!(stream.current().unwrap().text(), "First");
        stream.move_next().unwrap();
        assert!(stream.has_data());
        assert_eq!(stream.current().unwrap().text(), "Second");
        stream.move_next().unwrap();
        assert!(!stream.has_data());
    }

    #[test]
    fn missing_file_is_fatal() {
        let result = ChunkStream::open("/nonexistent/path/does-not-exist.tmp", 4096);
        assert!(result.is_err());
    }
}
