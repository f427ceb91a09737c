//! Read side of the session file.
//!
//! Tracks a byte offset per reader, skips lines that fail to parse,
//! leaves an unterminated tail for the next read, and starts over when
//! the file shrinks underneath it.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CollabError;
use crate::event::Event;

/// Byte cursor into one session file.
#[derive(Debug, Clone)]
pub struct SessionCursor {
    path: PathBuf,
    /// Offset just past the last complete line consumed.
    offset: u64,
}

/// Result of one [`SessionCursor::read_new`] call.
#[derive(Debug, Default)]
pub struct CursorRead {
    /// Parsed records in file order.
    pub events: Vec<Event>,
    /// Complete lines that were dropped because they did not parse.
    pub malformed: usize,
    /// The file was smaller than the stored offset, so reading restarted at 0.
    pub reset: bool,
}

impl SessionCursor {
    /// Cursor positioned at the start of the file.
    pub fn new(path: PathBuf) -> Self {
        Self { path, offset: 0 }
    }

    /// Cursor positioned at the current end of the file (skips history).
    /// A missing file counts as empty.
    pub fn at_end(path: PathBuf) -> Self {
        let offset = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Self { path, offset }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read every complete line appended since the last successful call.
    ///
    /// The offset only moves once the whole read has succeeded; on error it
    /// stays where it was so the next call retries the same range.
    pub fn read_new(&mut self) -> Result<CursorRead, CollabError> {
        let size = fs::metadata(&self.path)
            .map_err(|e| CollabError::io("reading session file size", &self.path, e))?
            .len();

        let reset = self.offset > size;
        let start = if reset { 0 } else { self.offset };

        let file = File::open(&self.path)
            .map_err(|e| CollabError::io("opening session file", &self.path, e))?;
        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(start))
            .map_err(|e| CollabError::io("seeking in session file", &self.path, e))?;

        let mut read = CursorRead {
            reset,
            ..CursorRead::default()
        };
        let mut pos = start;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| CollabError::io("reading session file", &self.path, e))?;
            if n == 0 {
                break;
            }
            if buf.last() != Some(&b'\n') {
                // Writer still mid-append; pick it up next time.
                break;
            }
            pos += n as u64;

            let line = buf.trim_ascii();
            if line.is_empty() {
                continue;
            }
            match Event::parse_line(line) {
                Some(event) => read.events.push(event),
                None => {
                    read.malformed += 1;
                    debug!(
                        path = %self.path.display(),
                        offset = pos - n as u64,
                        "skipping malformed session line"
                    );
                }
            }
        }

        self.offset = pos;
        Ok(read)
    }
}
