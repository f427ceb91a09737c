//! Append side of the session file.
//!
//! Every record is serialized up front and handed to the OS as one
//! append-mode `write_all`, so this process never leaves half a record
//! behind. Interleaving between separate writer processes relies on the
//! filesystem's small-append atomicity; nothing here locks the file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::CollabError;
use crate::event::Event;

/// Create the session file if it does not exist. Existing content is kept.
pub fn ensure_session_file(path: &Path) -> Result<(), CollabError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(drop)
        .map_err(|e| CollabError::io("creating session file", path, e))
}

/// Append one event as a newline-terminated JSON line.
///
/// The file must already exist: a session file that vanished is reported
/// as an error rather than silently recreated.
pub fn append_event(path: &Path, event: &Event) -> Result<(), CollabError> {
    let line = event.to_line()?;
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| CollabError::io("opening session file for append", path, e))?;
    file.write_all(&line)
        .and_then(|()| file.flush())
        .map_err(|e| CollabError::io("appending event", path, e))
}
