//! Session addressing: maps a shared directory and a session code to the
//! one file both peers read and append.

use std::path::{Path, PathBuf};

/// Characters a session code is drawn from.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const MIN_CODE_LENGTH: usize = 4;
pub const DEFAULT_CODE_LENGTH: usize = 6;

pub const SESSION_FILE_PREFIX: &str = "focus_guard_";
pub const SESSION_FILE_EXTENSION: &str = "jsonl";

/// File name for a session code, e.g. `focus_guard_AB12CD.jsonl`.
#[must_use]
pub fn session_file_name(code: &str) -> String {
    format!("{SESSION_FILE_PREFIX}{code}.{SESSION_FILE_EXTENSION}")
}

/// Path of the session file for `code` under `shared_dir`. Pure, no I/O.
#[must_use]
pub fn session_file_path(shared_dir: &Path, code: &str) -> PathBuf {
    shared_dir.join(session_file_name(code))
}

/// Whether `code` is `[A-Z0-9]{4,}`.
#[must_use]
pub fn is_valid_code(code: &str) -> bool {
    code.len() >= MIN_CODE_LENGTH && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}
