//! Session lifecycle: create, join, publish, poll, disconnect.
//!
//! A `CollaborationSession` owns one sender id for its whole lifetime and
//! at most one connection (code, directory, cursor) at a time.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::addressing::{DEFAULT_CODE_LENGTH, MIN_CODE_LENGTH, session_file_path};
use crate::cursor::SessionCursor;
use crate::error::CollabError;
use crate::event::{Event, SESSION_CREATED, SESSION_JOINED, SESSION_LEFT};
use crate::identity::{CodeGenerator, RandomCodeGenerator, SenderIdGenerator, UuidSenderIds};
use crate::log;

/// Tunables for a session instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollabConfig {
    /// Length of generated codes. Never below [`MIN_CODE_LENGTH`].
    pub code_length: usize,
}

impl Default for CollabConfig {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
        }
    }
}

impl CollabConfig {
    #[must_use]
    pub fn with_code_length(mut self, code_length: usize) -> Self {
        self.code_length = code_length.max(MIN_CODE_LENGTH);
        self
    }
}

#[derive(Debug)]
struct Connection {
    code: String,
    shared_dir: PathBuf,
    cursor: SessionCursor,
}

pub struct CollaborationSession {
    code_length: usize,
    code_gen: Box<dyn CodeGenerator>,
    sender_id: String,
    connection: Option<Connection>,
}

impl fmt::Debug for CollaborationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollaborationSession")
            .field("code_length", &self.code_length)
            .field("sender_id", &self.sender_id)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

impl Default for CollaborationSession {
    fn default() -> Self {
        Self::new(CollabConfig::default())
    }
}

impl CollaborationSession {
    /// New unconnected session with random codes and a UUID sender id.
    pub fn new(config: CollabConfig) -> Self {
        Self::with_generators(config, RandomCodeGenerator, &UuidSenderIds)
    }

    /// New unconnected session with explicit code and identity sources.
    /// The sender id is drawn once, here.
    pub fn with_generators(
        config: CollabConfig,
        code_gen: impl CodeGenerator + 'static,
        sender_ids: &dyn SenderIdGenerator,
    ) -> Self {
        Self {
            code_length: config.code_length.max(MIN_CODE_LENGTH),
            code_gen: Box::new(code_gen),
            sender_id: sender_ids.generate(),
            connection: None,
        }
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn session_code(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.code.as_str())
    }

    pub fn shared_dir(&self) -> Option<&Path> {
        self.connection.as_ref().map(|c| c.shared_dir.as_path())
    }

    pub fn session_file(&self) -> Option<&Path> {
        self.connection.as_ref().map(|c| c.cursor.path())
    }

    /// Current read offset; 0 while disconnected.
    pub fn cursor_offset(&self) -> u64 {
        self.connection.as_ref().map_or(0, |c| c.cursor.offset())
    }

    pub fn generate_code(&self) -> String {
        self.code_gen.generate(self.code_length)
    }

    /// Create (or reopen) a session under `shared_dir` and announce it.
    ///
    /// `shared_dir` is created recursively; failing that is the one error a
    /// caller is expected to treat as fatal. An existing file with the same
    /// code is reused, never truncated. Returns the session code.
    pub fn create_session(
        &mut self,
        shared_dir: impl AsRef<Path>,
        code: Option<&str>,
    ) -> Result<String, CollabError> {
        let shared_dir = shared_dir.as_ref();
        fs::create_dir_all(shared_dir).map_err(|source| CollabError::CreateDir {
            path: shared_dir.to_path_buf(),
            source,
        })?;

        let code = match code {
            Some(code) if !code.is_empty() => code.to_owned(),
            _ => self.generate_code(),
        };
        let path = session_file_path(shared_dir, &code);
        log::ensure_session_file(&path)?;

        self.connect(&code, shared_dir, path);
        self.publish_event(SESSION_CREATED, json!({ "code": code }));
        info!(code = %code, dir = %shared_dir.display(), "collaboration session created");
        Ok(code)
    }

    /// Join an existing session. Returns `false`, with no side effects, if no
    /// session file exists for `code`.
    pub fn join_session(&mut self, shared_dir: impl AsRef<Path>, code: &str) -> bool {
        let shared_dir = shared_dir.as_ref();
        let path = session_file_path(shared_dir, code);
        if !path.exists() {
            debug!(path = %path.display(), "no session file to join");
            return false;
        }

        self.connect(code, shared_dir, path);
        self.publish_event(SESSION_JOINED, json!({ "code": code }));
        info!(code = %code, dir = %shared_dir.display(), "joined collaboration session");
        true
    }

    /// Announce departure if connected, then drop the connection. Always
    /// safe to call, including when already disconnected.
    pub fn disconnect(&mut self) {
        if self.is_connected() {
            self.publish_event(SESSION_LEFT, json!({}));
        }
        if let Some(conn) = self.connection.take() {
            info!(code = %conn.code, "left collaboration session");
        }
    }

    /// Append an event to the session file. `false` if disconnected or the
    /// write failed; failures are logged, never raised.
    pub fn publish_event(&self, event_type: &str, payload: Value) -> bool {
        let Some(conn) = &self.connection else {
            return false;
        };

        let event = Event::new(event_type, self.sender_id.as_str(), payload);
        match log::append_event(conn.cursor.path(), &event) {
            Ok(()) => true,
            Err(e) => {
                warn!(event_type, error = %e, "failed to write collaboration event");
                false
            }
        }
    }

    /// Events appended by other senders since the last poll, in file order.
    ///
    /// Empty if disconnected, if the session file is gone, or if reading
    /// failed (logged; the next poll retries from the same offset).
    pub fn poll_events(&mut self) -> Vec<Event> {
        let sender_id = self.sender_id.as_str();
        let Some(conn) = self.connection.as_mut() else {
            return Vec::new();
        };
        if !conn.cursor.path().exists() {
            return Vec::new();
        }

        match conn.cursor.read_new() {
            Ok(read) => {
                if read.reset {
                    info!(code = %conn.code, "session file shrank, reading from start");
                }
                if read.malformed > 0 {
                    debug!(
                        code = %conn.code,
                        skipped = read.malformed,
                        "skipped malformed session lines"
                    );
                }
                read.events
                    .into_iter()
                    .filter(|event| event.sender != sender_id)
                    .collect()
            }
            Err(e) => {
                warn!(code = %conn.code, error = %e, "failed to read collaboration events");
                Vec::new()
            }
        }
    }

    fn connect(&mut self, code: &str, shared_dir: &Path, path: PathBuf) {
        self.connection = Some(Connection {
            code: code.to_owned(),
            shared_dir: shared_dir.to_path_buf(),
            cursor: SessionCursor::new(path),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{FixedCode, FixedSenderId};

    fn fixed(code: &str, sender: &str) -> CollaborationSession {
        CollaborationSession::with_generators(
            CollabConfig::default(),
            FixedCode(code.to_owned()),
            &FixedSenderId(sender.to_owned()),
        )
    }

    fn lines(path: &Path) -> Vec<Event> {
        fs::read_to_string(path)
            .expect("test")
            .lines()
            .map(|l| serde_json::from_str(l).expect("test"))
            .collect()
    }

    #[test]
    fn new_session_is_disconnected() {
        let session = CollaborationSession::default();
        assert!(!session.is_connected());
        assert_eq!(session.session_code(), None);
        assert_eq!(session.shared_dir(), None);
        assert_eq!(session.session_file(), None);
        assert_eq!(session.cursor_offset(), 0);
        assert_eq!(session.code_length(), DEFAULT_CODE_LENGTH);
        assert_eq!(session.sender_id().len(), 32);
    }

    #[test]
    fn code_length_is_clamped() {
        let short = CollaborationSession::new(CollabConfig { code_length: 2 });
        assert_eq!(short.code_length(), MIN_CODE_LENGTH);
        assert_eq!(short.generate_code().len(), MIN_CODE_LENGTH);

        let config = CollabConfig::default().with_code_length(1);
        assert_eq!(config.code_length, MIN_CODE_LENGTH);
        let long = CollaborationSession::new(CollabConfig::default().with_code_length(9));
        assert_eq!(long.generate_code().len(), 9);
    }

    #[test]
    fn create_uses_generator_and_announces() {
        let tmp = tempfile::tempdir().expect("test");
        let dir = tmp.path().join("nested").join("collab");
        let mut host = fixed("AB12CD", "host");

        let code = host.create_session(&dir, None).expect("test");
        assert_eq!(code, "AB12CD");
        assert!(host.is_connected());
        assert_eq!(host.session_code(), Some("AB12CD"));
        assert_eq!(host.shared_dir(), Some(dir.as_path()));

        let path = dir.join("focus_guard_AB12CD.jsonl");
        assert_eq!(host.session_file(), Some(path.as_path()));
        let events = lines(&path);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, SESSION_CREATED);
        assert_eq!(events[0].sender, "host");
        assert_eq!(events[0].payload, json!({"code": "AB12CD"}));
    }

    #[test]
    fn create_with_explicit_code_keeps_existing_file() {
        let tmp = tempfile::tempdir().expect("test");
        let path = tmp.path().join("focus_guard_KEEP.jsonl");
        fs::write(&path, "{\"type\":\"earlier\",\"sender\":\"other\"}\n").expect("test");

        let mut host = fixed("UNUSED", "host");
        let code = host.create_session(tmp.path(), Some("KEEP")).expect("test");
        assert_eq!(code, "KEEP");

        let events = lines(&path);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "earlier");

        // Cursor starts at 0, so history from other senders is visible.
        let polled = host.poll_events();
        assert_eq!(polled.len(), 1);
        assert_eq!(polled[0].event_type, "earlier");
    }

    #[test]
    fn create_with_empty_code_generates_one() {
        let tmp = tempfile::tempdir().expect("test");
        let mut host = fixed("GEN123", "host");
        assert_eq!(host.create_session(tmp.path(), Some("")).expect("test"), "GEN123");
    }

    #[test]
    fn create_fails_when_dir_cannot_be_made() {
        let tmp = tempfile::tempdir().expect("test");
        let blocker = tmp.path().join("file");
        fs::write(&blocker, "").expect("test");

        let mut host = fixed("ABCD", "host");
        let err = host
            .create_session(blocker.join("sub"), None)
            .expect_err("test");
        assert!(matches!(err, CollabError::CreateDir { .. }));
        assert!(!host.is_connected());
    }

    #[test]
    fn join_missing_session_has_no_side_effects() {
        let tmp = tempfile::tempdir().expect("test");
        let mut guest = fixed("ABCD", "guest");

        assert!(!guest.join_session(tmp.path(), "NOPE"));
        assert!(!guest.is_connected());
        assert!(!tmp.path().join("focus_guard_NOPE.jsonl").exists());
    }

    #[test]
    fn failed_join_keeps_existing_connection() {
        let tmp = tempfile::tempdir().expect("test");
        let mut host = fixed("HOST", "host");
        host.create_session(tmp.path(), None).expect("test");
        let mut guest = fixed("UNUSED", "guest");
        assert!(guest.join_session(tmp.path(), "HOST"));
        assert!(host.publish_event("ping", json!({})));
        assert_eq!(guest.poll_events().len(), 2);

        let file = guest.session_file().expect("test").to_path_buf();
        let offset = guest.cursor_offset();
        assert!(offset > 0);
        let size = fs::metadata(&file).expect("test").len();

        assert!(!guest.join_session(tmp.path(), "MISSING"));
        assert!(guest.is_connected());
        assert_eq!(guest.session_code(), Some("HOST"));
        assert_eq!(guest.session_file(), Some(file.as_path()));
        assert_eq!(guest.cursor_offset(), offset);
        assert_eq!(fs::metadata(&file).expect("test").len(), size, "nothing announced");
        assert!(guest.poll_events().is_empty());
    }

    #[test]
    fn disconnect_announces_then_clears() {
        let tmp = tempfile::tempdir().expect("test");
        let mut host = fixed("BYE1", "host");
        host.create_session(tmp.path(), None).expect("test");
        let path = host.session_file().expect("test").to_path_buf();

        host.disconnect();
        assert!(!host.is_connected());
        assert_eq!(host.session_code(), None);
        assert_eq!(host.cursor_offset(), 0);

        let events = lines(&path);
        let last = events.last().expect("test");
        assert_eq!(last.event_type, SESSION_LEFT);
        assert_eq!(last.payload, json!({}));

        // Second disconnect is a no-op.
        host.disconnect();
        assert_eq!(lines(&path).len(), events.len());
    }

    #[test]
    fn disconnect_clears_even_if_file_vanished() {
        let tmp = tempfile::tempdir().expect("test");
        let mut host = fixed("GONE", "host");
        host.create_session(tmp.path(), None).expect("test");
        fs::remove_file(host.session_file().expect("test")).expect("test");

        host.disconnect();
        assert!(!host.is_connected());
        assert!(!tmp.path().join("focus_guard_GONE.jsonl").exists());
    }

    #[test]
    fn publish_while_disconnected_is_false() {
        let session = fixed("ABCD", "me");
        assert!(!session.publish_event("ping", json!({"ok": true})));
    }

    #[test]
    fn publish_after_file_vanished_is_false() {
        let tmp = tempfile::tempdir().expect("test");
        let mut host = fixed("VANISH", "host");
        host.create_session(tmp.path(), None).expect("test");
        fs::remove_file(host.session_file().expect("test")).expect("test");

        assert!(!host.publish_event("ping", json!({})));
        assert!(host.is_connected());
    }

    #[test]
    fn poll_filters_own_events() {
        let tmp = tempfile::tempdir().expect("test");
        let mut session = fixed("SELF", "me");
        session.create_session(tmp.path(), None).expect("test");
        assert!(session.publish_event("ping", json!({"ok": true})));
        assert!(session.poll_events().is_empty());
        assert_eq!(
            session.cursor_offset(),
            fs::metadata(session.session_file().expect("test"))
                .expect("test")
                .len()
        );
    }

    #[test]
    fn poll_while_disconnected_is_empty() {
        let mut session = fixed("ABCD", "me");
        assert!(session.poll_events().is_empty());
    }
}
