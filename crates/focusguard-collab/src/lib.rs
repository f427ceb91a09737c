//! focusguard-collab: peer coordination over a shared directory.
//!
//! Two or more processes rendezvous on a short session code, then exchange
//! typed events through a single append-only JSONL file. Each participant
//! keeps its own byte cursor into that file and never sees its own writes.
//!
//! No locks, no network, no background threads: every operation is a plain
//! synchronous call, and polling cadence belongs to the host application.

pub mod addressing;
pub mod cursor;
pub mod error;
pub mod event;
pub mod identity;
pub mod log;
pub mod session;

pub use addressing::{DEFAULT_CODE_LENGTH, MIN_CODE_LENGTH, is_valid_code, session_file_path};
pub use cursor::{CursorRead, SessionCursor};
pub use error::CollabError;
pub use event::Event;
pub use identity::{CodeGenerator, RandomCodeGenerator, SenderIdGenerator, UuidSenderIds};
pub use session::{CollabConfig, CollaborationSession};
