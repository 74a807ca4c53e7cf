//! File-mailbox transport: one directory of JSON files shared with the
//! external client, plus a plain-text debug log.
//!
//! Every kind except actions is overwritten wholesale on each write. The
//! actions file is a mailbox with consume-once semantics: a read that passes
//! sequence dedup deletes the file; a failed or duplicate read leaves it
//! intact.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use cardbridge_protocol::MessageKind;

use crate::{SequenceTracker, Transport, TransportError};

const DEBUG_LOG_FILE: &str = "debug.log";

pub struct FileTransport {
    base: PathBuf,
    tracker: SequenceTracker,
}

impl FileTransport {
    /// Open (and create if needed) the mailbox directory.
    pub fn new(base: impl Into<PathBuf>) -> Result<Self, TransportError> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        Ok(Self {
            base,
            tracker: SequenceTracker::new(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base
    }

    fn message_path(&self, kind: MessageKind) -> PathBuf {
        self.base.join(kind.file_name())
    }

    /// Append one timestamped line to the mailbox debug log. Logging must
    /// never fail the transport, so errors are swallowed here.
    fn debug_log(&self, line: &str) {
        let stamped = format!(
            "{} {line}\n",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
        );
        let result = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.base.join(DEBUG_LOG_FILE))
            .and_then(|mut f| f.write_all(stamped.as_bytes()));
        if let Err(err) = result {
            debug!(error = %err, "debug log append failed");
        }
    }

    /// Write-then-rename so the reader never observes a half-written file.
    fn write_atomic(&self, path: &Path, payload: &str) -> Result<(), TransportError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl Transport for FileTransport {
    fn name(&self) -> &'static str {
        "file"
    }

    fn is_available(&self) -> bool {
        self.base.is_dir()
    }

    fn write_message(&mut self, kind: MessageKind, payload: &str) -> bool {
        let path = self.message_path(kind);
        match self.write_atomic(&path, payload) {
            Ok(()) => {
                self.debug_log(&format!("wrote {kind}"));
                true
            }
            Err(err) => {
                warn!(kind = %kind, error = %err, "file write failed");
                self.debug_log(&format!("write {kind} failed: {err}"));
                false
            }
        }
    }

    fn read_message(&mut self, kind: MessageKind) -> Option<String> {
        let path = self.message_path(kind);
        let payload = match fs::read_to_string(&path) {
            Ok(payload) => payload,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(kind = %kind, error = %err, "file read failed");
                self.debug_log(&format!("read {kind} failed: {err}"));
                return None;
            }
        };

        if !self.tracker.accept(kind, &payload) {
            return None;
        }

        if kind == MessageKind::Actions {
            // Consume-once mailbox; a message already delivered must not be
            // offered again even if dedup state were lost.
            if let Err(err) = fs::remove_file(&path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(error = %err, "failed to consume actions mailbox");
                }
            }
            self.debug_log("consumed actions mailbox");
        }
        Some(payload)
    }
}
