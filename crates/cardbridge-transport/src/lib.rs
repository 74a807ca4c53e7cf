//! Message transport between the live session and the external client.
//!
//! A [`Transport`] moves opaque envelope payloads over a medium (file mailbox
//! or HTTP), reports availability, and suppresses duplicate inbound reads by
//! sequence id. [`AsyncTransport`] runs any transport on a dedicated worker
//! thread with per-tick callback draining; [`MessageManager`] sits on top and
//! owns the sequence counter and the typed envelope operations.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use cardbridge_protocol::MessageKind;

mod config;
mod file;
mod http;
mod manager;
mod worker;

pub use config::{build_transport, config_schema_json, load_config, Config, TransportSection};
pub use file::FileTransport;
pub use http::{HttpConfig, HttpTransport};
pub use manager::{InboundAction, MessageManager};
pub use worker::{AsyncTransport, IoOutcome, TransportMode};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid transport configuration: {0}")]
    Config(String),
}

/// A medium carrying serialized envelopes across the process boundary.
///
/// Failures are reported as `false`/`None` uniformly; callers cannot
/// distinguish the root cause from the return value alone (the logs can).
pub trait Transport: Send {
    fn name(&self) -> &'static str;

    /// Probe whether the other side is reachable at all.
    fn is_available(&self) -> bool;

    /// Write one serialized envelope; `false` on any failure.
    fn write_message(&mut self, kind: MessageKind, payload: &str) -> bool;

    /// Read the current envelope for `kind`, if any. Envelopes whose sequence
    /// id is not strictly greater than the last one delivered for this kind
    /// are suppressed as already processed.
    fn read_message(&mut self, kind: MessageKind) -> Option<String>;
}

impl std::fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").field("name", &self.name()).finish()
    }
}

#[derive(Deserialize)]
struct SequenceProbe {
    #[serde(default)]
    sequence_id: u64,
}

/// Per-transport-instance tracking of the highest sequence id delivered to
/// the application layer, per message kind. Gives at-most-once delivery when
/// there is a single writer per kind.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    last_read: HashMap<MessageKind, u64>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `payload` if its sequence id is new for `kind`; returns whether
    /// the payload should be delivered. Unparseable payloads are rejected.
    pub fn accept(&mut self, kind: MessageKind, payload: &str) -> bool {
        let probe: SequenceProbe = match serde_json::from_str(payload) {
            Ok(probe) => probe,
            Err(err) => {
                warn!(kind = %kind, error = %err, "discarding unparseable inbound message");
                return false;
            }
        };
        let last = self.last_read.get(&kind).copied().unwrap_or(0);
        if probe.sequence_id <= last {
            debug!(
                kind = %kind,
                sequence_id = probe.sequence_id,
                last_read = last,
                "suppressing already-processed message"
            );
            return false;
        }
        self.last_read.insert(kind, probe.sequence_id);
        true
    }

    pub fn last_read(&self, kind: MessageKind) -> u64 {
        self.last_read.get(&kind).copied().unwrap_or(0)
    }
}
