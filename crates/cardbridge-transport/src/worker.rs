//! Asynchronous transport execution.
//!
//! In threaded mode a dedicated worker owns the transport and performs all
//! blocking I/O; the issuing side and the worker share nothing but two
//! one-directional channels. Each request carries a locally unique id; its
//! completion callback waits in a pending map until the matching response is
//! drained on a later tick. In inline mode the same operations run
//! synchronously and invoke the identical callback before returning; callers
//! cannot observe which mode is active except by latency.
//!
//! There is deliberately no timeout or retry: a request whose response is
//! lost (worker died, channel severed) leaves its callback pending for the
//! transport's lifetime.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{Builder, JoinHandle};

use tracing::{debug, warn};
use uuid::Uuid;

use cardbridge_protocol::MessageKind;

use crate::Transport;

/// Result of one transport operation, delivered to the issuing callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoOutcome {
    Written(bool),
    ReadData(Option<String>),
    Available(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Threaded,
    Inline,
}

enum IoOperation {
    Write { kind: MessageKind, payload: String },
    Read { kind: MessageKind },
    Probe,
}

struct IoRequest {
    id: Uuid,
    op: IoOperation,
}

struct IoResponse {
    id: Uuid,
    outcome: IoOutcome,
}

type IoCallback = Box<dyn FnOnce(IoOutcome)>;

fn perform(transport: &mut dyn Transport, op: IoOperation) -> IoOutcome {
    match op {
        IoOperation::Write { kind, payload } => {
            IoOutcome::Written(transport.write_message(kind, &payload))
        }
        IoOperation::Read { kind } => IoOutcome::ReadData(transport.read_message(kind)),
        IoOperation::Probe => IoOutcome::Available(transport.is_available()),
    }
}

struct WorkerChannels {
    tx: Sender<IoRequest>,
    rx: Receiver<IoResponse>,
    _handle: JoinHandle<()>,
}

enum Backend {
    Threaded(WorkerChannels),
    Inline(Box<dyn Transport>),
}

/// A transport with non-blocking issue semantics and per-tick completion
/// draining.
pub struct AsyncTransport {
    backend: Backend,
    pending: HashMap<Uuid, IoCallback>,
}

impl AsyncTransport {
    /// Run `transport` in the requested mode. When the host cannot spawn the
    /// worker thread, threaded mode falls back transparently to inline
    /// execution of the identical operations.
    pub fn new(transport: Box<dyn Transport>, mode: TransportMode) -> Self {
        let backend = match mode {
            TransportMode::Inline => Backend::Inline(transport),
            TransportMode::Threaded => match spawn_worker(transport) {
                Ok(channels) => Backend::Threaded(channels),
                Err((transport, err)) => {
                    warn!(error = %err, "worker spawn failed; falling back to inline transport");
                    Backend::Inline(transport)
                }
            },
        };
        Self {
            backend,
            pending: HashMap::new(),
        }
    }

    pub fn mode(&self) -> TransportMode {
        match self.backend {
            Backend::Threaded(_) => TransportMode::Threaded,
            Backend::Inline(_) => TransportMode::Inline,
        }
    }

    pub fn write_message(
        &mut self,
        kind: MessageKind,
        payload: String,
        on_done: impl FnOnce(IoOutcome) + 'static,
    ) {
        self.submit(IoOperation::Write { kind, payload }, Box::new(on_done));
    }

    pub fn read_message(&mut self, kind: MessageKind, on_done: impl FnOnce(IoOutcome) + 'static) {
        self.submit(IoOperation::Read { kind }, Box::new(on_done));
    }

    pub fn probe_availability(&mut self, on_done: impl FnOnce(IoOutcome) + 'static) {
        self.submit(IoOperation::Probe, Box::new(on_done));
    }

    fn submit(&mut self, op: IoOperation, callback: IoCallback) {
        match &mut self.backend {
            Backend::Inline(transport) => {
                // Synchronous fallback: same operation, same callback
                // signature, invoked before returning.
                callback(perform(transport.as_mut(), op));
            }
            Backend::Threaded(channels) => {
                let id = Uuid::new_v4();
                self.pending.insert(id, callback);
                if channels.tx.send(IoRequest { id, op }).is_err() {
                    // Worker is gone; the callback stays pending forever, the
                    // documented lost-response behavior.
                    warn!(request = %id, "worker channel severed; request will never complete");
                }
            }
        }
    }

    /// Drain all available responses, invoking and removing the matching
    /// pending callbacks. Unmatched or late responses are discarded silently.
    /// Returns the number of callbacks invoked.
    pub fn poll(&mut self) -> usize {
        let Backend::Threaded(channels) = &mut self.backend else {
            return 0;
        };
        let mut completed = 0;
        while let Ok(response) = channels.rx.try_recv() {
            match self.pending.remove(&response.id) {
                Some(callback) => {
                    callback(response.outcome);
                    completed += 1;
                }
                None => {
                    debug!(request = %response.id, "discarding unmatched response");
                }
            }
        }
        completed
    }

    /// Requests issued but not yet completed (or lost).
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }
}

#[allow(clippy::type_complexity)]
fn spawn_worker(
    transport: Box<dyn Transport>,
) -> Result<WorkerChannels, (Box<dyn Transport>, std::io::Error)> {
    let (req_tx, req_rx) = mpsc::channel::<IoRequest>();
    let (resp_tx, resp_rx) = mpsc::channel::<IoResponse>();
    // The transport is handed over after a successful spawn so it can still
    // be used inline when the spawn fails.
    let (boot_tx, boot_rx) = mpsc::channel::<Box<dyn Transport>>();

    let spawned = Builder::new()
        .name("cardbridge-transport-io".to_string())
        .spawn(move || {
            let Ok(mut transport) = boot_rx.recv() else {
                return;
            };
            while let Ok(request) = req_rx.recv() {
                let outcome = perform(transport.as_mut(), request.op);
                if resp_tx
                    .send(IoResponse {
                        id: request.id,
                        outcome,
                    })
                    .is_err()
                {
                    // Issuing side dropped; nothing left to report to.
                    break;
                }
            }
        });

    match spawned {
        Ok(handle) => {
            let _ = boot_tx.send(transport);
            Ok(WorkerChannels {
                tx: req_tx,
                rx: resp_rx,
                _handle: handle,
            })
        }
        Err(err) => Err((transport, err)),
    }
}
