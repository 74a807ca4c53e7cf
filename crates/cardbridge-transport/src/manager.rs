//! Typed envelope operations on top of a transport.
//!
//! The manager exclusively owns the monotonic sequence counter and the
//! transport reference for its lifetime. Sequence ids start at 1 and are
//! assigned exactly once, when an envelope is created.

use serde_json::Value;
use tracing::{debug, warn};

use cardbridge_protocol::{ActionRequest, ActionResult, Card, Envelope, MessageKind, Snapshot};

use crate::worker::{AsyncTransport, IoOutcome};

/// An inbound intent together with the sequence id of its envelope, needed
/// when replying with the matching action result.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundAction {
    pub sequence_id: u64,
    pub request: ActionRequest,
}

pub struct MessageManager {
    transport: AsyncTransport,
    sequence_id: u64,
}

impl MessageManager {
    pub fn new(transport: AsyncTransport) -> Self {
        Self {
            transport,
            sequence_id: 0,
        }
    }

    pub fn current_sequence_id(&self) -> u64 {
        self.sequence_id
    }

    /// Build an envelope for `data`, consuming the next sequence id.
    pub fn create_envelope(&mut self, kind: MessageKind, data: Value) -> Envelope {
        self.sequence_id += 1;
        Envelope {
            timestamp: utc_timestamp(),
            sequence_id: self.sequence_id,
            message_type: kind.as_str().to_string(),
            data,
            result: None,
            last_sequence_id: None,
        }
    }

    pub fn write_game_state(&mut self, snapshot: &Snapshot) {
        match serde_json::to_value(snapshot) {
            Ok(data) => self.write_envelope(MessageKind::GameState, data, None, None),
            Err(err) => warn!(error = %err, "game state serialization failed"),
        }
    }

    pub fn write_deck_state(&mut self, cards: &[Card]) {
        match serde_json::to_value(cards) {
            Ok(cards) => self.write_envelope(
                MessageKind::DeckState,
                serde_json::json!({ "cards": cards }),
                None,
                None,
            ),
            Err(err) => warn!(error = %err, "deck state serialization failed"),
        }
    }

    /// Reply to the inbound action with sequence id `replying_to`.
    pub fn write_action_result(&mut self, result: &ActionResult, replying_to: u64) {
        match serde_json::to_value(result) {
            Ok(data) => self.write_envelope(
                MessageKind::ActionResult,
                data,
                Some(Value::Bool(result.success)),
                Some(replying_to),
            ),
            Err(err) => warn!(error = %err, "action result serialization failed"),
        }
    }

    fn write_envelope(
        &mut self,
        kind: MessageKind,
        data: Value,
        result: Option<Value>,
        last_sequence_id: Option<u64>,
    ) {
        let mut envelope = self.create_envelope(kind, data);
        envelope.result = result;
        envelope.last_sequence_id = last_sequence_id;
        let payload = match serde_json::to_string(&envelope) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(kind = %kind, error = %err, "envelope serialization failed");
                return;
            }
        };
        let sequence_id = envelope.sequence_id;
        self.transport.write_message(kind, payload, move |outcome| {
            if outcome == IoOutcome::Written(false) {
                warn!(kind = %kind, sequence_id, "envelope write failed");
            } else {
                debug!(kind = %kind, sequence_id, "envelope written");
            }
        });
    }

    /// Poll the actions channel. `on_action` is invoked exactly once, with
    /// `None` when there is no new, well-formed intent.
    pub fn read_actions(&mut self, on_action: impl FnOnce(Option<InboundAction>) + 'static) {
        self.transport.read_message(MessageKind::Actions, move |outcome| {
            let IoOutcome::ReadData(payload) = outcome else {
                on_action(None);
                return;
            };
            on_action(payload.as_deref().and_then(parse_inbound_action));
        });
    }

    /// Probe the underlying medium.
    pub fn check_availability(&mut self, on_done: impl FnOnce(bool) + 'static) {
        self.transport.probe_availability(move |outcome| {
            on_done(outcome == IoOutcome::Available(true));
        });
    }

    /// Drain completed transport operations; call once per tick.
    pub fn poll(&mut self) -> usize {
        self.transport.poll()
    }
}

fn parse_inbound_action(payload: &str) -> Option<InboundAction> {
    let envelope: Envelope = match serde_json::from_str(payload) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "discarding malformed action envelope");
            return None;
        }
    };
    if envelope.message_type != MessageKind::Actions.as_str() {
        warn!(
            message_type = %envelope.message_type,
            "unexpected message type on actions channel"
        );
        return None;
    }
    match serde_json::from_value::<ActionRequest>(envelope.data) {
        Ok(request) => Some(InboundAction {
            sequence_id: envelope.sequence_id,
            request,
        }),
        Err(err) => {
            warn!(error = %err, "discarding malformed action request");
            None
        }
    }
}

fn utc_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
