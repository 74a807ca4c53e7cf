//! HTTP transport: all outbound kinds POST to a single game-data endpoint;
//! only the actions kind is polled back via GET. Availability is probed on a
//! health endpoint where 404 counts as available (no health route
//! implemented, not a failure).

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, warn};

use cardbridge_protocol::MessageKind;

use crate::{SequenceTracker, Transport, TransportError};

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Every outbound message type is POSTed here.
    pub game_data_endpoint: String,
    /// Only the actions kind is polled here.
    pub actions_endpoint: String,
    pub health_endpoint: String,
    pub headers: HashMap<String, String>,
    /// `None` keeps the client's default, which blocks the caller in
    /// synchronous mode.
    pub timeout_ms: Option<u64>,
}

pub struct HttpTransport {
    client: Client,
    config: HttpConfig,
    tracker: SequenceTracker,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let name = name
                .parse::<HeaderName>()
                .map_err(|e| TransportError::Config(format!("bad header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::Config(format!("bad header value: {e}")))?;
            headers.insert(name, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            config,
            tracker: SequenceTracker::new(),
        })
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    fn is_available(&self) -> bool {
        match self.client.get(&self.config.health_endpoint).send() {
            // 404 means "no health endpoint implemented", which still tells
            // us the server is there.
            Ok(resp) => resp.status().is_success() || resp.status() == StatusCode::NOT_FOUND,
            Err(err) => {
                debug!(error = %err, "health probe failed");
                false
            }
        }
    }

    fn write_message(&mut self, kind: MessageKind, payload: &str) -> bool {
        let outcome = self
            .client
            .post(&self.config.game_data_endpoint)
            .body(payload.to_string())
            .send();
        match outcome {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(kind = %kind, status = %resp.status(), "http write rejected");
                false
            }
            Err(err) => {
                warn!(kind = %kind, error = %err, "http write failed");
                false
            }
        }
    }

    fn read_message(&mut self, kind: MessageKind) -> Option<String> {
        // Every kind except actions is push-only and never read back.
        if kind != MessageKind::Actions {
            return None;
        }
        let resp = match self.client.get(&self.config.actions_endpoint).send() {
            Ok(resp) => resp,
            Err(err) => {
                warn!(error = %err, "actions poll failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            return None;
        }
        let payload = match resp.text() {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => return None,
            Err(err) => {
                warn!(error = %err, "actions body read failed");
                return None;
            }
        };
        self.tracker.accept(kind, &payload).then_some(payload)
    }
}
