//! Extraction orchestration: turns the partially-available live object graph
//! into one complete [`Snapshot`] per synchronization tick.
//!
//! Extractors are pure functions of the session view; each produces a named
//! fragment of the snapshot. The orchestrator merges fragments with
//! last-write-wins precedence and isolates every failure so a broken plugin
//! costs its own fields, never the pass.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use cardbridge_protocol::Snapshot;
use cardbridge_session::{SessionError, SessionView};

pub mod extractors;

/// Partial snapshot output: snapshot field name to value.
pub type SnapshotPatch = serde_json::Map<String, Value>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("{0}")]
    Other(String),
}

impl ExtractError {
    pub fn other(msg: impl Into<String>) -> Self {
        ExtractError::Other(msg.into())
    }
}

/// A plugin producing one named fragment of the external snapshot.
///
/// `extract` must not depend on any other extractor's output and must degrade
/// to default values itself when the session is absent; the orchestrator
/// performs no global fallback on its behalf.
pub trait Extractor {
    /// Unique name, used for registration and error attribution.
    fn name(&self) -> &'static str;
    fn extract(&self, view: &dyn SessionView) -> Result<SnapshotPatch, ExtractError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("extractor name already registered: {0}")]
    DuplicateName(String),
    #[error("extractor name must not be empty")]
    EmptyName,
}

/// Registry of extractors, invoked in registration order once per tick.
#[derive(Default)]
pub struct ExtractionOrchestrator {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractionOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orchestrator preloaded with the built-in extractor set.
    pub fn with_default_extractors() -> Self {
        let mut orch = Self::new();
        for extractor in extractors::default_set() {
            // Built-in names are distinct by construction.
            let _ = orch.register(extractor);
        }
        orch
    }

    /// Register an extractor. Names are checked for uniqueness here, at the
    /// plugin boundary; this is the only structural validation performed.
    pub fn register(&mut self, extractor: Box<dyn Extractor>) -> Result<(), RegistryError> {
        let name = extractor.name();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.extractors.iter().any(|e| e.name() == name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        debug!(extractor = name, "registered extractor");
        self.extractors.push(extractor);
        Ok(())
    }

    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// Run every registered extractor and assemble the snapshot.
    ///
    /// Later-registered extractors win on overlapping field names. A failing
    /// or panicking extractor contributes one entry to `extraction_errors`
    /// and nothing else; its fields keep the defaults seeded up front.
    pub fn extract_current_state(&self, view: &dyn SessionView) -> Snapshot {
        let mut merged = snapshot_seed();
        let mut errors: Vec<String> = Vec::new();

        for extractor in &self.extractors {
            let name = extractor.name();
            match catch_unwind(AssertUnwindSafe(|| extractor.extract(view))) {
                Ok(Ok(patch)) => {
                    for (field, value) in patch {
                        merged.insert(field, value);
                    }
                }
                Ok(Err(err)) => {
                    warn!(extractor = name, error = %err, "extractor failed");
                    errors.push(format!("{name}: {err}"));
                }
                Err(payload) => {
                    let detail = panic_message(payload);
                    warn!(extractor = name, detail = %detail, "extractor panicked");
                    errors.push(format!("{name}: panic: {detail}"));
                }
            }
        }

        merged.insert(
            "extraction_errors".to_string(),
            Value::Array(errors.iter().cloned().map(Value::String).collect()),
        );

        match serde_json::from_value::<Snapshot>(Value::Object(merged)) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "snapshot assembly failed; degrading to defaults");
                errors.push(format!("snapshot assembly failed: {err}"));
                Snapshot {
                    extraction_errors: errors,
                    ..Snapshot::default()
                }
            }
        }
    }
}

/// Fully-defaulted snapshot as a field map, the merge starting point.
fn snapshot_seed() -> SnapshotPatch {
    match serde_json::to_value(Snapshot::default()) {
        Ok(Value::Object(map)) => map,
        _ => SnapshotPatch::new(),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    // Panic payloads are almost always &str or String; anything else gets
    // the generic attribution.
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "extractor panicked".to_string()
    }
}
