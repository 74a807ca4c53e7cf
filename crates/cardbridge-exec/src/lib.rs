//! Action execution: dispatches externally submitted intents to registered
//! handlers, applying local parameter checks and business-rule validation
//! before any mutation reaches the live session.
//!
//! Execution failures are always returned as a structured [`ActionResult`];
//! nothing escapes the executor boundary to terminate the host process.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, warn};

use cardbridge_protocol::{ActionRequest, ActionResult};
use cardbridge_session::SessionDriver;
use cardbridge_validate::ValidationHub;

pub mod handlers;
pub mod params;

/// One action type's implementation. Handlers check their own parameters,
/// consult the validator framework for business rules, and only then mutate
/// the session.
pub trait ActionHandler {
    fn action_type(&self) -> &'static str;
    fn execute(
        &self,
        request: &mut ActionRequest,
        session: &mut dyn SessionDriver,
        validators: &ValidationHub,
    ) -> ActionResult;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerRegistryError {
    #[error("handler already registered for action type: {0}")]
    DuplicateAction(String),
}

/// Fixed sentinel returned by handlers for action types that exist in the
/// vocabulary but are not implemented yet. API consumers can distinguish this
/// from other failures by the exact string.
pub fn not_implemented_message(action_type: &str) -> String {
    format!("Action '{action_type}' is not implemented yet")
}

/// Stateless dispatcher from action type to handler. The only state it holds
/// is its registrations and the validator framework it consults.
pub struct ActionExecutor {
    handlers: HashMap<&'static str, Box<dyn ActionHandler>>,
    validators: ValidationHub,
}

impl ActionExecutor {
    pub fn new(validators: ValidationHub) -> Self {
        Self {
            handlers: HashMap::new(),
            validators,
        }
    }

    /// Executor preloaded with the full handler vocabulary.
    pub fn with_default_handlers(validators: ValidationHub) -> Self {
        let mut exec = Self::new(validators);
        for handler in handlers::default_set() {
            // Built-in action types are distinct by construction.
            let _ = exec.register_handler(handler);
        }
        exec
    }

    pub fn register_handler(
        &mut self,
        handler: Box<dyn ActionHandler>,
    ) -> Result<(), HandlerRegistryError> {
        let action_type = handler.action_type();
        if self.handlers.contains_key(action_type) {
            return Err(HandlerRegistryError::DuplicateAction(action_type.to_string()));
        }
        debug!(action_type, "registered action handler");
        self.handlers.insert(action_type, handler);
        Ok(())
    }

    pub fn supported_actions(&self) -> Vec<&'static str> {
        let mut actions: Vec<&'static str> = self.handlers.keys().copied().collect();
        actions.sort_unstable();
        actions
    }

    /// Dispatch one intent. Unknown action types, parameter errors, validator
    /// rejections, and session refusals all come back as failure results.
    pub fn execute(
        &self,
        mut request: ActionRequest,
        session: &mut dyn SessionDriver,
    ) -> ActionResult {
        let action_type = request.action_type.clone();
        let Some(handler) = self.handlers.get(action_type.as_str()) else {
            return ActionResult::failure(format!("Unknown action type: {action_type}"));
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            handler.execute(&mut request, session, &self.validators)
        }));
        match outcome {
            Ok(result) => {
                debug!(action_type = %action_type, success = result.success, "action executed");
                result
            }
            Err(_) => {
                warn!(action_type = %action_type, "handler panicked");
                ActionResult::failure(format!("{action_type} failed: internal error"))
            }
        }
    }
}
