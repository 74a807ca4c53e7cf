//! Concrete validators shipped with the framework: blind progression
//! enforcement (validate-and-correct) and stateful shop reroll limiting.

use std::sync::Mutex;

use serde_json::{json, Value};
use tracing::debug;

use cardbridge_protocol::{ActionRequest, ValidationResult};
use cardbridge_session::SessionView;

use crate::{ActionValidator, RerollTracker};

/// Enforces blind progression on `select_blind`.
///
/// Rather than rejecting a request for the wrong blind, the requested
/// `blind_type` is silently overridden with the only currently legal target,
/// read from the live session's progression state.
pub struct BlindProgressionValidator;

impl BlindProgressionValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BlindProgressionValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionValidator for BlindProgressionValidator {
    fn name(&self) -> &'static str {
        "blind_progression"
    }

    fn validate(&self, request: &mut ActionRequest, view: &dyn SessionView) -> ValidationResult {
        let legal = view.str_at(&["blind_select", "next"], "");
        if legal.is_empty() {
            // No progression data in the graph; nothing to enforce.
            return ValidationResult::approve("No blind progression data available");
        }

        let requested = request
            .params
            .get("blind_type")
            .and_then(Value::as_str)
            .unwrap_or("");
        if requested == legal {
            return ValidationResult::approve(format!("Blind selection {legal} is valid"));
        }

        debug!(requested, legal = %legal, "correcting blind selection");
        request.params.insert("blind_type".to_string(), json!(legal));
        ValidationResult::approve(format!("Corrected blind selection to {legal}"))
    }
}

/// Limits `reroll_shop` to a fixed number of uses per ante.
pub struct ShopRerollValidator {
    limit: u32,
    tracker: Mutex<RerollTracker>,
}

impl ShopRerollValidator {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            tracker: Mutex::new(RerollTracker::new()),
        }
    }

    /// Usage recorded so far for `ante`.
    pub fn reroll_count(&self, ante: i64) -> u32 {
        self.lock().count(ante)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RerollTracker> {
        self.tracker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ActionValidator for ShopRerollValidator {
    fn name(&self) -> &'static str {
        "shop_reroll_limit"
    }

    fn validate(&self, _request: &mut ActionRequest, view: &dyn SessionView) -> ValidationResult {
        let ante = view.i64_at(&["game", "ante"], 0);
        let mut tracker = self.lock();
        if tracker.is_limit_reached(ante, self.limit) {
            return ValidationResult::reject(format!(
                "Reroll limit of {} reached for ante {ante}",
                self.limit
            ));
        }
        match tracker.increment(ante) {
            Ok(used) => ValidationResult::approve(format!(
                "Reroll {used} of {} for ante {ante}",
                self.limit
            )),
            Err(err) => ValidationResult::reject(err.to_string()),
        }
    }
}
