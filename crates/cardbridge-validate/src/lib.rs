//! Action validation framework: validators are registered per action type and
//! consulted in registration order before an intent reaches the executor.
//!
//! A rejection short-circuits the chain and is returned verbatim. An approval
//! may rewrite the request in place before the next validator (or the
//! executor) sees it; this validate-and-correct pattern is how progression
//! enforcement silently retargets a merely-suboptimal request instead of
//! rejecting it. Action types with no registered validator are approved
//! unmodified: an explicit default-allow policy.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use cardbridge_protocol::{ActionRequest, ValidationResult};
use cardbridge_session::SessionView;

pub mod reroll;
pub mod rules;

pub use reroll::{RerollTracker, TrackerError};
pub use rules::{BlindProgressionValidator, ShopRerollValidator};

/// A business-rule check for one or more action types.
pub trait ActionValidator {
    fn name(&self) -> &'static str;
    /// Approve (optionally rewriting `request.params` in place) or reject.
    fn validate(&self, request: &mut ActionRequest, view: &dyn SessionView) -> ValidationResult;
}

/// Registry of validators keyed by action type, preserving registration order.
#[derive(Default)]
pub struct ValidationHub {
    by_type: HashMap<String, Vec<Arc<dyn ActionValidator>>>,
}

impl ValidationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `validator` with every listed action type.
    pub fn register(&mut self, validator: Arc<dyn ActionValidator>, action_types: &[&str]) {
        for action_type in action_types {
            debug!(
                validator = validator.name(),
                action_type, "registered validator"
            );
            self.by_type
                .entry(action_type.to_string())
                .or_default()
                .push(Arc::clone(&validator));
        }
    }

    pub fn validator_count(&self, action_type: &str) -> usize {
        self.by_type.get(action_type).map_or(0, Vec::len)
    }

    /// Run the chain for `request.action_type`.
    ///
    /// Fails open: with zero registered validators the action is approved
    /// unmodified.
    pub fn validate_action(
        &self,
        request: &mut ActionRequest,
        view: &dyn SessionView,
    ) -> ValidationResult {
        let Some(chain) = self.by_type.get(&request.action_type) else {
            return ValidationResult::approve(format!(
                "No validators registered for {}",
                request.action_type
            ));
        };

        let mut last = ValidationResult::approve(format!(
            "No validators registered for {}",
            request.action_type
        ));
        for validator in chain {
            let verdict = validator.validate(request, view);
            if !verdict.is_valid {
                warn!(
                    validator = validator.name(),
                    action_type = %request.action_type,
                    reason = verdict.message(),
                    "action rejected"
                );
                return verdict;
            }
            last = verdict;
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardbridge_session::LiveSession;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Approving {
        hits: AtomicUsize,
    }

    impl ActionValidator for Approving {
        fn name(&self) -> &'static str {
            "approving"
        }
        fn validate(&self, _r: &mut ActionRequest, _v: &dyn SessionView) -> ValidationResult {
            self.hits.fetch_add(1, Ordering::SeqCst);
            ValidationResult::approve("fine by me")
        }
    }

    struct Rejecting;

    impl ActionValidator for Rejecting {
        fn name(&self) -> &'static str {
            "rejecting"
        }
        fn validate(&self, _r: &mut ActionRequest, _v: &dyn SessionView) -> ValidationResult {
            ValidationResult::reject("not in this phase")
        }
    }

    struct Rewriting;

    impl ActionValidator for Rewriting {
        fn name(&self) -> &'static str {
            "rewriting"
        }
        fn validate(&self, r: &mut ActionRequest, _v: &dyn SessionView) -> ValidationResult {
            r.params.insert("target".into(), json!("corrected"));
            ValidationResult::approve("retargeted")
        }
    }

    #[test]
    fn fail_open_with_zero_validators() {
        let hub = ValidationHub::new();
        let mut req = ActionRequest::new("anything");
        let verdict = hub.validate_action(&mut req, &LiveSession::detached());
        assert!(verdict.is_valid);
        assert!(req.params.is_empty());
    }

    #[test]
    fn rejection_short_circuits_the_chain() {
        let mut hub = ValidationHub::new();
        let tail = Arc::new(Approving {
            hits: AtomicUsize::new(0),
        });
        hub.register(Arc::new(Rejecting), &["play_hand"]);
        hub.register(Arc::clone(&tail) as Arc<dyn ActionValidator>, &["play_hand"]);

        let mut req = ActionRequest::new("play_hand");
        let verdict = hub.validate_action(&mut req, &LiveSession::detached());
        assert!(!verdict.is_valid);
        assert_eq!(verdict.error_message.as_deref(), Some("not in this phase"));
        assert_eq!(tail.hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn approval_may_rewrite_the_request_for_later_validators() {
        let mut hub = ValidationHub::new();
        hub.register(Arc::new(Rewriting), &["select_blind"]);
        let tail = Arc::new(Approving {
            hits: AtomicUsize::new(0),
        });
        hub.register(Arc::clone(&tail) as Arc<dyn ActionValidator>, &["select_blind"]);

        let mut req = ActionRequest::new("select_blind").with_param("target", json!("wrong"));
        let verdict = hub.validate_action(&mut req, &LiveSession::detached());
        assert!(verdict.is_valid);
        assert_eq!(req.params["target"], json!("corrected"));
        assert_eq!(tail.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registration_covers_multiple_action_types() {
        let mut hub = ValidationHub::new();
        hub.register(Arc::new(Rejecting), &["a", "b"]);
        assert_eq!(hub.validator_count("a"), 1);
        assert_eq!(hub.validator_count("b"), 1);
        assert_eq!(hub.validator_count("c"), 0);
    }
}
