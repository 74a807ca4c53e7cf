//! Built-in handlers for the action vocabulary.
//!
//! Every mutating handler follows the same staging: local parameter checks
//! first, then the validator framework, then the session mutation. A session
//! refusal is reported as `"<action> failed: <underlying reason>"`.

use cardbridge_protocol::{ActionRequest, ActionResult};
use cardbridge_session::{SessionDriver, SessionError, SessionView};
use cardbridge_validate::ValidationHub;

use crate::params::{require_index, require_index_list, require_non_empty, require_str};
use crate::{not_implemented_message, ActionHandler};

/// All built-ins, covering the full action vocabulary.
pub fn default_set() -> Vec<Box<dyn ActionHandler>> {
    vec![
        Box::new(PlayHandHandler),
        Box::new(DiscardCardsHandler),
        Box::new(GoToShopHandler),
        Box::new(BuyItemHandler),
        Box::new(SellJokerHandler),
        Box::new(SellConsumableHandler),
        Box::new(ReorderJokersHandler),
        Box::new(SelectBlindHandler),
        Box::new(RerollShopHandler),
        Box::new(SortHandHandler { by_suit: false }),
        Box::new(SortHandHandler { by_suit: true }),
        Box::new(UseConsumableHandler),
        Box::new(UnimplementedHandler {
            action: "select_pack_offer",
        }),
        Box::new(UnimplementedHandler {
            action: "reroll_boss",
        }),
    ]
}

/// Consult the validator framework; a rejection becomes the handler's failure
/// verbatim. Approvals may have rewritten `request` in place.
fn check_rules(
    request: &mut ActionRequest,
    session: &dyn SessionDriver,
    validators: &ValidationHub,
) -> Option<ActionResult> {
    let view: &dyn SessionView = session;
    let verdict = validators.validate_action(request, view);
    if verdict.is_valid {
        None
    } else {
        Some(ActionResult::failure(verdict.message()))
    }
}

fn apply(action: &str, outcome: Result<(), SessionError>) -> ActionResult {
    match outcome {
        Ok(()) => ActionResult::ok(),
        Err(err) => ActionResult::failure(format!("{action} failed: {err}")),
    }
}

pub struct PlayHandHandler;

impl ActionHandler for PlayHandHandler {
    fn action_type(&self) -> &'static str {
        "play_hand"
    }
    fn execute(
        &self,
        request: &mut ActionRequest,
        session: &mut dyn SessionDriver,
        validators: &ValidationHub,
    ) -> ActionResult {
        let indices = match require_index_list(&request.params, "card_indices") {
            Ok(indices) => indices,
            Err(err) => return ActionResult::failure(err.to_string()),
        };
        if let Err(err) = require_non_empty(&indices, "card_indices") {
            return ActionResult::failure(err.to_string());
        }
        if let Some(rejection) = check_rules(request, session, validators) {
            return rejection;
        }
        apply("play_hand", session.play_hand(&indices))
    }
}

pub struct DiscardCardsHandler;

impl ActionHandler for DiscardCardsHandler {
    fn action_type(&self) -> &'static str {
        "discard_cards"
    }
    fn execute(
        &self,
        request: &mut ActionRequest,
        session: &mut dyn SessionDriver,
        validators: &ValidationHub,
    ) -> ActionResult {
        let indices = match require_index_list(&request.params, "card_indices") {
            Ok(indices) => indices,
            Err(err) => return ActionResult::failure(err.to_string()),
        };
        if let Err(err) = require_non_empty(&indices, "card_indices") {
            return ActionResult::failure(err.to_string());
        }
        if let Some(rejection) = check_rules(request, session, validators) {
            return rejection;
        }
        apply("discard_cards", session.discard_cards(&indices))
    }
}

pub struct GoToShopHandler;

impl ActionHandler for GoToShopHandler {
    fn action_type(&self) -> &'static str {
        "go_to_shop"
    }
    fn execute(
        &self,
        request: &mut ActionRequest,
        session: &mut dyn SessionDriver,
        validators: &ValidationHub,
    ) -> ActionResult {
        if let Some(rejection) = check_rules(request, session, validators) {
            return rejection;
        }
        apply("go_to_shop", session.go_to_shop())
    }
}

pub struct BuyItemHandler;

impl ActionHandler for BuyItemHandler {
    fn action_type(&self) -> &'static str {
        "buy_item"
    }
    fn execute(
        &self,
        request: &mut ActionRequest,
        session: &mut dyn SessionDriver,
        validators: &ValidationHub,
    ) -> ActionResult {
        let shop_index = match require_index(&request.params, "shop_index") {
            Ok(index) => index,
            Err(err) => return ActionResult::failure(err.to_string()),
        };
        if let Some(rejection) = check_rules(request, session, validators) {
            return rejection;
        }
        apply("buy_item", session.buy_item(shop_index))
    }
}

pub struct SellJokerHandler;

impl ActionHandler for SellJokerHandler {
    fn action_type(&self) -> &'static str {
        "sell_joker"
    }
    fn execute(
        &self,
        request: &mut ActionRequest,
        session: &mut dyn SessionDriver,
        validators: &ValidationHub,
    ) -> ActionResult {
        let joker_index = match require_index(&request.params, "joker_index") {
            Ok(index) => index,
            Err(err) => return ActionResult::failure(err.to_string()),
        };
        if let Some(rejection) = check_rules(request, session, validators) {
            return rejection;
        }
        apply("sell_joker", session.sell_joker(joker_index))
    }
}

pub struct SellConsumableHandler;

impl ActionHandler for SellConsumableHandler {
    fn action_type(&self) -> &'static str {
        "sell_consumable"
    }
    fn execute(
        &self,
        request: &mut ActionRequest,
        session: &mut dyn SessionDriver,
        validators: &ValidationHub,
    ) -> ActionResult {
        let consumable_index = match require_index(&request.params, "consumable_index") {
            Ok(index) => index,
            Err(err) => return ActionResult::failure(err.to_string()),
        };
        if let Some(rejection) = check_rules(request, session, validators) {
            return rejection;
        }
        apply("sell_consumable", session.sell_consumable(consumable_index))
    }
}

pub struct ReorderJokersHandler;

impl ActionHandler for ReorderJokersHandler {
    fn action_type(&self) -> &'static str {
        "reorder_jokers"
    }
    fn execute(
        &self,
        request: &mut ActionRequest,
        session: &mut dyn SessionDriver,
        validators: &ValidationHub,
    ) -> ActionResult {
        let new_order = match require_index_list(&request.params, "new_order") {
            Ok(order) => order,
            Err(err) => return ActionResult::failure(err.to_string()),
        };
        if let Some(rejection) = check_rules(request, session, validators) {
            return rejection;
        }
        apply("reorder_jokers", session.reorder_jokers(&new_order))
    }
}

pub struct SelectBlindHandler;

impl ActionHandler for SelectBlindHandler {
    fn action_type(&self) -> &'static str {
        "select_blind"
    }
    fn execute(
        &self,
        request: &mut ActionRequest,
        session: &mut dyn SessionDriver,
        validators: &ValidationHub,
    ) -> ActionResult {
        if let Err(err) = require_str(&request.params, "blind_type") {
            return ActionResult::failure(err.to_string());
        }
        // Validators may retarget blind_type; re-read it after the check.
        if let Some(rejection) = check_rules(request, session, validators) {
            return rejection;
        }
        let blind = match require_str(&request.params, "blind_type") {
            Ok(blind) => blind,
            Err(err) => return ActionResult::failure(err.to_string()),
        };
        apply("select_blind", session.select_blind(&blind))
    }
}

pub struct RerollShopHandler;

impl ActionHandler for RerollShopHandler {
    fn action_type(&self) -> &'static str {
        "reroll_shop"
    }
    fn execute(
        &self,
        request: &mut ActionRequest,
        session: &mut dyn SessionDriver,
        validators: &ValidationHub,
    ) -> ActionResult {
        if let Some(rejection) = check_rules(request, session, validators) {
            return rejection;
        }
        apply("reroll_shop", session.reroll_shop())
    }
}

pub struct SortHandHandler {
    pub by_suit: bool,
}

impl ActionHandler for SortHandHandler {
    fn action_type(&self) -> &'static str {
        if self.by_suit {
            "sort_hand_by_suit"
        } else {
            "sort_hand_by_rank"
        }
    }
    fn execute(
        &self,
        request: &mut ActionRequest,
        session: &mut dyn SessionDriver,
        validators: &ValidationHub,
    ) -> ActionResult {
        if let Some(rejection) = check_rules(request, session, validators) {
            return rejection;
        }
        let outcome = if self.by_suit {
            session.sort_hand_by_suit()
        } else {
            session.sort_hand_by_rank()
        };
        apply(self.action_type(), outcome)
    }
}

pub struct UseConsumableHandler;

impl ActionHandler for UseConsumableHandler {
    fn action_type(&self) -> &'static str {
        "use_consumable"
    }
    fn execute(
        &self,
        request: &mut ActionRequest,
        session: &mut dyn SessionDriver,
        validators: &ValidationHub,
    ) -> ActionResult {
        let item_id = match require_str(&request.params, "item_id") {
            Ok(id) => id,
            Err(err) => return ActionResult::failure(err.to_string()),
        };
        if let Some(rejection) = check_rules(request, session, validators) {
            return rejection;
        }
        apply("use_consumable", session.use_consumable(&item_id))
    }
}

/// Placeholder for vocabulary entries without an implementation. Returns the
/// fixed sentinel from [`not_implemented_message`] instead of silently
/// succeeding or doing nothing.
pub struct UnimplementedHandler {
    pub action: &'static str,
}

impl ActionHandler for UnimplementedHandler {
    fn action_type(&self) -> &'static str {
        self.action
    }
    fn execute(
        &self,
        _request: &mut ActionRequest,
        _session: &mut dyn SessionDriver,
        _validators: &ValidationHub,
    ) -> ActionResult {
        ActionResult::failure(not_implemented_message(self.action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActionExecutor;
    use cardbridge_session::test_support::ScriptedSession;
    use cardbridge_validate::{BlindProgressionValidator, ShopRerollValidator};
    use serde_json::json;
    use std::sync::Arc;

    fn executor_with(hub: ValidationHub) -> ActionExecutor {
        ActionExecutor::with_default_handlers(hub)
    }

    #[test]
    fn play_hand_rejects_missing_and_empty_indices() {
        let exec = executor_with(ValidationHub::new());
        let mut session = ScriptedSession::detached();

        let missing = exec.execute(ActionRequest::new("play_hand"), &mut session);
        assert_eq!(
            missing.error_message.as_deref(),
            Some("Missing required field: card_indices")
        );

        let empty = exec.execute(
            ActionRequest::new("play_hand").with_param("card_indices", json!([])),
            &mut session,
        );
        assert_eq!(
            empty.error_message.as_deref(),
            Some("Invalid card_indices: at least one index is required")
        );
        assert!(session.calls().is_empty());
    }

    #[test]
    fn negative_index_never_reaches_the_session() {
        let exec = executor_with(ValidationHub::new());
        let mut session = ScriptedSession::detached();
        let result = exec.execute(
            ActionRequest::new("discard_cards").with_param("card_indices", json!([1, -1])),
            &mut session,
        );
        assert_eq!(
            result.error_message.as_deref(),
            Some("Invalid card_indices: indices must be non-negative integers")
        );
        assert!(session.calls().is_empty());
    }

    #[test]
    fn session_refusal_is_wrapped_with_the_action_name() {
        let exec = executor_with(ValidationHub::new());
        let mut session = ScriptedSession::detached().refuse("play_hand", "no hand in play");
        let result = exec.execute(
            ActionRequest::new("play_hand").with_param("card_indices", json!([0])),
            &mut session,
        );
        assert_eq!(
            result.error_message.as_deref(),
            Some("play_hand failed: no hand in play")
        );
    }

    #[test]
    fn select_blind_applies_the_corrected_target() {
        let mut hub = ValidationHub::new();
        hub.register(Arc::new(BlindProgressionValidator::new()), &["select_blind"]);
        let exec = executor_with(hub);

        let mut session = ScriptedSession::new(json!({"blind_select": {"next": "big"}}));
        let result = exec.execute(
            ActionRequest::new("select_blind").with_param("blind_type", json!("boss")),
            &mut session,
        );
        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(session.calls(), ["select_blind(big)"]);
    }

    #[test]
    fn reroll_rejection_is_surfaced_verbatim() {
        let mut hub = ValidationHub::new();
        hub.register(Arc::new(ShopRerollValidator::new(1)), &["reroll_shop"]);
        let exec = executor_with(hub);

        let mut session = ScriptedSession::new(json!({"game": {"ante": 1}}));
        assert!(exec.execute(ActionRequest::new("reroll_shop"), &mut session).success);
        let second = exec.execute(ActionRequest::new("reroll_shop"), &mut session);
        assert_eq!(
            second.error_message.as_deref(),
            Some("Reroll limit of 1 reached for ante 1")
        );
        assert_eq!(session.calls(), ["reroll_shop()"]);
    }

    #[test]
    fn unimplemented_actions_return_the_fixed_sentinel() {
        let exec = executor_with(ValidationHub::new());
        let mut session = ScriptedSession::detached();
        for action in ["select_pack_offer", "reroll_boss"] {
            let result = exec.execute(ActionRequest::new(action), &mut session);
            assert!(!result.success);
            assert_eq!(
                result.error_message.as_deref(),
                Some(not_implemented_message(action).as_str())
            );
        }
        assert!(session.calls().is_empty());
    }

    #[test]
    fn use_consumable_requires_a_string_id() {
        let exec = executor_with(ValidationHub::new());
        let mut session = ScriptedSession::detached();
        let result = exec.execute(
            ActionRequest::new("use_consumable").with_param("item_id", json!(3)),
            &mut session,
        );
        assert_eq!(
            result.error_message.as_deref(),
            Some("Invalid item_id: expected a string")
        );

        let ok = exec.execute(
            ActionRequest::new("use_consumable").with_param("item_id", json!("tarot_1")),
            &mut session,
        );
        assert!(ok.success);
        assert_eq!(session.calls(), ["use_consumable(tarot_1)"]);
    }
}
