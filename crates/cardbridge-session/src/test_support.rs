//! Scripted session implementation for exercising extractors, validators,
//! and handlers without a live host process.

use std::collections::HashMap;

use serde_json::Value;

use crate::{LiveSession, SessionDriver, SessionError, SessionView};

/// A [`SessionDriver`] that records every mutation it is asked to perform and
/// can be scripted to refuse specific operations.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    graph: LiveSession,
    calls: Vec<String>,
    refusals: HashMap<&'static str, String>,
}

impl ScriptedSession {
    pub fn new(root: Value) -> Self {
        Self {
            graph: LiveSession::new(root),
            ..Default::default()
        }
    }

    pub fn detached() -> Self {
        Self::default()
    }

    /// Script `op` (e.g. `"buy_item"`) to fail with `reason`.
    pub fn refuse(mut self, op: &'static str, reason: impl Into<String>) -> Self {
        self.refusals.insert(op, reason.into());
        self
    }

    /// Mutations applied so far, in order, as `"op(args)"` strings.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    fn apply(&mut self, op: &'static str, detail: String) -> Result<(), SessionError> {
        if let Some(reason) = self.refusals.get(op) {
            return Err(SessionError::rejected(reason.clone()));
        }
        self.calls.push(format!("{op}({detail})"));
        Ok(())
    }
}

impl SessionView for ScriptedSession {
    fn root(&self) -> Option<&Value> {
        self.graph.root()
    }
}

impl SessionDriver for ScriptedSession {
    fn play_hand(&mut self, card_indices: &[usize]) -> Result<(), SessionError> {
        self.apply("play_hand", format!("{card_indices:?}"))
    }

    fn discard_cards(&mut self, card_indices: &[usize]) -> Result<(), SessionError> {
        self.apply("discard_cards", format!("{card_indices:?}"))
    }

    fn go_to_shop(&mut self) -> Result<(), SessionError> {
        self.apply("go_to_shop", String::new())
    }

    fn buy_item(&mut self, shop_index: usize) -> Result<(), SessionError> {
        self.apply("buy_item", shop_index.to_string())
    }

    fn sell_joker(&mut self, joker_index: usize) -> Result<(), SessionError> {
        self.apply("sell_joker", joker_index.to_string())
    }

    fn sell_consumable(&mut self, consumable_index: usize) -> Result<(), SessionError> {
        self.apply("sell_consumable", consumable_index.to_string())
    }

    fn reorder_jokers(&mut self, new_order: &[usize]) -> Result<(), SessionError> {
        self.apply("reorder_jokers", format!("{new_order:?}"))
    }

    fn select_blind(&mut self, blind: &str) -> Result<(), SessionError> {
        self.apply("select_blind", blind.to_string())
    }

    fn reroll_shop(&mut self) -> Result<(), SessionError> {
        self.apply("reroll_shop", String::new())
    }

    fn sort_hand_by_rank(&mut self) -> Result<(), SessionError> {
        self.apply("sort_hand_by_rank", String::new())
    }

    fn sort_hand_by_suit(&mut self) -> Result<(), SessionError> {
        self.apply("sort_hand_by_suit", String::new())
    }

    fn use_consumable(&mut self, item_id: &str) -> Result<(), SessionError> {
        self.apply("use_consumable", item_id.to_string())
    }
}
