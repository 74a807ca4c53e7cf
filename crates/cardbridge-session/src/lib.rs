//! Read-only view and mutation boundary over the live host session.
//!
//! The host game process owns a mutable, possibly-incomplete object graph.
//! Everything in this workspace reads it through [`SessionView`] (safe nested
//! lookup with typed defaults, never panicking on absent structure) and
//! mutates it only through [`SessionDriver`], whose operations report failure
//! as values instead of unwinding into the host.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub mod test_support;

/// Failure touching the live session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// An expected substructure of the live object graph is missing.
    #[error("session state unavailable at {path}")]
    Unavailable { path: String },
    /// The underlying session refused the mutation.
    #[error("{0}")]
    Rejected(String),
}

impl SessionError {
    pub fn unavailable(path: &[&str]) -> Self {
        SessionError::Unavailable {
            path: path.join("."),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        SessionError::Rejected(reason.into())
    }
}

/// Read-only capability over the live object graph.
///
/// Implementors supply [`SessionView::root`]; every accessor is a total
/// function that degrades to the caller's default when the path is absent,
/// the wrong shape, or the session is entirely detached.
pub trait SessionView {
    /// Root of the live graph, or `None` when no session is attached.
    fn root(&self) -> Option<&Value>;

    /// Safe nested lookup: follows object keys, returns `None` on any miss.
    fn value_at(&self, path: &[&str]) -> Option<&Value> {
        let mut cur = self.root()?;
        for key in path {
            cur = cur.as_object()?.get(*key)?;
        }
        Some(cur)
    }

    fn str_at(&self, path: &[&str], default: &str) -> String {
        self.value_at(path)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    fn i64_at(&self, path: &[&str], default: i64) -> i64 {
        self.value_at(path).and_then(Value::as_i64).unwrap_or(default)
    }

    fn u64_at(&self, path: &[&str], default: u64) -> u64 {
        self.value_at(path).and_then(Value::as_u64).unwrap_or(default)
    }

    fn bool_at(&self, path: &[&str], default: bool) -> bool {
        self.value_at(path).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Array lookup; absent or non-array paths read as empty.
    fn array_at(&self, path: &[&str]) -> &[Value] {
        self.value_at(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Typed reads on a single graph element (one card, one shop slot, ...).
/// Same degradation rules as [`SessionView`], for values already in hand.
pub fn field_str(value: &Value, key: &str, default: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

pub fn field_i64(value: &Value, key: &str, default: i64) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or(default)
}

pub fn field_u64(value: &Value, key: &str, default: u64) -> u64 {
    value.get(key).and_then(Value::as_u64).unwrap_or(default)
}

/// Mutation boundary the action executor drives. The host supplies the real
/// implementation; every operation either applies the mutation or reports why
/// the session refused it.
pub trait SessionDriver: SessionView {
    fn play_hand(&mut self, card_indices: &[usize]) -> Result<(), SessionError>;
    fn discard_cards(&mut self, card_indices: &[usize]) -> Result<(), SessionError>;
    fn go_to_shop(&mut self) -> Result<(), SessionError>;
    fn buy_item(&mut self, shop_index: usize) -> Result<(), SessionError>;
    fn sell_joker(&mut self, joker_index: usize) -> Result<(), SessionError>;
    fn sell_consumable(&mut self, consumable_index: usize) -> Result<(), SessionError>;
    fn reorder_jokers(&mut self, new_order: &[usize]) -> Result<(), SessionError>;
    fn select_blind(&mut self, blind: &str) -> Result<(), SessionError>;
    fn reroll_shop(&mut self) -> Result<(), SessionError>;
    fn sort_hand_by_rank(&mut self) -> Result<(), SessionError>;
    fn sort_hand_by_suit(&mut self) -> Result<(), SessionError>;
    fn use_consumable(&mut self, item_id: &str) -> Result<(), SessionError>;
}

/// A session view backed by a JSON document, for hosts that expose their
/// object graph that way. `detached()` models a session that is momentarily
/// absent; every read then yields the caller's default.
#[derive(Debug, Clone, Default)]
pub struct LiveSession {
    root: Option<Value>,
}

impl LiveSession {
    pub fn new(root: Value) -> Self {
        Self { root: Some(root) }
    }

    pub fn detached() -> Self {
        debug!("session view created detached");
        Self { root: None }
    }

    pub fn replace_root(&mut self, root: Value) {
        debug!(was_attached = self.root.is_some(), "session graph replaced");
        self.root = Some(root);
    }
}

impl SessionView for LiveSession {
    fn root(&self) -> Option<&Value> {
        self.root.as_ref()
    }
}
