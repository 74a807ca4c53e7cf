use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Phase the session is currently in, from the external client's view.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    HandSelection,
    Shop,
    BlindSelection,
    Scoring,
}

/// A playing card. All six fields are always present; unknown enhancement,
/// edition, and seal values are reported as `"none"` rather than omitted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct Card {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub suit: String,
    #[serde(default = "none_tag")]
    pub enhancement: String,
    #[serde(default = "none_tag")]
    pub edition: String,
    #[serde(default = "none_tag")]
    pub seal: String,
}

fn none_tag() -> String {
    "none".to_string()
}

impl Default for Card {
    fn default() -> Self {
        Self {
            id: String::new(),
            rank: String::new(),
            suit: String::new(),
            enhancement: none_tag(),
            edition: none_tag(),
            seal: none_tag(),
        }
    }
}

/// An owned joker slot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct Joker {
    /// 0-based position in the joker row.
    pub index: usize,
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub cost: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
}

/// An owned consumable slot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct Consumable {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub card_type: String,
}

/// One purchasable shop slot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct ShopItem {
    /// 0-based position in the shop row.
    pub index: usize,
    pub item_type: String,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub cost: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BlindKind {
    #[default]
    Small,
    Big,
    Boss,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct Blind {
    pub name: String,
    pub blind_type: BlindKind,
    pub requirement: u64,
    pub reward: u64,
}

/// Complete external state representation for one synchronization tick.
///
/// Every field is always present with a real or default value; consumers never
/// see a partial snapshot even when individual extractors failed. Failures are
/// surfaced in `extraction_errors` instead.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default, JsonSchema)]
pub struct Snapshot {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub phase: GamePhase,
    #[serde(default)]
    pub ante: u32,
    #[serde(default)]
    pub money: i64,
    #[serde(default)]
    pub hands_remaining: u32,
    #[serde(default)]
    pub discards_remaining: u32,
    #[serde(default)]
    pub hand_cards: Vec<Card>,
    #[serde(default)]
    pub jokers: Vec<Joker>,
    #[serde(default)]
    pub consumables: Vec<Consumable>,
    #[serde(default)]
    pub deck_cards: Vec<Card>,
    #[serde(default)]
    pub current_blind: Option<Blind>,
    #[serde(default)]
    pub shop_contents: Vec<ShopItem>,
    #[serde(default)]
    pub available_actions: Vec<String>,
    #[serde(default)]
    pub post_hand_joker_reorder_available: bool,
    #[serde(default)]
    pub extraction_errors: Vec<String>,
}

/// Logical channel a message travels on. Each kind maps to one mailbox file
/// (file transport) and one `message_type` tag on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    GameState,
    DeckState,
    Actions,
    ActionResult,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::GameState => "game_state",
            MessageKind::DeckState => "deck_state",
            MessageKind::Actions => "action_command",
            MessageKind::ActionResult => "action_result",
        }
    }

    /// Mailbox file name for the file transport.
    pub fn file_name(&self) -> &'static str {
        match self {
            MessageKind::GameState => "game_state.json",
            MessageKind::DeckState => "deck_state.json",
            MessageKind::Actions => "actions.json",
            MessageKind::ActionResult => "action_results.json",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-describing wrapper around every exchanged message.
///
/// `sequence_id` is assigned exactly once when the envelope is created and is
/// strictly increasing per message-manager instance. `result` and
/// `last_sequence_id` are carried only on replies to a prior inbound message.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct Envelope {
    /// UTC, fixed `%Y-%m-%dT%H:%M:%SZ` textual format.
    pub timestamp: String,
    pub sequence_id: u64,
    pub message_type: String,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sequence_id: Option<u64>,
}

/// An externally submitted intent: an action type tag plus a free-form
/// parameter record. Validators may rewrite `params` in place before the
/// executor applies the action.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default, JsonSchema)]
pub struct ActionRequest {
    pub action_type: String,
    #[serde(flatten)]
    pub params: serde_json::Map<String, Value>,
}

impl ActionRequest {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            params: serde_json::Map::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }
}

/// Outcome of executing one action. `error_message` is present iff the action
/// failed; `new_state` optionally carries a fresh snapshot taken after a
/// successful mutation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default, JsonSchema)]
pub struct ActionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_state: Option<Box<Snapshot>>,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error_message: None,
            new_state: None,
        }
    }

    pub fn ok_with_state(state: Snapshot) -> Self {
        Self {
            success: true,
            error_message: None,
            new_state: Some(Box::new(state)),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            new_state: None,
        }
    }
}

/// Verdict of a single validator. Exactly one of `success_message` and
/// `error_message` is set; the constructors are the only way to build one, so
/// the invariant cannot be violated by hand-assembled values.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ValidationResult {
    pub fn approve(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            success_message: Some(message.into()),
            error_message: None,
        }
    }

    pub fn reject(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            success_message: None,
            error_message: Some(message.into()),
        }
    }

    /// The message carried by this verdict, whichever side it is on.
    pub fn message(&self) -> &str {
        self.success_message
            .as_deref()
            .or(self.error_message.as_deref())
            .unwrap_or("")
    }
}
