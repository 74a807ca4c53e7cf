//! Built-in extractor set covering the snapshot's documented fields.
//!
//! Each extractor reads one concern of the live graph through the session
//! view and degrades to defaults on its own when the graph is absent or
//! malformed. None of them consults another extractor's output.

use serde_json::{json, Value};

use cardbridge_protocol::{Blind, BlindKind, Card, Consumable, GamePhase, Joker, ShopItem};
use cardbridge_session::{field_i64, field_str, field_u64, SessionView};

use crate::{ExtractError, Extractor, SnapshotPatch};

/// All built-ins, in the canonical registration order.
pub fn default_set() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(SessionMetaExtractor),
        Box::new(PhaseExtractor),
        Box::new(ResourceExtractor),
        Box::new(HandExtractor),
        Box::new(JokerExtractor),
        Box::new(ConsumableExtractor),
        Box::new(DeckExtractor),
        Box::new(ShopExtractor),
        Box::new(BlindExtractor),
        Box::new(ActionAvailabilityExtractor),
    ]
}

fn patch_of(entries: Vec<(&str, Value)>) -> SnapshotPatch {
    let mut patch = SnapshotPatch::new();
    for (field, value) in entries {
        patch.insert(field.to_string(), value);
    }
    patch
}

fn encode<T: serde::Serialize>(field: &str, value: &T) -> Result<SnapshotPatch, ExtractError> {
    let encoded = serde_json::to_value(value)
        .map_err(|e| ExtractError::other(format!("encode {field}: {e}")))?;
    Ok(patch_of(vec![(field, encoded)]))
}

fn card_from(value: &Value) -> Card {
    Card {
        id: field_str(value, "id", ""),
        rank: field_str(value, "rank", ""),
        suit: field_str(value, "suit", ""),
        enhancement: field_str(value, "enhancement", "none"),
        edition: field_str(value, "edition", "none"),
        seal: field_str(value, "seal", "none"),
    }
}

pub struct SessionMetaExtractor;

impl Extractor for SessionMetaExtractor {
    fn name(&self) -> &'static str {
        "session_meta"
    }
    fn extract(&self, view: &dyn SessionView) -> Result<SnapshotPatch, ExtractError> {
        let id = view.str_at(&["session", "id"], "unknown");
        Ok(patch_of(vec![("session_id", json!(id))]))
    }
}

pub struct PhaseExtractor;

impl Extractor for PhaseExtractor {
    fn name(&self) -> &'static str {
        "phase"
    }
    fn extract(&self, view: &dyn SessionView) -> Result<SnapshotPatch, ExtractError> {
        let phase = match view.str_at(&["game", "phase"], "").as_str() {
            "shop" => GamePhase::Shop,
            "blind_selection" => GamePhase::BlindSelection,
            "scoring" => GamePhase::Scoring,
            // Unknown or absent phases read as the initial phase.
            _ => GamePhase::HandSelection,
        };
        encode("phase", &phase)
    }
}

pub struct ResourceExtractor;

impl Extractor for ResourceExtractor {
    fn name(&self) -> &'static str {
        "resources"
    }
    fn extract(&self, view: &dyn SessionView) -> Result<SnapshotPatch, ExtractError> {
        // Counters are u32 on the wire; clamp rather than fail assembly on
        // absurd host values.
        let counter = |path: &[&str]| view.u64_at(path, 0).min(u64::from(u32::MAX));
        Ok(patch_of(vec![
            ("ante", json!(counter(&["game", "ante"]))),
            ("money", json!(view.i64_at(&["game", "dollars"], 0))),
            ("hands_remaining", json!(counter(&["game", "hands_remaining"]))),
            (
                "discards_remaining",
                json!(counter(&["game", "discards_remaining"])),
            ),
        ]))
    }
}

pub struct HandExtractor;

impl Extractor for HandExtractor {
    fn name(&self) -> &'static str {
        "hand_cards"
    }
    fn extract(&self, view: &dyn SessionView) -> Result<SnapshotPatch, ExtractError> {
        let cards: Vec<Card> = view.array_at(&["hand", "cards"]).iter().map(card_from).collect();
        encode("hand_cards", &cards)
    }
}

pub struct JokerExtractor;

impl Extractor for JokerExtractor {
    fn name(&self) -> &'static str {
        "jokers"
    }
    fn extract(&self, view: &dyn SessionView) -> Result<SnapshotPatch, ExtractError> {
        let jokers: Vec<Joker> = view
            .array_at(&["jokers", "cards"])
            .iter()
            .enumerate()
            .map(|(index, value)| Joker {
                index,
                id: field_str(value, "id", ""),
                key: field_str(value, "key", ""),
                name: field_str(value, "name", ""),
                rarity: field_str(value, "rarity", ""),
                cost: field_i64(value, "cost", 0),
                edition: value
                    .get("edition")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect();
        encode("jokers", &jokers)
    }
}

pub struct ConsumableExtractor;

impl Extractor for ConsumableExtractor {
    fn name(&self) -> &'static str {
        "consumables"
    }
    fn extract(&self, view: &dyn SessionView) -> Result<SnapshotPatch, ExtractError> {
        let consumables: Vec<Consumable> = view
            .array_at(&["consumables", "cards"])
            .iter()
            .map(|value| Consumable {
                id: field_str(value, "id", ""),
                name: field_str(value, "name", ""),
                card_type: field_str(value, "card_type", ""),
            })
            .collect();
        encode("consumables", &consumables)
    }
}

pub struct DeckExtractor;

impl Extractor for DeckExtractor {
    fn name(&self) -> &'static str {
        "deck_cards"
    }
    fn extract(&self, view: &dyn SessionView) -> Result<SnapshotPatch, ExtractError> {
        let cards: Vec<Card> = view.array_at(&["deck", "cards"]).iter().map(card_from).collect();
        encode("deck_cards", &cards)
    }
}

pub struct ShopExtractor;

impl Extractor for ShopExtractor {
    fn name(&self) -> &'static str {
        "shop"
    }
    fn extract(&self, view: &dyn SessionView) -> Result<SnapshotPatch, ExtractError> {
        let items: Vec<ShopItem> = view
            .array_at(&["shop", "items"])
            .iter()
            .enumerate()
            .map(|(index, value)| ShopItem {
                index,
                item_type: field_str(value, "item_type", "joker"),
                key: field_str(value, "key", ""),
                name: field_str(value, "name", ""),
                cost: field_i64(value, "cost", 0),
                edition: value
                    .get("edition")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect();
        encode("shop_contents", &items)
    }
}

pub struct BlindExtractor;

impl Extractor for BlindExtractor {
    fn name(&self) -> &'static str {
        "blind"
    }
    fn extract(&self, view: &dyn SessionView) -> Result<SnapshotPatch, ExtractError> {
        let blind = view.value_at(&["blind"]).filter(|v| v.is_object()).map(|value| Blind {
            name: field_str(value, "name", ""),
            blind_type: match field_str(value, "kind", "small").as_str() {
                "big" => BlindKind::Big,
                "boss" => BlindKind::Boss,
                _ => BlindKind::Small,
            },
            requirement: field_u64(value, "requirement", 0),
            reward: field_u64(value, "reward", 0),
        });
        encode("current_blind", &blind)
    }
}

pub struct ActionAvailabilityExtractor;

impl Extractor for ActionAvailabilityExtractor {
    fn name(&self) -> &'static str {
        "available_actions"
    }
    fn extract(&self, view: &dyn SessionView) -> Result<SnapshotPatch, ExtractError> {
        let actions: Vec<String> = view
            .array_at(&["ui", "available_actions"])
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        Ok(patch_of(vec![
            ("available_actions", json!(actions)),
            (
                "post_hand_joker_reorder_available",
                json!(view.bool_at(&["ui", "reorder_window_open"], false)),
            ),
        ]))
    }
}
